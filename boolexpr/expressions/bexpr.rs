use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::definitions::{BooleanValue, Operator};
use crate::errors::Error;
use crate::expressions::constraints::ConstrainedExpression;
use crate::expressions::tokenizer::{to_postfix, tokenize};
use crate::expressions::Token;
use crate::satisfiability::{
    BacktrackingSolver, ClauseSet, ClauseSolver, Models, SatSolution, SatSolutions,
};
use crate::trees::node::chain;
use crate::trees::{render, ExpressionTreeNode, NodeRef};
use crate::Result;

/// A parsed Boolean expression.
///
/// The text, its tokens, the postfix form, the symbols and the tree are
/// computed once when the expression is built and never change afterwards.
/// Rewrites produce new expressions. The only mutable state is the stack of
/// constraints pushed by [`BooleanExpression::constrain`], which narrows
/// satisfiability queries.
///
/// Two expressions are equal when their trees are equal, regardless of the
/// spelling of their operators.
#[derive(Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct BooleanExpression {
    raw_expr: String,
    tokens: Vec<Token>,
    postfix_tokens: Vec<Token>,
    symbols: Vec<String>,
    tree: NodeRef,
    constraints: Vec<FxHashMap<String, bool>>,
}

impl BooleanExpression {
    /// Parse `raw_expr`.
    ///
    /// # Errors
    ///
    /// Returns a grammar error when `raw_expr` is not a well-formed expression,
    /// see [`crate::expressions::tokenizer::tokenize`].
    pub fn new(raw_expr: &str) -> Result<Self> {
        let tokenized = tokenize(raw_expr)?;
        let postfix_tokens = to_postfix(&tokenized.tokens);
        let tree = ExpressionTreeNode::from_postfix(&postfix_tokens)?;

        Ok(BooleanExpression {
            raw_expr: raw_expr.to_owned(),
            tokens: tokenized.tokens,
            postfix_tokens,
            symbols: tokenized.symbols,
            tree,
            constraints: Vec::new(),
        })
    }

    /// Wrap `tree`, deriving the text from its canonical serialization.
    #[must_use]
    pub fn from_tree(tree: NodeRef) -> Self {
        let tokens = tree.tokens();
        BooleanExpression {
            raw_expr: render(&tokens),
            tokens,
            postfix_tokens: tree.postfix_tokens(),
            symbols: tree.symbols(),
            tree,
            constraints: Vec::new(),
        }
    }

    /// Build an expression from postfix tokens written as strings.
    ///
    /// # Errors
    ///
    /// See [`ExpressionTreeNode::build_tree`].
    pub fn from_postfix<S: AsRef<str>>(postfix: &[S]) -> Result<Self> {
        Ok(BooleanExpression::from_tree(ExpressionTreeNode::build_tree(
            postfix,
        )?))
    }

    #[must_use]
    pub fn raw_expr(&self) -> &str {
        &self.raw_expr
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn postfix_tokens(&self) -> &[Token] {
        &self.postfix_tokens
    }

    /// Symbols in order of first appearance.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    #[must_use]
    pub fn tree(&self) -> &NodeRef {
        &self.tree
    }

    #[must_use]
    pub fn is_cnf(&self) -> bool {
        self.tree.is_cnf()
    }

    #[must_use]
    pub fn is_dnf(&self) -> bool {
        self.tree.is_dnf()
    }

    /// Evaluate the expression under `bindings`, which must bind every symbol.
    ///
    /// # Errors
    ///
    /// * [`Error::ExtraSymbol`] when a binding names a symbol not in the expression,
    /// * [`Error::InvalidBooleanValue`] when a bound value is not boolean,
    /// * [`Error::MissingSymbol`] when symbols are left unbound.
    pub fn evaluate<I, S, V>(&self, bindings: I) -> Result<bool>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: BooleanValue,
    {
        let values: FxHashMap<String, bool> = self.validate_bindings(bindings)?.into_iter().collect();

        let missing: Vec<String> = self
            .symbols
            .iter()
            .filter(|symbol| !values.contains_key(*symbol))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingSymbol(missing));
        }

        Ok(self.evaluate_unchecked(&values))
    }

    /// Evaluate the expression without validating `bindings`.
    ///
    /// # Panics
    ///
    /// Panics when a symbol of the expression has no value in `bindings`.
    #[must_use]
    pub fn evaluate_unchecked(&self, bindings: &FxHashMap<String, bool>) -> bool {
        self.tree.evaluate(&|symbol: &str| match bindings.get(symbol) {
            Some(value) => *value,
            None => panic!("no value bound to symbol \"{symbol}\""),
        })
    }

    /// Bindings checked against the symbols and converted to booleans, in the
    /// order they were given.
    fn validate_bindings<I, S, V>(&self, bindings: I) -> Result<Vec<(String, bool)>>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: BooleanValue,
    {
        let bindings: Vec<(S, V)> = bindings.into_iter().collect();

        let known: FxHashSet<&str> = self.symbols.iter().map(String::as_str).collect();
        let mut extra: Vec<String> = Vec::new();
        for (symbol, _) in &bindings {
            let symbol = symbol.as_ref();
            if !known.contains(symbol) && !extra.iter().any(|seen| seen == symbol) {
                extra.push(symbol.to_owned());
            }
        }
        if !extra.is_empty() {
            return Err(Error::ExtraSymbol(extra));
        }

        bindings
            .iter()
            .map(|(symbol, value)| {
                let symbol = symbol.as_ref();
                value
                    .as_bool()
                    .map(|value| (symbol.to_owned(), value))
                    .ok_or_else(|| Error::InvalidBooleanValue {
                        symbol: symbol.to_owned(),
                        value: value.describe(),
                    })
            })
            .collect()
    }

    /// Clauses of the expression as separate expressions: the conjuncts of a
    /// CNF expression, or failing that the disjuncts of a DNF expression.
    ///
    /// # Errors
    ///
    /// [`Error::RequiresNormalForm`] when the expression is in neither form.
    pub fn iter_clauses(&self) -> Result<impl Iterator<Item = BooleanExpression> + '_> {
        if self.is_cnf() {
            Ok(self.clauses(Operator::And))
        } else if self.is_dnf() {
            Ok(self.clauses(Operator::Or))
        } else {
            Err(Error::RequiresNormalForm(format!(
                "\"{}\" is in neither conjunctive nor disjunctive normal form",
                self.raw_expr
            )))
        }
    }

    /// Conjuncts of the expression.
    ///
    /// # Errors
    ///
    /// [`Error::RequiresNormalForm`] when the expression is not in CNF.
    pub fn iter_cnf_clauses(&self) -> Result<impl Iterator<Item = BooleanExpression> + '_> {
        if !self.is_cnf() {
            return Err(Error::RequiresNormalForm(format!(
                "\"{}\" is not in conjunctive normal form",
                self.raw_expr
            )));
        }
        Ok(self.clauses(Operator::And))
    }

    /// Disjuncts of the expression.
    ///
    /// # Errors
    ///
    /// [`Error::RequiresNormalForm`] when the expression is not in DNF.
    pub fn iter_dnf_clauses(&self) -> Result<impl Iterator<Item = BooleanExpression> + '_> {
        if !self.is_dnf() {
            return Err(Error::RequiresNormalForm(format!(
                "\"{}\" is not in disjunctive normal form",
                self.raw_expr
            )));
        }
        Ok(self.clauses(Operator::Or))
    }

    fn clauses(&self, operator: Operator) -> impl Iterator<Item = BooleanExpression> + '_ {
        chain(&self.tree, operator)
            .into_iter()
            .map(|clause| BooleanExpression::from_tree(Arc::clone(clause)))
    }

    /// Constrain symbols to fixed values for satisfiability queries until the
    /// returned guard is dropped. Guards nest; a symbol constrained by an
    /// enclosing guard cannot be constrained again.
    ///
    /// Every binding is validated before anything is pushed, so a failed call
    /// leaves the active constraints untouched.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgumentValue`] when `bindings` is empty,
    /// * [`Error::ExtraSymbol`] when a binding names a symbol not in the expression,
    /// * [`Error::InvalidBooleanValue`] when a bound value is not boolean,
    /// * [`Error::AlreadyConstrainedSymbol`] listing every symbol that is
    ///   already constrained.
    pub fn constrain<I, S, V>(&mut self, bindings: I) -> Result<ConstrainedExpression<'_>>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: BooleanValue,
    {
        let bindings = self.validate_bindings(bindings)?;
        if bindings.is_empty() {
            return Err(Error::InvalidArgumentValue(
                "at least one symbol must be constrained".to_owned(),
            ));
        }

        let frame: FxHashMap<String, bool> = bindings.into_iter().collect();
        let conflicts: Vec<String> = self
            .symbols
            .iter()
            .filter(|symbol| frame.contains_key(*symbol) && self.constraint(symbol).is_some())
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            return Err(Error::AlreadyConstrainedSymbol(conflicts));
        }

        tracing::debug!(depth = self.constraints.len() + 1, symbols = frame.len(), "constraining");
        self.constraints.push(frame);
        Ok(ConstrainedExpression::new(self))
    }

    pub(crate) fn pop_constraints(&mut self) {
        self.constraints.pop();
    }

    fn constraint(&self, symbol: &str) -> Option<bool> {
        self.constraints
            .iter()
            .find_map(|frame| frame.get(symbol).copied())
    }

    /// Active constraints in symbol order.
    #[must_use]
    pub fn constraints(&self) -> Vec<(&str, bool)> {
        self.symbols
            .iter()
            .filter_map(|symbol| {
                self.constraint(symbol)
                    .map(|value| (symbol.as_str(), value))
            })
            .collect()
    }

    /// Clauses of the expression under the active constraints.
    ///
    /// # Errors
    ///
    /// [`Error::NoEvaluationVariation`] when the expression has no symbols.
    pub fn clause_set(&self) -> Result<ClauseSet> {
        ClauseSet::new(&self.tree, &self.symbols, &self.constraints())
    }

    /// A satisfying assignment consistent with the active constraints, or
    /// `None` when there is none.
    ///
    /// # Errors
    ///
    /// [`Error::NoEvaluationVariation`] when the expression has no symbols.
    pub fn sat_one(&self) -> Result<Option<SatSolution>> {
        self.sat_one_with(&BacktrackingSolver)
    }

    /// [`BooleanExpression::sat_one`] with a custom solver.
    ///
    /// # Errors
    ///
    /// [`Error::NoEvaluationVariation`] when the expression has no symbols,
    /// or whatever `solver` reports.
    #[tracing::instrument(skip_all, fields(expr = %self.raw_expr))]
    pub fn sat_one_with<S: ClauseSolver>(&self, solver: &S) -> Result<Option<SatSolution>> {
        self.clause_set()?.solve_one(solver)
    }

    /// Every satisfying assignment consistent with the active constraints.
    /// The sequence is lazy and cannot be restarted.
    ///
    /// # Errors
    ///
    /// [`Error::NoEvaluationVariation`] when the expression has no symbols.
    pub fn sat_all(&self) -> Result<SatSolutions<Models>> {
        self.sat_all_with(&BacktrackingSolver)
    }

    /// [`BooleanExpression::sat_all`] with a custom solver.
    ///
    /// # Errors
    ///
    /// [`Error::NoEvaluationVariation`] when the expression has no symbols,
    /// or whatever `solver` reports.
    #[tracing::instrument(skip_all, fields(expr = %self.raw_expr))]
    pub fn sat_all_with<S: ClauseSolver>(&self, solver: &S) -> Result<SatSolutions<S::Solutions>> {
        self.clause_set()?.solve_all(solver)
    }
}

impl PartialEq for BooleanExpression {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl Eq for BooleanExpression {}

impl Display for BooleanExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw_expr)
    }
}

impl Debug for BooleanExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BooleanExpression({:?})", self.raw_expr)
    }
}

impl FromStr for BooleanExpression {
    type Err = Error;

    fn from_str(raw_expr: &str) -> Result<Self> {
        BooleanExpression::new(raw_expr)
    }
}

/// Anything a rewrite or a composed transformation accepts as its input.
pub trait IntoExpression {
    /// # Errors
    ///
    /// Returns a grammar error when text does not parse.
    fn into_expression(self) -> Result<BooleanExpression>;
}

impl IntoExpression for &str {
    fn into_expression(self) -> Result<BooleanExpression> {
        BooleanExpression::new(self)
    }
}

impl IntoExpression for String {
    fn into_expression(self) -> Result<BooleanExpression> {
        BooleanExpression::new(&self)
    }
}

impl IntoExpression for &String {
    fn into_expression(self) -> Result<BooleanExpression> {
        BooleanExpression::new(self)
    }
}

impl IntoExpression for BooleanExpression {
    fn into_expression(self) -> Result<BooleanExpression> {
        Ok(self)
    }
}

impl IntoExpression for &BooleanExpression {
    fn into_expression(self) -> Result<BooleanExpression> {
        Ok(self.clone())
    }
}

impl IntoExpression for NodeRef {
    fn into_expression(self) -> Result<BooleanExpression> {
        Ok(BooleanExpression::from_tree(self))
    }
}

impl IntoExpression for &NodeRef {
    fn into_expression(self) -> Result<BooleanExpression> {
        Ok(BooleanExpression::from_tree(Arc::clone(self)))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;

    use super::BooleanExpression;
    use crate::errors::Error;
    use crate::expressions::Token;

    fn be(expr: &str) -> BooleanExpression {
        BooleanExpression::new(expr).unwrap()
    }

    fn strs(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn parsed_parts() {
        let expr = be("F or B and not C");
        assert_eq!(expr.raw_expr(), "F or B and not C");
        assert_eq!(strs(expr.tokens()), vec!["F", "or", "B", "and", "not", "C"]);
        assert_eq!(
            strs(expr.postfix_tokens()),
            vec!["F", "B", "C", "not", "and", "or"]
        );
        assert_eq!(expr.symbols(), &["F", "B", "C"]);
        assert_eq!(expr.to_string(), "F or B and not C");
        assert_eq!(format!("{expr:?}"), "BooleanExpression(\"F or B and not C\")");
    }

    #[test]
    fn grammar_errors_propagate() {
        assert!(matches!(
            BooleanExpression::new("A and"),
            Err(Error::ExpressionOrder(..))
        ));
        assert!("(A".parse::<BooleanExpression>().is_err());
    }

    #[test]
    fn from_tree_and_postfix() {
        let expr = BooleanExpression::from_postfix(&["A", "B", "&", "~", "C", "or"]).unwrap();
        assert_eq!(expr.raw_expr(), "~(A & B) or C");
        assert_eq!(expr, be("not (A and B) or C"));
        assert_eq!(BooleanExpression::from_tree(expr.tree().clone()), expr);
    }

    #[test]
    fn equality_uses_trees() {
        assert_eq!(be("A /\\ B"), be("A and B"));
        assert_eq!(be("(A) and ((B))"), be("A and B"));
        assert_ne!(be("A and B"), be("B and A"));
    }

    #[test]
    fn evaluation() {
        let expr = be("(A and B) or C");
        assert!(expr.evaluate([("A", 1), ("B", 1), ("C", 0)]).unwrap());
        assert!(!expr.evaluate([("A", true), ("B", false), ("C", false)]).unwrap());
        assert!(expr.evaluate([("A", "0"), ("B", "0"), ("C", "1")]).unwrap());
        assert!(be("1 and ~0").evaluate(Vec::<(&str, bool)>::new()).unwrap());
    }

    #[test]
    fn evaluation_errors() {
        let expr = be("(A and B) or C");
        match expr.evaluate([("A", 1), ("D", 0), ("E", 1), ("B", 0)]) {
            Err(Error::ExtraSymbol(symbols)) => assert_eq!(symbols, vec!["D", "E"]),
            other => panic!("unexpected {other:?}"),
        }
        match expr.evaluate([("A", 1), ("B", 2), ("C", 0)]) {
            Err(Error::InvalidBooleanValue { symbol, value }) => {
                assert_eq!((symbol.as_str(), value.as_str()), ("B", "2"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match expr.evaluate([("B", 1)]) {
            Err(err @ Error::MissingSymbol(..)) => {
                assert_eq!(err.to_string(), "Symbols \"A\", \"C\" missing from the evaluation bindings");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unchecked_evaluation() {
        let bindings: FxHashMap<String, bool> = [("A".to_owned(), true), ("B".to_owned(), false)]
            .into_iter()
            .collect();
        assert!(be("A xor B").evaluate_unchecked(&bindings));
        assert!(!be("A -> B").evaluate_unchecked(&bindings));
    }

    #[test]
    #[should_panic(expected = "no value bound to symbol \"C\"")]
    fn unchecked_evaluation_panics_on_missing_symbol() {
        let bindings: FxHashMap<String, bool> = [("A".to_owned(), true)].into_iter().collect();
        let _ = be("A and C").evaluate_unchecked(&bindings);
    }

    #[test]
    fn clauses() {
        let clauses: Vec<_> = be("(A or ~B) and C and (D or E)")
            .iter_clauses()
            .unwrap()
            .map(|clause| clause.to_string())
            .collect();
        assert_eq!(clauses, vec!["A or ~B", "C", "D or E"]);

        let clauses: Vec<_> = be("(A and B) or ~C")
            .iter_clauses()
            .unwrap()
            .map(|clause| clause.to_string())
            .collect();
        assert_eq!(clauses, vec!["A and B", "~C"]);

        let clauses: Vec<_> = be("A and B")
            .iter_dnf_clauses()
            .unwrap()
            .map(|clause| clause.to_string())
            .collect();
        assert_eq!(clauses, vec!["A and B"]);

        assert!(matches!(
            be("A xor B").iter_clauses().map(|_| ()),
            Err(Error::RequiresNormalForm(..))
        ));
        assert!(matches!(
            be("(A and B) or C").iter_cnf_clauses().map(|_| ()),
            Err(Error::RequiresNormalForm(..))
        ));
        assert!(matches!(
            be("(A or B) and C").iter_dnf_clauses().map(|_| ()),
            Err(Error::RequiresNormalForm(..))
        ));
    }

    #[test]
    fn sat_one() {
        let solution = |expr: &str| be(expr).sat_one().unwrap().map(|s| s.to_string());

        assert_eq!(solution("A"), Some("A=1".to_owned()));
        assert_eq!(solution("~A"), Some("A=0".to_owned()));
        assert_eq!(solution("A and ~A"), None);
        assert_eq!(solution("A and 0"), None);
        assert_eq!(solution("A <-> (1 \\/ (1 /\\ 0)) <-> 1"), Some("A=1".to_owned()));
        assert_eq!(solution("A or (B and 1)"), Some("A=1, B=1".to_owned()));
        assert_eq!(solution("~A and B and ~C"), Some("A=0, B=1, C=0".to_owned()));
    }

    #[test]
    fn sat_all() {
        let solutions: Vec<_> = be("A xor B")
            .sat_all()
            .unwrap()
            .map(|solution| solution.to_string())
            .collect();
        assert_eq!(solutions, vec!["A=1, B=0", "A=0, B=1"]);

        assert_eq!(be("A nand ~A").sat_all().unwrap().count(), 2);
        assert_eq!(be("A and ~A").sat_all().unwrap().count(), 0);
    }

    #[test]
    fn sat_requires_symbols() {
        for expr in ["0", "1", "(0 or (1 xor 0)) nand 0"] {
            assert!(matches!(
                be(expr).sat_one(),
                Err(Error::NoEvaluationVariation(..))
            ));
            assert!(matches!(
                be(expr).sat_all().map(|_| ()),
                Err(Error::NoEvaluationVariation(..))
            ));
        }
    }
}
