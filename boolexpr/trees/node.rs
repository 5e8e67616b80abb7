use std::fmt::Display;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::definitions::grammar::{constant_str, constant_value, is_constant, is_valid_identifier};
use crate::definitions::operators::is_symbolic;
use crate::definitions::{Arity, Operator};
use crate::errors::Error;
use crate::expressions::Token;
use crate::Result;

/// Shared handle to an immutable tree node. Rewrites build new nodes and
/// reuse untouched subtrees through these handles.
pub type NodeRef = Arc<ExpressionTreeNode>;

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A symbol or a constant.
    Operand(String),
    Unary {
        operator: Operator,
        spelling: &'static str,
        child: NodeRef,
    },
    Binary {
        operator: Operator,
        spelling: &'static str,
        left: NodeRef,
        right: NodeRef,
    },
}

/// Node of an expression tree.
///
/// The normal-form flags are computed once from the children when the node
/// is built. Equality compares operators, operand names and shape; the
/// spelling an operator was written in does not matter, so `~A == not A`.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools, clippy::module_name_repetitions)]
pub struct ExpressionTreeNode {
    kind: NodeKind,
    is_cnf: bool,
    is_dnf: bool,
    is_really_unary: bool,
}

impl ExpressionTreeNode {
    fn new(kind: NodeKind) -> NodeRef {
        let (is_cnf, is_dnf, is_really_unary) = match &kind {
            NodeKind::Operand(..) => (true, true, true),
            NodeKind::Unary { child, .. } => {
                (child.is_leaf(), child.is_leaf(), child.is_really_unary)
            }
            NodeKind::Binary {
                operator,
                left,
                right,
                ..
            } => match operator {
                Operator::And => (
                    left.is_cnf && right.is_cnf,
                    left.is_dnf
                        && right.is_dnf
                        && !left.is_binary(Operator::Or)
                        && !right.is_binary(Operator::Or),
                    false,
                ),
                Operator::Or => (
                    left.is_cnf
                        && right.is_cnf
                        && !left.is_binary(Operator::And)
                        && !right.is_binary(Operator::And),
                    left.is_dnf && right.is_dnf,
                    false,
                ),
                _ => (false, false, false),
            },
        };

        Arc::new(ExpressionTreeNode {
            kind,
            is_cnf,
            is_dnf,
            is_really_unary,
        })
    }

    #[must_use]
    pub(crate) fn operand(name: impl Into<String>) -> NodeRef {
        ExpressionTreeNode::new(NodeKind::Operand(name.into()))
    }

    #[must_use]
    pub(crate) fn constant(value: bool) -> NodeRef {
        ExpressionTreeNode::operand(constant_str(value))
    }

    #[must_use]
    pub(crate) fn negation(spelling: &'static str, child: NodeRef) -> NodeRef {
        ExpressionTreeNode::new(NodeKind::Unary {
            operator: Operator::Not,
            spelling,
            child,
        })
    }

    /// # Panics
    ///
    /// Panics when `operator` is unary.
    #[must_use]
    pub(crate) fn binary(
        operator: Operator,
        spelling: &'static str,
        left: NodeRef,
        right: NodeRef,
    ) -> NodeRef {
        assert!(
            operator.arity() == Arity::Binary,
            "{operator} is not a binary operator"
        );
        ExpressionTreeNode::new(NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        })
    }

    /// Build a tree from postfix tokens written as strings, e.g.
    /// `["A", "B", "and", "not"]` for `not (A and B)`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgumentValue`] when `postfix` is empty or does not
    ///   describe exactly one tree,
    /// * [`Error::InvalidArgumentType`] when a token is neither an operator
    ///   spelling nor a valid operand.
    pub fn build_tree<S: AsRef<str>>(postfix: &[S]) -> Result<NodeRef> {
        let tokens = postfix
            .iter()
            .map(|token| {
                let token = token.as_ref();
                if let Some((operator, spelling)) = Operator::lookup(token) {
                    Ok(Token::Operator { operator, spelling })
                } else if is_constant(token) || is_valid_identifier(token) {
                    Ok(Token::operand(token))
                } else {
                    Err(Error::InvalidArgumentType(format!(
                        "\"{token}\" is neither an operator nor an operand"
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        ExpressionTreeNode::from_postfix(&tokens)
    }

    /// Build a tree from postfix tokens.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgumentValue`] when `postfix` is empty or does not
    ///   describe exactly one tree,
    /// * [`Error::InvalidArgumentType`] when it contains parentheses.
    pub fn from_postfix(postfix: &[Token]) -> Result<NodeRef> {
        if postfix.is_empty() {
            return Err(Error::InvalidArgumentValue(
                "cannot build a tree from an empty postfix sequence".to_owned(),
            ));
        }

        let missing_operand = |spelling: &&str| {
            Error::InvalidArgumentValue(format!("operator \"{spelling}\" is missing an operand"))
        };

        let mut stack: Vec<NodeRef> = Vec::new();
        for token in postfix {
            match token {
                Token::Operand(name) => stack.push(ExpressionTreeNode::operand(name.clone())),
                Token::Operator {
                    operator: Operator::Not,
                    spelling,
                } => {
                    let child = stack.pop().ok_or_else(|| missing_operand(spelling))?;
                    stack.push(ExpressionTreeNode::negation(*spelling, child));
                }
                Token::Operator { operator, spelling } => {
                    let right = stack.pop().ok_or_else(|| missing_operand(spelling))?;
                    let left = stack.pop().ok_or_else(|| missing_operand(spelling))?;
                    stack.push(ExpressionTreeNode::binary(*operator, *spelling, left, right));
                }
                Token::LeftParen | Token::RightParen => {
                    return Err(Error::InvalidArgumentType(
                        "parentheses cannot appear in a postfix sequence".to_owned(),
                    ))
                }
            }
        }

        let root = stack.pop();
        if !stack.is_empty() {
            return Err(Error::InvalidArgumentValue(format!(
                "postfix sequence leaves {} unused operands",
                stack.len()
            )));
        }
        root.ok_or_else(|| {
            Error::InvalidArgumentValue("postfix sequence does not produce a tree".to_owned())
        })
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether the subtree is in conjunctive normal form.
    #[must_use]
    pub fn is_cnf(&self) -> bool {
        self.is_cnf
    }

    /// Whether the subtree is in disjunctive normal form.
    #[must_use]
    pub fn is_dnf(&self) -> bool {
        self.is_dnf
    }

    /// Whether the subtree is a chain of negations over a single operand.
    #[must_use]
    pub fn is_really_unary(&self) -> bool {
        self.is_really_unary
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Operand(..))
    }

    #[must_use]
    pub fn is_binary_node(&self) -> bool {
        matches!(self.kind, NodeKind::Binary { .. })
    }

    #[must_use]
    pub fn is_binary(&self, operator: Operator) -> bool {
        matches!(&self.kind, NodeKind::Binary { operator: op, .. } if *op == operator)
    }

    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match &self.kind {
            NodeKind::Operand(..) => None,
            NodeKind::Unary { operator, .. } | NodeKind::Binary { operator, .. } => Some(*operator),
        }
    }

    /// Operand name for leaves, operator spelling otherwise.
    #[must_use]
    pub fn symbol_name(&self) -> &str {
        match &self.kind {
            NodeKind::Operand(name) => name,
            NodeKind::Unary { spelling, .. } | NodeKind::Binary { spelling, .. } => spelling,
        }
    }

    /// Truth value of a constant leaf.
    #[must_use]
    pub fn constant_value(&self) -> Option<bool> {
        match &self.kind {
            NodeKind::Operand(name) => constant_value(name),
            _ => None,
        }
    }

    /// Evaluate the subtree, looking symbols up through `lookup`.
    pub fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match &self.kind {
            NodeKind::Operand(name) => constant_value(name).unwrap_or_else(|| lookup(name)),
            NodeKind::Unary { operator, child, .. } => {
                let value = child.evaluate(lookup);
                operator.eval(value, value)
            }
            NodeKind::Binary {
                operator,
                left,
                right,
                ..
            } => operator.eval(left.evaluate(lookup), right.evaluate(lookup)),
        }
    }

    /// Symbols of the subtree in order of first appearance, constants excluded.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut symbols = Vec::new();
        self.collect_symbols(&mut seen, &mut symbols);
        symbols
    }

    fn collect_symbols<'a>(&'a self, seen: &mut FxHashSet<&'a str>, symbols: &mut Vec<String>) {
        match &self.kind {
            NodeKind::Operand(name) => {
                if !is_constant(name) && seen.insert(name.as_str()) {
                    symbols.push(name.clone());
                }
            }
            NodeKind::Unary { child, .. } => child.collect_symbols(seen, symbols),
            NodeKind::Binary { left, right, .. } => {
                left.collect_symbols(seen, symbols);
                right.collect_symbols(seen, symbols);
            }
        }
    }

    /// Infix tokens of the canonical serialization.
    ///
    /// Negated binary subtrees and binary left children are parenthesized. A
    /// binary right child is parenthesized unless it is spelled like its parent,
    /// which keeps right-nested chains such as `A and B and C` flat.
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.push_tokens(&mut tokens);
        tokens
    }

    fn push_tokens(&self, tokens: &mut Vec<Token>) {
        match &self.kind {
            NodeKind::Operand(name) => tokens.push(Token::operand(name.clone())),
            NodeKind::Unary {
                operator,
                spelling,
                child,
            } => {
                tokens.push(Token::Operator {
                    operator: *operator,
                    spelling: *spelling,
                });
                child.push_wrapped(tokens, child.is_binary_node());
            }
            NodeKind::Binary {
                operator,
                spelling,
                left,
                right,
            } => {
                left.push_wrapped(tokens, left.is_binary_node());
                tokens.push(Token::Operator {
                    operator: *operator,
                    spelling: *spelling,
                });
                right.push_wrapped(
                    tokens,
                    right.is_binary_node() && right.symbol_name() != *spelling,
                );
            }
        }
    }

    fn push_wrapped(&self, tokens: &mut Vec<Token>, parenthesize: bool) {
        if parenthesize {
            tokens.push(Token::LeftParen);
            self.push_tokens(tokens);
            tokens.push(Token::RightParen);
        } else {
            self.push_tokens(tokens);
        }
    }

    /// Tokens in postfix order.
    #[must_use]
    pub fn postfix_tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.push_postfix(&mut tokens);
        tokens
    }

    fn push_postfix(&self, tokens: &mut Vec<Token>) {
        match &self.kind {
            NodeKind::Operand(name) => tokens.push(Token::operand(name.clone())),
            NodeKind::Unary {
                operator,
                spelling,
                child,
            } => {
                child.push_postfix(tokens);
                tokens.push(Token::Operator {
                    operator: *operator,
                    spelling: *spelling,
                });
            }
            NodeKind::Binary {
                operator,
                spelling,
                left,
                right,
            } => {
                left.push_postfix(tokens);
                right.push_postfix(tokens);
                tokens.push(Token::Operator {
                    operator: *operator,
                    spelling: *spelling,
                });
            }
        }
    }
}

/// Operands of the maximal chain of `operator` nodes rooted at `node`, left to right.
/// A node that is not an `operator` node is a chain of one.
#[must_use]
pub(crate) fn chain(node: &NodeRef, operator: Operator) -> Vec<&NodeRef> {
    fn collect<'a>(node: &'a NodeRef, operator: Operator, operands: &mut Vec<&'a NodeRef>) {
        match node.kind() {
            NodeKind::Binary {
                operator: op,
                left,
                right,
                ..
            } if *op == operator => {
                collect(left, operator, operands);
                collect(right, operator, operands);
            }
            _ => operands.push(node),
        }
    }

    let mut operands = Vec::new();
    collect(node, operator, &mut operands);
    operands
}

/// Join tokens into text: symbolic negations attach to their operand,
/// parentheses hug their contents, everything else is separated by a space.
#[must_use]
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut glue = true;

    for token in tokens {
        if !glue && *token != Token::RightParen {
            out.push(' ');
        }
        out.push_str(token.as_str());
        glue = match token {
            Token::LeftParen => true,
            Token::Operator {
                operator: Operator::Not,
                spelling,
            } => is_symbolic(spelling),
            _ => false,
        };
    }

    out
}

impl PartialEq for ExpressionTreeNode {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Operand(a), NodeKind::Operand(b)) => a == b,
            (
                NodeKind::Unary {
                    operator: a,
                    child: a_child,
                    ..
                },
                NodeKind::Unary {
                    operator: b,
                    child: b_child,
                    ..
                },
            ) => a == b && a_child == b_child,
            (
                NodeKind::Binary {
                    operator: a,
                    left: a_left,
                    right: a_right,
                    ..
                },
                NodeKind::Binary {
                    operator: b,
                    left: b_left,
                    right: b_right,
                    ..
                },
            ) => a == b && a_left == b_left && a_right == b_right,
            _ => false,
        }
    }
}

impl Eq for ExpressionTreeNode {}

impl Display for ExpressionTreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", render(&self.tokens()))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{ExpressionTreeNode, NodeRef};
    use crate::errors::Error;
    use crate::expressions::Token;

    fn tree(postfix: &str) -> NodeRef {
        let tokens: Vec<_> = postfix.split_whitespace().collect();
        ExpressionTreeNode::build_tree(&tokens).unwrap()
    }

    fn strs(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn empty_postfix() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ExpressionTreeNode::build_tree(&empty),
            Err(Error::InvalidArgumentValue(..))
        ));
    }

    #[test]
    fn invalid_postfix_tokens() {
        assert!(matches!(
            ExpressionTreeNode::build_tree(&["A", "$", "and"]),
            Err(Error::InvalidArgumentType(..))
        ));
        assert!(matches!(
            ExpressionTreeNode::build_tree(&["A", "and"]),
            Err(Error::InvalidArgumentValue(..))
        ));
        assert!(matches!(
            ExpressionTreeNode::build_tree(&["A", "B"]),
            Err(Error::InvalidArgumentValue(..))
        ));
    }

    #[test]
    fn serialization() {
        let cases = [
            ("A", "A"),
            ("A ~ ~ ~", "~~~A"),
            ("A not not", "not not A"),
            ("A B & not", "not (A & B)"),
            ("A B & ~", "~(A & B)"),
            (
                "A not not not not B ! C D ~ ~ or or or",
                "not not not not A or !B or C or ~~D",
            ),
            ("A B C D and and and E or", "(A and B and C and D) or E"),
            (
                "A B C or D E F or or and and",
                "A and (B or C) and (D or E or F)",
            ),
            ("A B C D & & E -> ->", "A -> (B & C & D) -> E"),
            ("A B iff ! 0 1 and and", "!(A iff B) and 0 and 1"),
            ("A B C D xor xor ~ E -> ->", "A -> ~(B xor C xor D) -> E"),
            (
                "A B C D E and and not xnor xnor",
                "A xnor B xnor not (C and D and E)",
            ),
            ("A B and C or", "(A and B) or C"),
            ("A B C & |", "A | (B & C)"),
        ];

        for (postfix, expected) in cases {
            assert_eq!(tree(postfix).to_string(), expected, "{postfix}");
        }
    }

    #[test]
    fn serialized_tokens() {
        let root = tree("A B & not");
        assert_eq!(strs(&root.tokens()), vec!["not", "(", "A", "&", "B", ")"]);
        assert_eq!(strs(&root.postfix_tokens()), vec!["A", "B", "&", "not"]);
        assert_eq!(root.symbols(), vec!["A", "B"]);
    }

    #[test]
    fn constants_are_not_symbols() {
        assert_eq!(tree("0 A 1 and or").symbols(), vec!["A"]);
        assert!(tree("0 1 and").symbols().is_empty());
    }

    #[test]
    fn equality_ignores_spelling() {
        assert_eq!(tree("A ~"), tree("A not"));
        assert_eq!(tree("A B and"), tree("A B /\\"));
        assert_eq!(tree("A B impl"), tree("A B ->"));
        assert_eq!(tree("A B iff ~"), tree("A B <-> not"));
        assert_ne!(tree("A B iff"), tree("A B xnor"));
        assert_ne!(tree("A B and"), tree("B A and"));
        assert_ne!(tree("A B and C and"), tree("A B C and and"));
    }

    #[test]
    fn cnf_and_dnf() {
        let forms = |postfix: &str| {
            let root = tree(postfix);
            (root.is_cnf(), root.is_dnf())
        };

        assert_eq!(forms("A"), (true, true));
        assert_eq!(forms("A ~"), (true, true));
        assert_eq!(forms("A ~ ~"), (false, false));
        assert_eq!(forms("A B and"), (true, true));
        assert_eq!(forms("A B or"), (true, true));
        // (A or B) and C
        assert_eq!(forms("A B or C and"), (true, false));
        // (A and B) or C
        assert_eq!(forms("A B and C or"), (false, true));
        // (A or ~B) and (C or D) and ~E
        assert_eq!(forms("A B ~ or C D or E ~ and and"), (true, false));
        // A or (B and (C or D))
        assert_eq!(forms("A B C D or and or"), (false, false));
        assert_eq!(forms("A B xor"), (false, false));
        assert_eq!(forms("A B or ~"), (false, false));
        assert_eq!(forms("A B -> C and"), (false, false));
    }

    #[test]
    fn really_unary() {
        assert!(tree("A").is_really_unary());
        assert!(tree("A ~ ~ ~").is_really_unary());
        assert!(!tree("A B and").is_really_unary());
        assert!(!tree("A B and ~").is_really_unary());
    }

    #[test]
    fn evaluation() {
        let root = tree("A B C or and");
        let bindings = |a: bool, b: bool, c: bool| {
            move |symbol: &str| match symbol {
                "A" => a,
                "B" => b,
                _ => c,
            }
        };

        assert!(root.evaluate(&bindings(true, false, true)));
        assert!(!root.evaluate(&bindings(false, true, true)));
        assert!(!root.evaluate(&bindings(true, false, false)));
        assert!(tree("0 ~ A or").evaluate(&|_: &str| false));
    }
}
