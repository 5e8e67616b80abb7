//! Translation of expression trees into clauses over integer variables.
use derive_more::derive::From;
use rustc_hash::FxHashMap;

use crate::definitions::grammar::constant_value;
use crate::definitions::Operator;
use crate::errors::Error;
use crate::satisfiability::solution::{solution_from_model, SatSolution, SatSolutions};
use crate::satisfiability::solver::ClauseSolver;
use crate::trees::node::chain;
use crate::trees::rewrites::to_cnf;
use crate::trees::{NodeKind, NodeRef};
use crate::Result;

/// Solver variable of a symbol. Variables are numbered from 1 in the order
/// the symbols first appear in the expression.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Debug, Copy, Hash, From)]
pub struct VariableIdx(pub u32);

impl VariableIdx {
    #[must_use]
    pub fn literal(self, value: bool) -> i32 {
        let literal = i32::try_from(self.0).unwrap_or(i32::MAX);
        if value {
            literal
        } else {
            -literal
        }
    }
}

/// Variable of the symbol at position `idx` in symbol order.
fn variable_of(idx: usize) -> Result<VariableIdx> {
    u32::try_from(idx + 1).map(VariableIdx::from).map_err(|_| {
        Error::InvalidArgumentValue(format!("cannot number more than {} symbols", u32::MAX))
    })
}

/// Clauses of an expression in conjunctive normal form together with the
/// assumptions derived from its active constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseSet {
    clauses: Vec<Vec<i32>>,
    assumptions: Vec<i32>,
    symbols: Vec<String>,
    // A clause lost all of its literals to false constants.
    unsatisfiable: bool,
}

enum Literal {
    Constant(bool),
    Variable(i32),
}

impl ClauseSet {
    /// Translate `tree`, whose symbols are `symbols`, under `constraints`.
    ///
    /// Clauses holding a true constant are dropped and false constants are
    /// removed from their clauses. A symbol left without any clause gets the
    /// tautology `v or ~v` so that it still appears in every model.
    ///
    /// # Errors
    ///
    /// * [`Error::NoEvaluationVariation`] when `symbols` is empty,
    /// * [`Error::ExtraSymbol`] when a constraint names an unknown symbol.
    pub fn new(tree: &NodeRef, symbols: &[String], constraints: &[(&str, bool)]) -> Result<Self> {
        if symbols.is_empty() {
            return Err(Error::NoEvaluationVariation(format!(
                "\"{tree}\" has no symbols to vary"
            )));
        }

        let variables = symbols
            .iter()
            .enumerate()
            .map(|(idx, symbol)| Ok((symbol.as_str(), variable_of(idx)?)))
            .collect::<Result<FxHashMap<&str, VariableIdx>>>()?;

        let cnf = to_cnf(tree);
        let mut clauses = Vec::new();
        let mut unsatisfiable = false;
        let mut mentioned = vec![false; symbols.len()];

        'clauses: for clause in chain(&cnf, Operator::And) {
            let mut literals = Vec::new();
            for node in chain(clause, Operator::Or) {
                match clause_literal(node, &variables)? {
                    Literal::Constant(true) => continue 'clauses,
                    Literal::Constant(false) => {}
                    Literal::Variable(literal) => literals.push(literal),
                }
            }

            if literals.is_empty() {
                unsatisfiable = true;
                continue;
            }
            for literal in &literals {
                mentioned[literal.unsigned_abs() as usize - 1] = true;
            }
            clauses.push(literals);
        }

        for (idx, mentioned) in mentioned.iter().enumerate() {
            if !mentioned {
                let variable = variable_of(idx)?;
                clauses.push(vec![variable.literal(true), variable.literal(false)]);
            }
        }

        let assumptions = constraints
            .iter()
            .map(|(symbol, value)| {
                variables
                    .get(symbol)
                    .map(|variable| variable.literal(*value))
                    .ok_or_else(|| Error::ExtraSymbol(vec![(*symbol).to_owned()]))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            variables = symbols.len(),
            clauses = clauses.len(),
            assumptions = assumptions.len(),
            unsatisfiable,
            "translated expression to clauses"
        );

        Ok(ClauseSet {
            clauses,
            assumptions,
            symbols: symbols.to_vec(),
            unsatisfiable,
        })
    }

    #[must_use]
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }

    #[must_use]
    pub fn assumptions(&self) -> &[i32] {
        &self.assumptions
    }

    /// Symbols in variable order: symbol `i` is variable `i + 1`.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Whether constant folding alone proved the clauses unsatisfiable.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.unsatisfiable
    }

    fn assumptions_arg(&self) -> Option<&[i32]> {
        if self.assumptions.is_empty() {
            None
        } else {
            Some(&self.assumptions)
        }
    }

    /// First satisfying assignment found by `solver`.
    ///
    /// # Errors
    ///
    /// Propagates the solver's errors.
    pub fn solve_one<S: ClauseSolver>(&self, solver: &S) -> Result<Option<SatSolution>> {
        if self.unsatisfiable {
            return Ok(None);
        }

        let model = solver.solve_one(&self.clauses, self.assumptions_arg())?;
        Ok(model.map(|model| solution_from_model(&self.symbols, &model)))
    }

    /// Every satisfying assignment, produced lazily by `solver`.
    ///
    /// # Errors
    ///
    /// Propagates the solver's errors.
    pub fn solve_all<S: ClauseSolver>(&self, solver: &S) -> Result<SatSolutions<S::Solutions>> {
        if self.unsatisfiable {
            return Ok(SatSolutions::new(None, self.symbols.clone()));
        }

        let models = solver.solve_all(&self.clauses, self.assumptions_arg())?;
        Ok(SatSolutions::new(Some(models), self.symbols.clone()))
    }

    /// Write the clauses in DIMACS CNF format, assumptions included as unit
    /// clauses. Symbol names are listed in comments.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `writer` fails.
    pub fn write_dimacs(&self, writer: &mut dyn std::io::Write) -> std::io::Result<()> {
        for (idx, symbol) in self.symbols.iter().enumerate() {
            writeln!(writer, "c {} {symbol}", idx + 1)?;
        }

        let mut clauses: Vec<&[i32]> = self.clauses.iter().map(Vec::as_slice).collect();
        clauses.extend(self.assumptions.chunks(1));
        if self.unsatisfiable {
            clauses.push(&[]);
        }

        writeln!(writer, "p cnf {} {}", self.symbols.len(), clauses.len())?;
        for clause in clauses {
            for literal in clause {
                write!(writer, "{literal} ")?;
            }
            writeln!(writer, "0")?;
        }

        Ok(())
    }
}

fn clause_literal(node: &NodeRef, variables: &FxHashMap<&str, VariableIdx>) -> Result<Literal> {
    let (name, negated) = match node.kind() {
        NodeKind::Operand(name) => (name, false),
        NodeKind::Unary { child, .. } => match child.kind() {
            NodeKind::Operand(name) => (name, true),
            _ => return Err(not_a_literal(node)),
        },
        NodeKind::Binary { .. } => return Err(not_a_literal(node)),
    };

    if let Some(value) = constant_value(name) {
        return Ok(Literal::Constant(value != negated));
    }

    variables
        .get(name.as_str())
        .map(|variable| Literal::Variable(variable.literal(!negated)))
        .ok_or_else(|| Error::ExtraSymbol(vec![name.clone()]))
}

fn not_a_literal(node: &NodeRef) -> Error {
    Error::RequiresNormalForm(format!("\"{node}\" is not a literal of a clause"))
}
