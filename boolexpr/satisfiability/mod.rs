//! Satisfiability queries: clause translation, the clause-solving contract
//! and DIMACS interchange.
pub mod bridge;
pub mod dimacs;
pub mod solution;
pub mod solver;

pub use crate::satisfiability::bridge::{ClauseSet, VariableIdx};
pub use crate::satisfiability::solution::{SatSolution, SatSolutions};
pub use crate::satisfiability::solver::{BacktrackingSolver, ClauseSolver, Models};

use crate::Result;

/// First model of `clauses` under `assumptions` using [`BacktrackingSolver`].
///
/// # Errors
///
/// See [`ClauseSolver::solve_one`].
pub fn sat_one(clauses: &[Vec<i32>], assumptions: Option<&[i32]>) -> Result<Option<Vec<i32>>> {
    BacktrackingSolver.solve_one(clauses, assumptions)
}

/// Every model of `clauses` under `assumptions` using [`BacktrackingSolver`].
///
/// # Errors
///
/// See [`ClauseSolver::solve_all`].
pub fn sat_all(clauses: &[Vec<i32>], assumptions: Option<&[i32]>) -> Result<Models> {
    BacktrackingSolver.solve_all(clauses, assumptions)
}
