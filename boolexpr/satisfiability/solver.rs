//! Clause-solving contract and the built-in backtracking solver.
use bitvec::prelude::*;

use crate::errors::Error;
use crate::Result;

/// Solver over clauses of signed, non-zero literals: `3` is variable 3 and
/// `-3` its negation.
///
/// A model is a complete assignment of variables `1..=n`, where `n` is the
/// largest variable mentioned by a clause or an assumption, written as one
/// literal per variable in increasing variable order.
pub trait ClauseSolver {
    type Solutions: Iterator<Item = Vec<i32>>;

    /// First model of `clauses` under `assumptions`, or `None` when there is none.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgumentValue`] when the clause list or a clause is
    /// empty, a literal is zero, or the assumptions are given but empty.
    fn solve_one(&self, clauses: &[Vec<i32>], assumptions: Option<&[i32]>) -> Result<Option<Vec<i32>>> {
        Ok(self.solve_all(clauses, assumptions)?.next())
    }

    /// Lazily enumerate every model of `clauses` under `assumptions`.
    ///
    /// # Errors
    ///
    /// Same as [`ClauseSolver::solve_one`].
    fn solve_all(&self, clauses: &[Vec<i32>], assumptions: Option<&[i32]>) -> Result<Self::Solutions>;
}

/// Chronological backtracking over the variables in increasing order,
/// trying `true` before `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackingSolver;

impl ClauseSolver for BacktrackingSolver {
    type Solutions = Models;

    fn solve_all(&self, clauses: &[Vec<i32>], assumptions: Option<&[i32]>) -> Result<Models> {
        validate(clauses, assumptions)?;
        Ok(Models::new(clauses, assumptions.unwrap_or_default()))
    }
}

fn validate(clauses: &[Vec<i32>], assumptions: Option<&[i32]>) -> Result<()> {
    if clauses.is_empty() {
        return Err(Error::InvalidArgumentValue(
            "clause list must not be empty".to_owned(),
        ));
    }

    if let Some(position) = clauses.iter().position(Vec::is_empty) {
        return Err(Error::InvalidArgumentValue(format!(
            "clause {position} is empty"
        )));
    }

    if clauses.iter().flatten().any(|literal| *literal == 0) {
        return Err(Error::InvalidArgumentValue(
            "clauses must not contain the literal 0".to_owned(),
        ));
    }

    match assumptions {
        Some([]) => Err(Error::InvalidArgumentValue(
            "assumption list must not be empty when given".to_owned(),
        )),
        Some(assumptions) if assumptions.contains(&0) => Err(Error::InvalidArgumentValue(
            "assumptions must not contain the literal 0".to_owned(),
        )),
        _ => Ok(()),
    }
}

fn var_index(literal: i32) -> usize {
    // Literals are validated to be non-zero, variables are stored 0-indexed.
    literal.unsigned_abs() as usize - 1
}

#[derive(Debug, Clone, Copy)]
struct Decision {
    variable: usize,
    // No alternative value is left to try.
    flipped: bool,
}

/// Models of a clause set, produced on demand. Once exhausted the
/// enumeration cannot be restarted.
#[derive(Debug)]
pub struct Models {
    clauses: Vec<Vec<i32>>,
    // Indices of the clauses mentioning each variable.
    occurrences: Vec<Vec<usize>>,
    forced: Vec<Option<bool>>,
    assigned: BitVec,
    values: BitVec,
    trail: Vec<Decision>,
    started: bool,
    exhausted: bool,
}

impl Models {
    fn new(clauses: &[Vec<i32>], assumptions: &[i32]) -> Self {
        let variables = clauses
            .iter()
            .flatten()
            .chain(assumptions)
            .map(|literal| var_index(*literal) + 1)
            .max()
            .unwrap_or(0);

        let mut occurrences = vec![Vec::new(); variables];
        for (idx, clause) in clauses.iter().enumerate() {
            for literal in clause {
                let occurrence = &mut occurrences[var_index(*literal)];
                if occurrence.last() != Some(&idx) {
                    occurrence.push(idx);
                }
            }
        }

        let mut forced = vec![None; variables];
        let mut exhausted = false;
        for literal in assumptions {
            let value = *literal > 0;
            match forced[var_index(*literal)] {
                Some(previous) if previous != value => exhausted = true,
                _ => forced[var_index(*literal)] = Some(value),
            }
        }

        Models {
            clauses: clauses.to_vec(),
            occurrences,
            forced,
            assigned: bitvec![0; variables],
            values: bitvec![0; variables],
            trail: Vec::with_capacity(variables),
            started: false,
            exhausted,
        }
    }

    fn assign(&mut self, variable: usize, value: bool) {
        self.assigned.set(variable, true);
        self.values.set(variable, value);
    }

    /// Whether the last assignment of `variable` falsified a clause.
    fn conflicts(&self, variable: usize) -> bool {
        self.occurrences[variable].iter().any(|idx| {
            self.clauses[*idx].iter().all(|literal| {
                let var = var_index(*literal);
                self.assigned[var] && self.values[var] != (*literal > 0)
            })
        })
    }

    /// Assign the remaining variables, backtracking on conflicts. Returns
    /// `false` once the search space is exhausted.
    fn descend(&mut self) -> bool {
        while self.trail.len() < self.forced.len() {
            let variable = self.trail.len();
            let forced = self.forced[variable];
            self.assign(variable, forced.unwrap_or(true));
            self.trail.push(Decision {
                variable,
                flipped: forced.is_some(),
            });

            if self.conflicts(variable) && !self.backtrack() {
                return false;
            }
        }

        true
    }

    /// Flip the deepest decision that still has an alternative.
    fn backtrack(&mut self) -> bool {
        while let Some(decision) = self.trail.pop() {
            self.assigned.set(decision.variable, false);
            if decision.flipped {
                continue;
            }

            self.assign(decision.variable, false);
            self.trail.push(Decision {
                variable: decision.variable,
                flipped: true,
            });
            if !self.conflicts(decision.variable) {
                return true;
            }
        }

        self.exhausted = true;
        false
    }

    fn model(&self) -> Vec<i32> {
        (1..=self.values.len())
            .zip(self.values.iter().by_vals())
            .map(|(variable, value)| {
                let literal = i32::try_from(variable).unwrap_or(i32::MAX);
                if value {
                    literal
                } else {
                    -literal
                }
            })
            .collect()
    }
}

impl Iterator for Models {
    type Item = Vec<i32>;

    fn next(&mut self) -> Option<Vec<i32>> {
        if self.exhausted {
            return None;
        }

        let found = if self.started {
            self.backtrack() && self.descend()
        } else {
            self.started = true;
            self.descend()
        };

        if found {
            Some(self.model())
        } else {
            self.exhausted = true;
            None
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{BacktrackingSolver, ClauseSolver};
    use crate::errors::Error;

    fn clauses(clauses: &[&[i32]]) -> Vec<Vec<i32>> {
        clauses.iter().map(|clause| clause.to_vec()).collect()
    }

    #[test]
    fn unsatisfiable() {
        let solver = BacktrackingSolver;
        assert_eq!(solver.solve_one(&clauses(&[&[1], &[-1]]), None).unwrap(), None);
        assert_eq!(
            solver
                .solve_all(&clauses(&[&[1, 2], &[-1], &[-2]]), None)
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn first_model() {
        let solver = BacktrackingSolver;
        assert_eq!(
            solver
                .solve_one(
                    &clauses(&[&[1, 2, 3], &[-2, -3], &[1, -2], &[2, -3], &[-2]]),
                    None
                )
                .unwrap(),
            Some(vec![1, -2, -3])
        );
        assert_eq!(
            solver
                .solve_one(&clauses(&[&[1, 2, 3], &[2, 3]]), Some(&[-1, -3]))
                .unwrap(),
            Some(vec![-1, 2, -3])
        );
    }

    #[test]
    fn all_models() {
        let solver = BacktrackingSolver;
        let models: Vec<_> = solver
            .solve_all(&clauses(&[&[1], &[2, 3, 4], &[2, 3]]), None)
            .unwrap()
            .collect();
        assert_eq!(
            models,
            vec![
                vec![1, 2, 3, 4],
                vec![1, 2, 3, -4],
                vec![1, 2, -3, 4],
                vec![1, 2, -3, -4],
                vec![1, -2, 3, 4],
                vec![1, -2, 3, -4],
            ]
        );

        let models: Vec<_> = solver
            .solve_all(&clauses(&[&[1], &[2, 3, 4], &[2, 3]]), Some(&[-3]))
            .unwrap()
            .collect();
        assert_eq!(models, vec![vec![1, 2, -3, 4], vec![1, 2, -3, -4]]);
    }

    #[test]
    fn exhausted_enumeration_stays_exhausted() {
        let mut models = BacktrackingSolver
            .solve_all(&clauses(&[&[1, -1]]), None)
            .unwrap();
        assert_eq!(models.next(), Some(vec![1]));
        assert_eq!(models.next(), Some(vec![-1]));
        assert_eq!(models.next(), None);
        assert_eq!(models.next(), None);
    }

    #[test]
    fn assumptions_beyond_clause_variables() {
        let models: Vec<_> = BacktrackingSolver
            .solve_all(&clauses(&[&[1]]), Some(&[-2]))
            .unwrap()
            .collect();
        assert_eq!(models, vec![vec![1, -2]]);
    }

    #[test]
    fn conflicting_assumptions() {
        assert_eq!(
            BacktrackingSolver
                .solve_one(&clauses(&[&[1, 2]]), Some(&[2, -2]))
                .unwrap(),
            None
        );
    }

    #[test]
    fn invalid_input() {
        let solver = BacktrackingSolver;
        for (clauses, assumptions) in [
            (Vec::new(), None),
            (clauses(&[&[1], &[]]), None),
            (clauses(&[&[1, 0]]), None),
            (clauses(&[&[1]]), Some(&[][..])),
            (clauses(&[&[1]]), Some(&[0][..])),
        ] {
            assert!(matches!(
                solver.solve_one(&clauses, assumptions),
                Err(Error::InvalidArgumentValue(..))
            ));
        }
    }
}
