use std::fmt::Display;

use crate::definitions::grammar::constant_str;

/// Satisfying assignment of an expression's symbols, in the order the
/// symbols appear in the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatSolution {
    assignments: Vec<(String, bool)>,
}

impl SatSolution {
    pub(crate) fn new(assignments: Vec<(String, bool)>) -> Self {
        SatSolution { assignments }
    }

    /// Value assigned to `symbol`, `None` if the symbol is not part of the solution.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<bool> {
        self.assignments
            .iter()
            .find(|(name, _)| name == symbol)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.assignments
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl Display for SatSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let assignments: Vec<_> = self
            .iter()
            .map(|(name, value)| format!("{name}={}", constant_str(value)))
            .collect();
        write!(f, "{}", assignments.join(", "))
    }
}

/// Lazy sequence of satisfying assignments. It is finite and cannot be
/// restarted once exhausted.
#[derive(Debug)]
pub struct SatSolutions<I> {
    // `None` when the clauses were found unsatisfiable before solving.
    models: Option<I>,
    symbols: Vec<String>,
}

impl<I> SatSolutions<I>
where
    I: Iterator<Item = Vec<i32>>,
{
    pub(crate) fn new(models: Option<I>, symbols: Vec<String>) -> Self {
        SatSolutions { models, symbols }
    }
}

/// Read the symbols' values off a model whose variable `i + 1` is symbol `i`.
pub(crate) fn solution_from_model(symbols: &[String], model: &[i32]) -> SatSolution {
    SatSolution::new(
        symbols
            .iter()
            .zip(model)
            .map(|(symbol, literal)| (symbol.clone(), *literal > 0))
            .collect(),
    )
}

impl<I> Iterator for SatSolutions<I>
where
    I: Iterator<Item = Vec<i32>>,
{
    type Item = SatSolution;

    fn next(&mut self) -> Option<SatSolution> {
        let model = self.models.as_mut()?.next()?;
        Some(solution_from_model(&self.symbols, &model))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{SatSolution, SatSolutions};

    #[test]
    fn display_and_lookup() {
        let solution = SatSolution::new(vec![
            ("A".to_owned(), false),
            ("B".to_owned(), true),
            ("C".to_owned(), true),
        ]);
        assert_eq!(solution.to_string(), "A=0, B=1, C=1");
        assert_eq!(solution.get("A"), Some(false));
        assert_eq!(solution.get("C"), Some(true));
        assert_eq!(solution.get("D"), None);
        assert_eq!(solution.len(), 3);
    }

    #[test]
    fn solutions_follow_models() {
        let models = vec![vec![1, -2], vec![-1, -2]];
        let solutions: Vec<_> = SatSolutions::new(
            Some(models.into_iter()),
            vec!["X".to_owned(), "Y".to_owned()],
        )
        .map(|solution| solution.to_string())
        .collect();
        assert_eq!(solutions, vec!["X=1, Y=0", "X=0, Y=0"]);

        let mut none = SatSolutions::new(None::<std::vec::IntoIter<Vec<i32>>>, Vec::new());
        assert_eq!(none.next(), None);
    }
}
