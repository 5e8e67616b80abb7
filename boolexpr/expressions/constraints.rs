use std::ops::Deref;

use crate::definitions::BooleanValue;
use crate::expressions::bexpr::BooleanExpression;
use crate::Result;

/// Guard over a frame of constraints pushed onto an expression. The frame
/// is popped when the guard is dropped, on every exit path.
///
/// The guard dereferences to the constrained expression, so satisfiability
/// queries run through it see the constraints.
#[must_use = "the constraints are released as soon as the guard is dropped"]
pub struct ConstrainedExpression<'a> {
    expr: &'a mut BooleanExpression,
}

impl<'a> ConstrainedExpression<'a> {
    pub(crate) fn new(expr: &'a mut BooleanExpression) -> Self {
        ConstrainedExpression { expr }
    }

    /// Push a nested frame, see [`BooleanExpression::constrain`].
    ///
    /// # Errors
    ///
    /// Same as [`BooleanExpression::constrain`].
    pub fn constrain<I, S, V>(&mut self, bindings: I) -> Result<ConstrainedExpression<'_>>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: BooleanValue,
    {
        self.expr.constrain(bindings)
    }
}

impl Deref for ConstrainedExpression<'_> {
    type Target = BooleanExpression;

    fn deref(&self) -> &BooleanExpression {
        self.expr
    }
}

impl Drop for ConstrainedExpression<'_> {
    fn drop(&mut self) {
        self.expr.pop_constraints();
    }
}
