//! Rewrites lifted from trees to expressions. Each function accepts anything
//! implementing [`IntoExpression`] and returns a brand-new expression.
use crate::expressions::{BooleanExpression, IntoExpression};
use crate::trees::{rewrites, NodeRef};
use crate::Result;

fn lift(expr: impl IntoExpression, rewrite: fn(&NodeRef) -> NodeRef) -> Result<BooleanExpression> {
    let expr = expr.into_expression()?;
    Ok(BooleanExpression::from_tree(rewrite(expr.tree())))
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn apply_de_morgans(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::apply_de_morgans)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn apply_identity_law(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::apply_identity_law)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn apply_idempotent_law(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::apply_idempotent_law)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn apply_inverse_law(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::apply_inverse_law)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn coalesce_negations(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::coalesce_negations)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn distribute_ands(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::distribute_ands)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn distribute_ors(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::distribute_ors)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn to_primitives(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::to_primitives)
}

/// # Errors
///
/// Returns a grammar error when `expr` is text that does not parse.
pub fn to_cnf(expr: impl IntoExpression) -> Result<BooleanExpression> {
    lift(expr, rewrites::to_cnf)
}
