//! Expressions: tokens, the tokenizer and the expression facade.
pub mod bexpr;
pub mod constraints;
pub mod token;
pub mod tokenizer;

pub use crate::expressions::bexpr::{BooleanExpression, IntoExpression};
pub use crate::expressions::constraints::ConstrainedExpression;
pub use crate::expressions::token::Token;
