//! Read-only grammar tables: operators, their spellings, delimiters and constants.
pub mod grammar;
pub mod operators;

pub use crate::definitions::grammar::{BooleanValue, CONSTANT_VALUES, RESERVED_IDENTIFIERS};
pub use crate::definitions::operators::{Arity, Operator, Precedence};
