//! Expression-level rewrites and their composition into pipelines.
pub mod bexpr;
pub mod compose;

pub use crate::transformations::bexpr::{
    apply_de_morgans, apply_idempotent_law, apply_identity_law, apply_inverse_law,
    coalesce_negations, distribute_ands, distribute_ors, to_cnf, to_primitives,
};
pub use crate::transformations::compose::{
    compose_all, forever, repeat, twice, ComposedTransformation, Repeat, Rewrite, Stage, Step,
    Transform,
};
