//! # Boolean expression compiler.
//!
//! Parse, rewrite, normalize and query Boolean expressions written in
//! symbolic (`~A /\ (B -> C)`) or plain-English (`not A and (B impl C)`)
//! notation, or any mix of the two.
//!
//! The compiler currently supports:
//! * tokenization with precise grammar errors (the offending character offset is reported),
//! * operator-precedence parsing into immutable, structurally shared expression trees,
//! * evaluation, clause iteration and normal-form detection (CNF and DNF),
//! * a library of semantics-preserving rewrites and their composition into repeatable pipelines,
//! * satisfiability queries under nested, scoped constraints,
//! * clause interchange in [DIMACS](https://www21.in.tum.de/~lammich/2015_SS_Seminar_SAT/resources/dimacs-cnf.pdf) CNF format.
//!
//! The following snippet parses an expression, converts it to CNF, and
//! enumerates its models while one of its symbols is constrained.
//!
//! ```rust
//! use boolexpr::expressions::BooleanExpression;
//! use boolexpr::transformations::{to_cnf, twice, Rewrite};
//!
//! let mut expr = BooleanExpression::new("A xor (B and C)").unwrap();
//! assert_eq!(expr.symbols(), &["A", "B", "C"]);
//! assert!(expr.evaluate([("A", 1), ("B", 0), ("C", 1)]).unwrap());
//!
//! let cnf = to_cnf(&expr).unwrap();
//! assert!(cnf.is_cnf());
//!
//! // Run De Morgan's law twice, then lower to AND, OR and NOT.
//! let pipeline = Rewrite::ApplyDeMorgans >> twice() >> Rewrite::ToPrimitives;
//! println!("{pipeline}: {}", pipeline.apply("~~(A -> B)").unwrap());
//!
//! let constrained = expr.constrain([("A", false)]).unwrap();
//! for solution in constrained.sat_all().unwrap() {
//!     println!("{solution}");
//! }
//! ```
//!
//! ---
//!
//! Main entry points are:
//!
//! * [`crate::expressions::BooleanExpression::new`] -- parse an expression
//! * [`crate::expressions::BooleanExpression::evaluate`] -- evaluate an expression under bindings
//! * [`crate::expressions::BooleanExpression::iter_clauses`] -- iterate clauses of a CNF or DNF expression
//! * [`crate::expressions::BooleanExpression::constrain`] -- constrain symbols for satisfiability queries
//! * [`crate::expressions::BooleanExpression::sat_one`] -- find one satisfying assignment
//! * [`crate::expressions::BooleanExpression::sat_all`] -- enumerate every satisfying assignment
//!
//! Rewrites live in [`crate::transformations`]:
//!
//! * [`crate::transformations::apply_de_morgans`] -- push negations of ANDs and ORs inwards
//! * [`crate::transformations::apply_identity_law`] -- fold ANDs and ORs against constants
//! * [`crate::transformations::apply_idempotent_law`] -- drop repeated literals from clauses
//! * [`crate::transformations::apply_inverse_law`] -- collapse clauses holding complementary literals
//! * [`crate::transformations::coalesce_negations`] -- collapse runs of negations
//! * [`crate::transformations::distribute_ands`] and [`crate::transformations::distribute_ors`]
//! * [`crate::transformations::to_primitives`] -- lower every operator to AND, OR and NOT
//! * [`crate::transformations::to_cnf`] -- convert to conjunctive normal form
//!
//! and are chained with [`crate::transformations::ComposedTransformation`]
//! or [`crate::transformations::compose_all`].

pub mod definitions;
pub mod errors;
pub mod expressions;
pub mod satisfiability;
pub mod transformations;
pub mod trees;


pub type Result<T> = std::result::Result<T, errors::Error>;
