//! Composition of rewrites into pipelines of repeatable stages.
use std::fmt::{Debug, Display};
use std::ops::Shr;
use std::sync::Arc;

use bon::Builder;

use crate::errors::Error;
use crate::expressions::{BooleanExpression, IntoExpression};
use crate::transformations::bexpr;
use crate::Result;

/// The rewrites of the library, named so that pipelines can refer to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rewrite {
    ApplyDeMorgans,
    ApplyIdempotentLaw,
    ApplyIdentityLaw,
    ApplyInverseLaw,
    CoalesceNegations,
    DistributeAnds,
    DistributeOrs,
    ToCnf,
    ToPrimitives,
}

impl Rewrite {
    pub const ALL: [Rewrite; 9] = [
        Rewrite::ApplyDeMorgans,
        Rewrite::ApplyIdempotentLaw,
        Rewrite::ApplyIdentityLaw,
        Rewrite::ApplyInverseLaw,
        Rewrite::CoalesceNegations,
        Rewrite::DistributeAnds,
        Rewrite::DistributeOrs,
        Rewrite::ToCnf,
        Rewrite::ToPrimitives,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Rewrite::ApplyDeMorgans => "apply_de_morgans",
            Rewrite::ApplyIdempotentLaw => "apply_idempotent_law",
            Rewrite::ApplyIdentityLaw => "apply_identity_law",
            Rewrite::ApplyInverseLaw => "apply_inverse_law",
            Rewrite::CoalesceNegations => "coalesce_negations",
            Rewrite::DistributeAnds => "distribute_ands",
            Rewrite::DistributeOrs => "distribute_ors",
            Rewrite::ToCnf => "to_cnf",
            Rewrite::ToPrimitives => "to_primitives",
        }
    }

    /// # Errors
    ///
    /// Returns a grammar error when `expr` is text that does not parse.
    pub fn apply(self, expr: impl IntoExpression) -> Result<BooleanExpression> {
        match self {
            Rewrite::ApplyDeMorgans => bexpr::apply_de_morgans(expr),
            Rewrite::ApplyIdempotentLaw => bexpr::apply_idempotent_law(expr),
            Rewrite::ApplyIdentityLaw => bexpr::apply_identity_law(expr),
            Rewrite::ApplyInverseLaw => bexpr::apply_inverse_law(expr),
            Rewrite::CoalesceNegations => bexpr::coalesce_negations(expr),
            Rewrite::DistributeAnds => bexpr::distribute_ands(expr),
            Rewrite::DistributeOrs => bexpr::distribute_ors(expr),
            Rewrite::ToCnf => bexpr::to_cnf(expr),
            Rewrite::ToPrimitives => bexpr::to_primitives(expr),
        }
    }
}

impl Display for Rewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How many times a stage runs at most. Every stage also stops as soon as it
/// stops changing the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Repeat {
    Times(usize),
    /// Until the expression stops changing.
    Forever,
}

impl Repeat {
    /// # Errors
    ///
    /// [`Error::InvalidArgumentValue`] when `times` is zero.
    pub fn times(times: usize) -> Result<Repeat> {
        if times == 0 {
            return Err(Error::InvalidArgumentValue(
                "a stage must run at least once".to_owned(),
            ));
        }
        Ok(Repeat::Times(times))
    }

    /// Counts multiply, `Forever` absorbs everything.
    #[must_use]
    pub fn combine(self, other: Repeat) -> Repeat {
        match (self, other) {
            (Repeat::Times(a), Repeat::Times(b)) => Repeat::Times(a.saturating_mul(b)),
            _ => Repeat::Forever,
        }
    }

    fn exhausted(self, applied: usize) -> bool {
        matches!(self, Repeat::Times(times) if applied >= times)
    }
}

impl Display for Repeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Repeat::Times(times) => write!(f, "{times} times"),
            Repeat::Forever => write!(f, "inf times"),
        }
    }
}

/// Repeat the preceding stage `times` times.
///
/// # Errors
///
/// [`Error::InvalidArgumentValue`] when `times` is zero.
pub fn repeat(times: usize) -> Result<Repeat> {
    Repeat::times(times)
}

#[must_use]
pub fn twice() -> Repeat {
    Repeat::Times(2)
}

#[must_use]
pub fn forever() -> Repeat {
    Repeat::Forever
}

pub type CustomTransform = Arc<dyn Fn(&BooleanExpression) -> Result<BooleanExpression> + Send + Sync>;

/// What a stage does: one of the library rewrites, a named function, or a
/// whole nested pipeline that repeats as a unit.
#[derive(Clone)]
pub enum Transform {
    Rewrite(Rewrite),
    Custom { name: String, func: CustomTransform },
    Composed(ComposedTransformation),
}

impl Transform {
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&BooleanExpression) -> Result<BooleanExpression> + Send + Sync + 'static,
    {
        Transform::Custom {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    fn apply_once(&self, expr: &BooleanExpression) -> Result<BooleanExpression> {
        match self {
            Transform::Rewrite(rewrite) => rewrite.apply(expr),
            Transform::Custom { func, .. } => func(expr),
            Transform::Composed(composed) => composed.apply(expr),
        }
    }
}

impl Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transform::Rewrite(rewrite) => write!(f, "{rewrite}"),
            Transform::Custom { name, .. } => write!(f, "{name}"),
            Transform::Composed(composed) => write!(f, "({composed})"),
        }
    }
}

impl From<Rewrite> for Transform {
    fn from(rewrite: Rewrite) -> Self {
        Transform::Rewrite(rewrite)
    }
}

impl From<ComposedTransformation> for Transform {
    fn from(composed: ComposedTransformation) -> Self {
        Transform::Composed(composed)
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Transform::Rewrite(a), Transform::Rewrite(b)) => a == b,
            (
                Transform::Custom { name: a, func: f },
                Transform::Custom { name: b, func: g },
            ) => a == b && Arc::ptr_eq(f, g),
            (Transform::Composed(a), Transform::Composed(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transform::Rewrite(rewrite) => f.debug_tuple("Rewrite").field(rewrite).finish(),
            Transform::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish_non_exhaustive(),
            Transform::Composed(composed) => f.debug_tuple("Composed").field(composed).finish(),
        }
    }
}

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Stage {
    #[builder(into)]
    transform: Transform,

    #[builder(default = Repeat::Times(1))]
    repeat: Repeat,
}

impl Stage {
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[must_use]
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// Apply the transform to its own output until the repeat count runs out
    /// or the expression stops changing.
    fn apply(&self, expr: BooleanExpression) -> Result<BooleanExpression> {
        let mut current = expr;
        let mut applied = 0;

        while !self.repeat.exhausted(applied) {
            let next = self.transform.apply_once(&current)?;
            applied += 1;
            if next == current {
                tracing::debug!(stage = %self, applied, "fixpoint reached");
                return Ok(next);
            }
            current = next;
        }

        Ok(current)
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.repeat {
            Repeat::Times(1) => write!(f, "{}", self.transform),
            repeat => write!(f, "{} ({repeat})", self.transform),
        }
    }
}

impl From<Transform> for Stage {
    fn from(transform: Transform) -> Self {
        Stage::builder().transform(transform).build()
    }
}

impl From<Rewrite> for Stage {
    fn from(rewrite: Rewrite) -> Self {
        Stage::builder().transform(rewrite).build()
    }
}

impl From<ComposedTransformation> for Stage {
    fn from(composed: ComposedTransformation) -> Self {
        Stage::builder().transform(composed).build()
    }
}

/// A pipeline of stages applied in order, each to the output of the previous one.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct ComposedTransformation {
    stages: Vec<Stage>,
}

impl ComposedTransformation {
    #[must_use]
    pub fn new(stage: impl Into<Stage>) -> Self {
        ComposedTransformation {
            stages: vec![stage.into()],
        }
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Append a stage.
    #[must_use]
    pub fn then(mut self, stage: impl Into<Stage>) -> Self {
        self.stages.push(stage.into());
        self
    }

    /// Append every stage of `other`. Unlike [`ComposedTransformation::then`]
    /// the stages are spliced in, so a later modifier only reaches the last
    /// of them.
    #[must_use]
    pub fn compose(mut self, other: ComposedTransformation) -> Self {
        self.stages.extend(other.stages);
        self
    }

    /// Multiply the repeat count of the last stage by `repeat`.
    #[must_use]
    pub fn modify(mut self, repeat: Repeat) -> Self {
        if let Some(last) = self.stages.last_mut() {
            last.repeat = last.repeat.combine(repeat);
        }
        self
    }

    /// Run the pipeline on `expr`.
    ///
    /// # Errors
    ///
    /// Returns a grammar error when `expr` is text that does not parse, or
    /// whatever a custom stage reports.
    #[tracing::instrument(skip_all, fields(pipeline = %self))]
    pub fn apply(&self, expr: impl IntoExpression) -> Result<BooleanExpression> {
        self.stages
            .iter()
            .try_fold(expr.into_expression()?, |expr, stage| {
                tracing::debug!(%stage, input = %expr, "running stage");
                stage.apply(expr)
            })
    }
}

impl Display for ComposedTransformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stages: Vec<_> = self.stages.iter().map(ToString::to_string).collect();
        write!(f, "{}", stages.join(" -> "))
    }
}

impl From<Rewrite> for ComposedTransformation {
    fn from(rewrite: Rewrite) -> Self {
        ComposedTransformation::new(rewrite)
    }
}

impl From<Transform> for ComposedTransformation {
    fn from(transform: Transform) -> Self {
        ComposedTransformation::new(transform)
    }
}

impl Shr<ComposedTransformation> for ComposedTransformation {
    type Output = ComposedTransformation;

    fn shr(self, rhs: ComposedTransformation) -> ComposedTransformation {
        self.then(rhs)
    }
}

impl Shr<Rewrite> for ComposedTransformation {
    type Output = ComposedTransformation;

    fn shr(self, rhs: Rewrite) -> ComposedTransformation {
        self.then(rhs)
    }
}

impl Shr<Transform> for ComposedTransformation {
    type Output = ComposedTransformation;

    fn shr(self, rhs: Transform) -> ComposedTransformation {
        self.then(rhs)
    }
}

impl Shr<Repeat> for ComposedTransformation {
    type Output = ComposedTransformation;

    fn shr(self, rhs: Repeat) -> ComposedTransformation {
        self.modify(rhs)
    }
}

impl Shr<Rewrite> for Rewrite {
    type Output = ComposedTransformation;

    fn shr(self, rhs: Rewrite) -> ComposedTransformation {
        ComposedTransformation::new(self).then(rhs)
    }
}

impl Shr<Repeat> for Rewrite {
    type Output = ComposedTransformation;

    fn shr(self, rhs: Repeat) -> ComposedTransformation {
        ComposedTransformation::new(self).modify(rhs)
    }
}

/// Item of a [`compose_all`] sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Transform(Transform),
    /// Modifies the repeat count of the preceding stage.
    Modify(Repeat),
}

impl From<Rewrite> for Step {
    fn from(rewrite: Rewrite) -> Self {
        Step::Transform(rewrite.into())
    }
}

impl From<Transform> for Step {
    fn from(transform: Transform) -> Self {
        Step::Transform(transform)
    }
}

impl From<ComposedTransformation> for Step {
    fn from(composed: ComposedTransformation) -> Self {
        Step::Transform(composed.into())
    }
}

impl From<Repeat> for Step {
    fn from(repeat: Repeat) -> Self {
        Step::Modify(repeat)
    }
}

/// Compose a sequence of transformations and repeat modifiers, where every
/// modifier applies to the transformation before it. A nested composition
/// is a single stage, so a modifier after it repeats the whole pipeline.
///
/// # Errors
///
/// * [`Error::InvalidArgumentValue`] when there are fewer than two steps,
/// * [`Error::InvalidArgumentType`] when the sequence starts with a modifier.
pub fn compose_all<I>(steps: I) -> Result<ComposedTransformation>
where
    I: IntoIterator,
    I::Item: Into<Step>,
{
    let mut steps = steps.into_iter().map(Into::into);
    let first = match steps.next() {
        Some(Step::Transform(first)) => first,
        Some(Step::Modify(..)) => {
            return Err(Error::InvalidArgumentType(
                "a composition cannot begin with a repeat modifier".to_owned(),
            ))
        }
        None => return Err(too_few_steps()),
    };

    let mut composed = ComposedTransformation::new(first);
    let mut count = 1;
    for step in steps {
        count += 1;
        composed = match step {
            Step::Transform(next) => composed.then(next),
            Step::Modify(repeat) => composed.modify(repeat),
        };
    }

    if count < 2 {
        return Err(too_few_steps());
    }
    Ok(composed)
}

fn too_few_steps() -> Error {
    Error::InvalidArgumentValue("a composition needs at least two steps".to_owned())
}
