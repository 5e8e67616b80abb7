//! Errors reported by the expression compiler.
use std::fmt::Display;

use thiserror::Error;

/// Context of a malformed expression: what went wrong, the text that
/// was being tokenized, and the character offset of the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError {
    message: String,
    expr: String,
    position: Option<usize>,
}

impl GrammarError {
    #[must_use]
    pub(crate) fn new(message: impl Into<String>, expr: &str, position: Option<usize>) -> Self {
        GrammarError {
            message: message.into(),
            expr: expr.to_owned(),
            position,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The expression text the error was found in.
    #[must_use]
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Character (not byte) offset of the offending input, if any.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(position) => write!(
                f,
                "{} at position {position} in \"{}\"",
                self.message, self.expr
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("bad parenthesis position: {0}")]
    BadParenPosition(GrammarError),

    #[error("unbalanced parenthesis: {0}")]
    UnbalancedParen(GrammarError),

    #[error("unexpected expression order: {0}")]
    ExpressionOrder(GrammarError),

    #[error("empty expression: {0}")]
    EmptyExpression(GrammarError),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(GrammarError),

    #[error("{} missing from the evaluation bindings", describe_symbols(.0))]
    MissingSymbol(Vec<String>),

    #[error("{} not present in the expression", describe_symbols(.0))]
    ExtraSymbol(Vec<String>),

    #[error("invalid boolean value \"{value}\" bound to symbol \"{symbol}\"")]
    InvalidBooleanValue { symbol: String, value: String },

    #[error("no evaluation variation: {0}")]
    NoEvaluationVariation(String),

    #[error("{} already constrained", describe_symbols(.0))]
    AlreadyConstrainedSymbol(Vec<String>),

    #[error("requires normal form: {0}")]
    RequiresNormalForm(String),

    #[error("invalid argument type: {0}")]
    InvalidArgumentType(String),

    #[error("invalid argument value: {0}")]
    InvalidArgumentValue(String),
}

impl Error {
    /// Grammar context of tokenizer errors, `None` for every other kind.
    #[must_use]
    pub fn grammar(&self) -> Option<&GrammarError> {
        match self {
            Error::BadParenPosition(err)
            | Error::UnbalancedParen(err)
            | Error::ExpressionOrder(err)
            | Error::EmptyExpression(err)
            | Error::InvalidIdentifier(err) => Some(err),
            _ => None,
        }
    }
}

/// Render `["A"]` as `Symbol "A"` and `["A", "B"]` as `Symbols "A", "B"`.
fn describe_symbols(symbols: &[String]) -> String {
    let quoted = symbols
        .iter()
        .map(|symbol| format!("\"{symbol}\""))
        .collect::<Vec<_>>()
        .join(", ");

    if symbols.len() == 1 {
        format!("Symbol {quoted}")
    } else {
        format!("Symbols {quoted}")
    }
}
