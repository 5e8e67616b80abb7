use std::fmt::Display;

use crate::definitions::Operator;

/// A classified piece of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// A symbol or one of the constants `0` and `1`.
    Operand(String),
    /// An operator together with the spelling it was written in.
    Operator {
        operator: Operator,
        spelling: &'static str,
    },
    LeftParen,
    RightParen,
}

impl Token {
    #[must_use]
    pub fn operand(name: impl Into<String>) -> Self {
        Token::Operand(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Token::Operand(name) => name,
            Token::Operator { spelling, .. } => spelling,
            Token::LeftParen => "(",
            Token::RightParen => ")",
        }
    }

    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Token::Operator { operator, .. } => Some(*operator),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_operand(&self) -> bool {
        matches!(self, Token::Operand(..))
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
