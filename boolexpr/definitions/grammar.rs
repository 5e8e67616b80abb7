use crate::definitions::operators::{is_symbolic, spelling_table};

/// Operand tokens with a fixed truth value.
pub const CONSTANT_VALUES: [&str; 2] = ["0", "1"];

/// Words that look like identifiers but cannot name a symbol.
pub const RESERVED_IDENTIFIERS: [&str; 9] = [
    "true", "false", "none", "True", "False", "None", "TRUE", "FALSE", "NONE",
];

/// Whether `c` ends an operand: whitespace, a parenthesis, or the first
/// character of a symbolic operator spelling.
#[must_use]
pub fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || c == '('
        || c == ')'
        || spelling_table()
            .filter(|(spelling, _)| is_symbolic(spelling))
            .any(|(spelling, _)| spelling.starts_with(c))
}

#[must_use]
pub fn is_constant(token: &str) -> bool {
    CONSTANT_VALUES.contains(&token)
}

/// Truth value of a constant token.
#[must_use]
pub fn constant_value(token: &str) -> Option<bool> {
    match token {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

#[must_use]
pub fn constant_str(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Symbols start with a letter or an underscore, continue with letters,
/// digits or underscores, and must not be a reserved word.
#[must_use]
pub fn is_valid_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !RESERVED_IDENTIFIERS.contains(&identifier)
}

/// Values that can be bound to a symbol for evaluation or constraints.
///
/// Integers and strings are accepted as long as they spell `0` or `1`;
/// anything else is rejected when the binding is validated.
pub trait BooleanValue {
    /// The truth value, or `None` when the value is not boolean.
    fn as_bool(&self) -> Option<bool>;

    /// Human-readable rendering used in error messages.
    fn describe(&self) -> String;
}

impl BooleanValue for bool {
    fn as_bool(&self) -> Option<bool> {
        Some(*self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

macro_rules! integer_boolean_value {
    ($($ty:ty),*) => {
        $(
            impl BooleanValue for $ty {
                fn as_bool(&self) -> Option<bool> {
                    match *self {
                        0 => Some(false),
                        1 => Some(true),
                        _ => None,
                    }
                }

                fn describe(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_boolean_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl BooleanValue for &str {
    fn as_bool(&self) -> Option<bool> {
        constant_value(self)
    }

    fn describe(&self) -> String {
        (*self).to_owned()
    }
}

impl BooleanValue for String {
    fn as_bool(&self) -> Option<bool> {
        constant_value(self)
    }

    fn describe(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{is_delimiter, is_valid_identifier, BooleanValue};

    #[test]
    fn delimiters() {
        for c in [' ', '\t', '(', ')', '~', '!', '&', '/', '|', '\\', '-', '<'] {
            assert!(is_delimiter(c), "{c:?} should delimit operands");
        }
        for c in ['A', 'a', '_', '0', '$', '>'] {
            assert!(!is_delimiter(c), "{c:?} should not delimit operands");
        }
    }

    #[test]
    fn identifiers() {
        for valid in ["A", "op1", "_hidden", "snake_case", "Ünïcode"] {
            assert!(is_valid_identifier(valid), "{valid} should be valid");
        }
        for invalid in ["", "1A", "$var", "a^b", "False", "true", "None"] {
            assert!(!is_valid_identifier(invalid), "{invalid} should be invalid");
        }
    }

    #[test]
    fn boolean_values() {
        assert_eq!(true.as_bool(), Some(true));
        assert_eq!(0u8.as_bool(), Some(false));
        assert_eq!(1i64.as_bool(), Some(true));
        assert_eq!(2i32.as_bool(), None);
        assert_eq!("1".as_bool(), Some(true));
        assert_eq!("a string".as_bool(), None);
        assert_eq!("a string".describe(), "a string");
    }
}
