use std::fmt::Display;

/// Binding strength of an operator. Variants are ordered from the loosest
/// to the tightest binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Zero,
    Low,
    Medium,
    High,
}

/// Number of operands an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Unary,
    Binary,
}

/// Boolean operators understood by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Not,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
    Implies,
    Iff,
}

/// Every accepted spelling, longest first so that the tokenizer can pick the
/// longest match at a given position (`nand` before `and`, `<->` before `->`).
static SPELLINGS: [(&str, Operator); 30] = [
    ("nand", Operator::Nand),
    ("NAND", Operator::Nand),
    ("xnor", Operator::Xnor),
    ("XNOR", Operator::Xnor),
    ("nxor", Operator::Xnor),
    ("NXOR", Operator::Xnor),
    ("impl", Operator::Implies),
    ("IMPL", Operator::Implies),
    ("not", Operator::Not),
    ("NOT", Operator::Not),
    ("and", Operator::And),
    ("AND", Operator::And),
    ("nor", Operator::Nor),
    ("NOR", Operator::Nor),
    ("xor", Operator::Xor),
    ("XOR", Operator::Xor),
    ("iff", Operator::Iff),
    ("IFF", Operator::Iff),
    ("<->", Operator::Iff),
    ("&&", Operator::And),
    ("/\\", Operator::And),
    ("||", Operator::Or),
    ("\\/", Operator::Or),
    ("or", Operator::Or),
    ("OR", Operator::Or),
    ("->", Operator::Implies),
    ("~", Operator::Not),
    ("!", Operator::Not),
    ("&", Operator::And),
    ("|", Operator::Or),
];

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Not,
        Operator::And,
        Operator::Nand,
        Operator::Or,
        Operator::Nor,
        Operator::Xor,
        Operator::Xnor,
        Operator::Implies,
        Operator::Iff,
    ];

    #[must_use]
    pub fn precedence(self) -> Precedence {
        match self {
            Operator::Not => Precedence::High,
            Operator::Implies | Operator::Xor | Operator::Xnor | Operator::Iff => {
                Precedence::Medium
            }
            Operator::And | Operator::Nand => Precedence::Low,
            Operator::Or | Operator::Nor => Precedence::Zero,
        }
    }

    #[must_use]
    pub fn arity(self) -> Arity {
        if self == Operator::Not {
            Arity::Unary
        } else {
            Arity::Binary
        }
    }

    #[must_use]
    pub fn is_unary(self) -> bool {
        self.arity() == Arity::Unary
    }

    /// Evaluate the operator. `right` is ignored by the unary [`Operator::Not`].
    #[must_use]
    pub fn eval(self, left: bool, right: bool) -> bool {
        match self {
            Operator::Not => !left,
            Operator::And => left && right,
            Operator::Nand => !(left && right),
            Operator::Or => left || right,
            Operator::Nor => !(left || right),
            Operator::Xor => left != right,
            Operator::Xnor | Operator::Iff => left == right,
            Operator::Implies => !left || right,
        }
    }

    /// Canonical symbolic spelling. Operators without a symbol return `None`.
    #[must_use]
    pub fn default_symbol_str(self) -> Option<&'static str> {
        match self {
            Operator::Not => Some("~"),
            Operator::And => Some("/\\"),
            Operator::Or => Some("\\/"),
            Operator::Implies => Some("->"),
            Operator::Iff => Some("<->"),
            Operator::Nand | Operator::Nor | Operator::Xor | Operator::Xnor => None,
        }
    }

    #[must_use]
    pub fn default_plain_english_str(self) -> &'static str {
        match self {
            Operator::Not => "not",
            Operator::And => "and",
            Operator::Nand => "nand",
            Operator::Or => "or",
            Operator::Nor => "nor",
            Operator::Xor => "xor",
            Operator::Xnor => "xnor",
            Operator::Implies => "impl",
            Operator::Iff => "iff",
        }
    }

    /// Canonical spelling in the requested style, falling back to plain
    /// English when the operator has no symbol.
    #[must_use]
    pub fn canonical_str(self, symbolic: bool) -> &'static str {
        if symbolic {
            if let Some(symbol) = self.default_symbol_str() {
                return symbol;
            }
        }
        self.default_plain_english_str()
    }

    /// All accepted spellings of this operator.
    pub fn spellings(self) -> impl Iterator<Item = &'static str> {
        SPELLINGS
            .iter()
            .filter(move |(_, operator)| *operator == self)
            .map(|(spelling, _)| *spelling)
    }

    /// Resolve a spelling to its operator, returning the `'static` copy of the spelling.
    #[must_use]
    pub fn lookup(spelling: &str) -> Option<(Operator, &'static str)> {
        SPELLINGS
            .iter()
            .find(|(candidate, _)| *candidate == spelling)
            .map(|(candidate, operator)| (*operator, *candidate))
    }

    /// The longest spelling `input` starts with.
    #[must_use]
    pub(crate) fn longest_prefix(input: &str) -> Option<(Operator, &'static str)> {
        SPELLINGS
            .iter()
            .find(|(spelling, _)| input.starts_with(spelling))
            .map(|(spelling, operator)| (*operator, *spelling))
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.default_plain_english_str())
    }
}

/// Whether a spelling is made of symbols (`&&`, `->`) rather than words (`and`).
#[must_use]
pub fn is_symbolic(spelling: &str) -> bool {
    spelling
        .chars()
        .next()
        .is_some_and(|first| !first.is_alphabetic())
}

/// Iterate over all `(spelling, operator)` pairs, longest spelling first.
pub fn spelling_table() -> impl Iterator<Item = (&'static str, Operator)> {
    SPELLINGS.iter().copied()
}
