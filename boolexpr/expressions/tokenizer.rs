//! Tokenizer and grammar validator turning raw text into infix and postfix
//! token sequences.
use rustc_hash::FxHashSet;

use crate::definitions::grammar::{is_constant, is_delimiter, is_valid_identifier};
use crate::definitions::operators::is_symbolic;
use crate::definitions::{Arity, Operator};
use crate::errors::{Error, GrammarError};
use crate::expressions::token::Token;
use crate::Result;

/// Tokens of a validated expression together with its symbols in order of
/// first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrammarState {
    ExpectingOperand,
    ExpectingOperator,
}

struct Tokenizer<'a> {
    raw_expr: &'a str,
    // Byte offset of every character, so that errors report character positions.
    chars: Vec<(usize, char)>,
    state: GrammarState,
    open_parens: usize,
    last_operator: Option<usize>,
    tokens: Vec<Token>,
    symbols: Vec<String>,
    seen_symbols: FxHashSet<String>,
}

/// Split `raw_expr` into tokens, validating the grammar along the way.
///
/// # Errors
///
/// Returns a grammar error carrying the character offset of the offending input:
/// * [`Error::BadParenPosition`] for a parenthesis where none may appear,
/// * [`Error::UnbalancedParen`] for an unmatched parenthesis,
/// * [`Error::ExpressionOrder`] for operators and operands out of sequence,
/// * [`Error::InvalidIdentifier`] for an operand that is neither a constant nor a valid symbol,
/// * [`Error::EmptyExpression`] when there is nothing but whitespace.
pub fn tokenize(raw_expr: &str) -> Result<Tokenized> {
    Tokenizer::new(raw_expr).run()
}

impl<'a> Tokenizer<'a> {
    fn new(raw_expr: &'a str) -> Self {
        Tokenizer {
            raw_expr,
            chars: raw_expr.char_indices().collect(),
            state: GrammarState::ExpectingOperand,
            open_parens: 0,
            last_operator: None,
            tokens: Vec::new(),
            symbols: Vec::new(),
            seen_symbols: FxHashSet::default(),
        }
    }

    fn run(mut self) -> Result<Tokenized> {
        let mut idx = 0;
        while let Some(&(offset, c)) = self.chars.get(idx) {
            idx = if c.is_whitespace() {
                idx + 1
            } else if c == '(' {
                self.left_paren(idx)?;
                idx + 1
            } else if c == ')' {
                self.right_paren(idx)?;
                idx + 1
            } else if let Some(length) = self.operator(idx, offset)? {
                idx + length
            } else {
                self.operand(idx)?
            };
        }

        self.finish()
    }

    fn left_paren(&mut self, idx: usize) -> Result<()> {
        if self.state != GrammarState::ExpectingOperand {
            return Err(Error::BadParenPosition(
                self.context("unexpected parenthesis", Some(idx)),
            ));
        }

        self.open_parens += 1;
        self.tokens.push(Token::LeftParen);
        Ok(())
    }

    fn right_paren(&mut self, idx: usize) -> Result<()> {
        if self.state != GrammarState::ExpectingOperator {
            return Err(Error::BadParenPosition(
                self.context("unexpected parenthesis", Some(idx)),
            ));
        }
        if self.open_parens == 0 {
            return Err(Error::UnbalancedParen(
                self.context("unbalanced parenthesis", Some(idx)),
            ));
        }

        self.open_parens -= 1;
        self.tokens.push(Token::RightParen);
        Ok(())
    }

    /// Try to read an operator at `idx`. Returns the number of characters
    /// consumed, or `None` when the input at `idx` must be an operand.
    fn operator(&mut self, idx: usize, offset: usize) -> Result<Option<usize>> {
        let Some((operator, spelling)) = Operator::longest_prefix(&self.raw_expr[offset..]) else {
            return Ok(None);
        };

        // Spellings are ASCII, so their byte length is their character length.
        let Some(&(_, next)) = self.chars.get(idx + spelling.len()) else {
            return Err(Error::ExpressionOrder(self.context(
                format!("unexpected operator \"{spelling}\""),
                Some(idx),
            )));
        };

        if !is_delimiter(next) && !is_symbolic(spelling) {
            return Ok(None);
        }

        match operator.arity() {
            Arity::Unary => {
                if self.state != GrammarState::ExpectingOperand {
                    return Err(Error::ExpressionOrder(self.context(
                        format!("unexpected unary operator \"{spelling}\""),
                        Some(idx),
                    )));
                }
            }
            Arity::Binary => {
                if self.state != GrammarState::ExpectingOperator {
                    return Err(Error::ExpressionOrder(self.context(
                        format!("unexpected binary operator \"{spelling}\""),
                        Some(idx),
                    )));
                }
                self.state = GrammarState::ExpectingOperand;
            }
        }

        self.last_operator = Some(idx);
        self.tokens.push(Token::Operator { operator, spelling });
        Ok(Some(spelling.len()))
    }

    /// Read an operand starting at `idx` and return the index just past it.
    fn operand(&mut self, idx: usize) -> Result<usize> {
        if self.state != GrammarState::ExpectingOperand {
            return Err(Error::ExpressionOrder(
                self.context("unexpected operand", Some(idx)),
            ));
        }

        let mut end = idx + 1;
        while self
            .chars
            .get(end)
            .is_some_and(|(_, c)| !is_delimiter(*c))
        {
            end += 1;
        }

        let operand: String = self.chars[idx..end].iter().map(|(_, c)| c).collect();
        if !is_constant(&operand) && !is_valid_identifier(&operand) {
            return Err(Error::InvalidIdentifier(self.context(
                format!("invalid operand name \"{operand}\""),
                Some(idx),
            )));
        }

        if !is_constant(&operand) && self.seen_symbols.insert(operand.clone()) {
            self.symbols.push(operand.clone());
        }

        self.tokens.push(Token::Operand(operand));
        self.state = GrammarState::ExpectingOperator;
        Ok(end)
    }

    fn finish(self) -> Result<Tokenized> {
        if self.open_parens > 0 {
            let unmatched = self
                .chars
                .iter()
                .enumerate()
                .filter(|(_, (_, c))| *c == '(')
                .map(|(idx, _)| idx)
                .nth(self.open_parens - 1);
            return Err(Error::UnbalancedParen(
                self.context("unbalanced left parenthesis", unmatched),
            ));
        }

        if self.tokens.is_empty() {
            return Err(Error::EmptyExpression(
                self.context("empty expression is invalid", None),
            ));
        }

        if self.state == GrammarState::ExpectingOperand {
            return Err(Error::ExpressionOrder(
                self.context("expression ends with an operator", self.last_operator),
            ));
        }

        Ok(Tokenized {
            tokens: self.tokens,
            symbols: self.symbols,
        })
    }

    fn context(&self, message: impl Into<String>, position: Option<usize>) -> GrammarError {
        GrammarError::new(message, self.raw_expr, position)
    }
}

/// Reorder validated infix tokens into postfix order with the shunting-yard
/// algorithm. An operator only displaces operators of strictly higher
/// precedence, so chains of equal precedence associate to the right.
#[must_use]
pub fn to_postfix(tokens: &[Token]) -> Vec<Token> {
    let mut postfix = Vec::with_capacity(tokens.len());
    let mut stack: Vec<&Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Operand(..) => postfix.push(token.clone()),
            Token::LeftParen => stack.push(token),
            Token::RightParen => {
                while let Some(top) = stack.pop() {
                    if *top == Token::LeftParen {
                        break;
                    }
                    postfix.push(top.clone());
                }
            }
            Token::Operator { operator, .. } => {
                while let Some(&&Token::Operator { operator: top, .. }) = stack.last() {
                    if top.precedence() <= operator.precedence() {
                        break;
                    }
                    if let Some(popped) = stack.pop() {
                        postfix.push(popped.clone());
                    }
                }
                stack.push(token);
            }
        }
    }

    postfix.extend(
        stack
            .into_iter()
            .rev()
            .filter(|token| **token != Token::LeftParen)
            .cloned(),
    );
    postfix
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{to_postfix, tokenize};
    use crate::errors::{Error, GrammarError};
    use crate::expressions::token::Token;

    fn strs(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    fn assert_fails(expr: &str, variant: fn(GrammarError) -> Error, position: Option<usize>) {
        let err = tokenize(expr).expect_err(expr);
        let message = err.grammar().expect("grammar error").message().to_owned();
        assert_eq!(err, variant(GrammarError::new(message, expr, position)), "{expr}");
    }

    #[test]
    fn simple_expression() {
        let tokenized = tokenize("A or B").unwrap();
        assert_eq!(strs(&tokenized.tokens), vec!["A", "or", "B"]);
        assert_eq!(strs(&to_postfix(&tokenized.tokens)), vec!["A", "B", "or"]);
        assert_eq!(tokenized.symbols, vec!["A", "B"]);
    }

    #[test]
    fn symbols_in_order_of_appearance() {
        let tokenized = tokenize("(op1 and op2) xor (op2 -> op3) nand 0 and op1").unwrap();
        assert_eq!(tokenized.symbols, vec!["op1", "op2", "op3"]);
    }

    #[test]
    fn symbolic_operators_need_no_whitespace() {
        let tokenized = tokenize("~A&&B||!C<->D->E").unwrap();
        assert_eq!(
            strs(&tokenized.tokens),
            vec!["~", "A", "&&", "B", "||", "!", "C", "<->", "D", "->", "E"]
        );
    }

    #[test]
    fn longest_spelling_first() {
        let tokenized = tokenize("A nand B nor C").unwrap();
        assert_eq!(strs(&tokenized.tokens), vec!["A", "nand", "B", "nor", "C"]);

        // Plain English spellings only count when followed by a delimiter.
        let tokenized = tokenize("android or nothing").unwrap();
        assert_eq!(strs(&tokenized.tokens), vec!["android", "or", "nothing"]);
        assert_eq!(tokenized.symbols, vec!["android", "nothing"]);
    }

    #[test]
    fn constants_are_not_symbols() {
        let tokenized = tokenize("A and 1 or 0").unwrap();
        assert_eq!(tokenized.symbols, vec!["A"]);
        assert_eq!(strs(&tokenized.tokens), vec!["A", "and", "1", "or", "0"]);
    }

    #[test]
    fn postfix_precedence() {
        let postfix = |expr: &str| strs(&to_postfix(&tokenize(expr).unwrap().tokens)).join(" ");

        assert_eq!(postfix("A or B and C"), "A B C and or");
        assert_eq!(postfix("A and B or C"), "A B and C or");
        assert_eq!(postfix("not A and B"), "A not B and");
        assert_eq!(postfix("A and not B"), "A B not and");
        assert_eq!(postfix("~~A"), "A ~ ~");
        assert_eq!(postfix("A xor B and C"), "A B xor C and");
        assert_eq!(postfix("(A or B) and C"), "A B or C and");
        assert_eq!(postfix("A nor (B nand C)"), "A B C nand nor");
    }

    #[test]
    fn postfix_equal_precedence_is_right_associative() {
        let postfix = |expr: &str| strs(&to_postfix(&tokenize(expr).unwrap().tokens)).join(" ");

        assert_eq!(postfix("A and B and C"), "A B C and and");
        assert_eq!(postfix("A -> B xor C"), "A B C xor ->");
        assert_eq!(postfix("(A and B) and C"), "A B and C and");
    }

    #[test]
    fn expression_order_errors() {
        assert_fails("&&A && B", Error::ExpressionOrder, Some(0));
        assert_fails("A & (| B)", Error::ExpressionOrder, Some(5));
        assert_fails("(A || B) /\\ \\/", Error::ExpressionOrder, Some(12));
        assert_fails("and and B", Error::ExpressionOrder, Some(0));
        assert_fails("(A or or B)", Error::ExpressionOrder, Some(6));
        assert_fails("((A or B) or C) nand xor", Error::ExpressionOrder, Some(21));
        assert_fails("(A or B) and ", Error::ExpressionOrder, Some(9));
        assert_fails("A or B or not C or not", Error::ExpressionOrder, Some(19));
        assert_fails("A NAND B !", Error::ExpressionOrder, Some(9));
        assert_fails("NOT", Error::ExpressionOrder, Some(0));
        assert_fails("&", Error::ExpressionOrder, Some(0));
        assert_fails("operand operand and operand", Error::ExpressionOrder, Some(8));
        assert_fails(
            "operand1 or (operand2 operand3) and operand4",
            Error::ExpressionOrder,
            Some(22),
        );
        assert_fails("op1 or (op2) and op3 op4", Error::ExpressionOrder, Some(21));
    }

    #[test]
    fn paren_errors() {
        assert_fails("A or (B) ( and C", Error::BadParenPosition, Some(9));
        assert_fails("A or B or ) xor C", Error::BadParenPosition, Some(10));
        assert_fails("()", Error::BadParenPosition, Some(1));

        assert_fails("(A or B))", Error::UnbalancedParen, Some(8));
        assert_fails("(op1 or op2)))", Error::UnbalancedParen, Some(12));
        assert_fails("(A or B) and ((A or C))) or D", Error::UnbalancedParen, Some(23));
        assert_fails("((A or B || C)", Error::UnbalancedParen, Some(0));
        assert_fails("A or (((B or C))", Error::UnbalancedParen, Some(5));
        assert_fails("(((op1 or (op2 and op3)))", Error::UnbalancedParen, Some(0));
        assert_fails("(((A or (((B) or C)))", Error::UnbalancedParen, Some(1));
    }

    #[test]
    fn empty_expressions() {
        for expr in ["", " ", "      ", "\t\n "] {
            assert_fails(expr, Error::EmptyExpression, None);
        }
    }

    #[test]
    fn invalid_identifiers() {
        assert_fails("$var1 and var2", Error::InvalidIdentifier, Some(0));
        assert_fails("var1 and ^var2", Error::InvalidIdentifier, Some(9));
        assert_fails("A xor (B or 1x)", Error::InvalidIdentifier, Some(12));
        assert_fails("op1 xor op2 xor False xor 0", Error::InvalidIdentifier, Some(16));
        assert_fails("true or A", Error::InvalidIdentifier, Some(0));
    }

    #[test]
    fn character_offsets() {
        // Offsets count characters, not bytes.
        assert_fails("Ä or or B", Error::ExpressionOrder, Some(5));
    }
}
