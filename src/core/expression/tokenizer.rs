//! Tokenizer for target yield formulas
//!
//! Converts strings like "plantingsPerBed * 0.5 * harvests" into a sequence of
//! tokens. Only numbers, identifiers, `+ - * /` and parentheses exist in the
//! target language.

use std::iter::Peekable;
use std::str::Chars;

/// A token in a target formula
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal (e.g., 3, 0.25, .5, 1.5e-3)
    Number(f64),
    /// A variable name (e.g., plantingsPerBed)
    Identifier(String),
    /// One of + - * /
    Operator(char),
    OpenParen,
    CloseParen,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tokenize error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Tokenizer for target formulas
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(formula: &'a str) -> Self {
        Self {
            chars: formula.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire formula into a vector of tokens
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            '(' => {
                self.advance();
                Token::OpenParen
            }
            ')' => {
                self.advance();
                Token::CloseParen
            }
            // Minus is always an operator here; the parser handles unary minus
            '+' | '-' | '*' | '/' => {
                self.advance();
                Token::Operator(c)
            }
            c if c.is_ascii_digit() || c == '.' => self.read_number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(),
            c => {
                return Err(TokenizeError::new(
                    format!("Unexpected character: '{}'", c),
                    self.position,
                ));
            }
        };
        Ok(Some(token))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Push consecutive ASCII digits onto `buf`
    fn read_digits(&mut self, buf: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            buf.push(c);
            self.advance();
        }
    }

    /// Read a number (integer, decimal, or scientific notation)
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let mut num_str = String::new();

        self.read_digits(&mut num_str);

        if self.peek() == Some('.') {
            num_str.push('.');
            self.advance();
            self.read_digits(&mut num_str);
        }

        // Exponent part (e.g., 1.5e10, 2E-5)
        if matches!(self.peek(), Some('e' | 'E')) {
            num_str.push('e');
            self.advance();
            if let Some(sign) = self.peek().filter(|c| *c == '+' || *c == '-') {
                num_str.push(sign);
                self.advance();
            }
            self.read_digits(&mut num_str);
        }

        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| TokenizeError::new(format!("Invalid number: {}", num_str), start_pos))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            ident.push(c);
            self.advance();
        }

        Token::Identifier(ident)
    }
}

/// Convenience function to tokenize a formula string
pub fn tokenize(formula: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(formula).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::Number(42.0)]);
        assert_eq!(tokenize("0.25").unwrap(), vec![Token::Number(0.25)]);
        assert_eq!(tokenize(".5").unwrap(), vec![Token::Number(0.5)]);
        assert_eq!(tokenize("1.5e-3").unwrap(), vec![Token::Number(1.5e-3)]);
    }

    #[test]
    fn test_tokenize_target_formula() {
        let tokens = tokenize("(bedFeet / 100) * 12.5 * harvests").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::Identifier("bedFeet".to_string()),
                Token::Operator('/'),
                Token::Number(100.0),
                Token::CloseParen,
                Token::Operator('*'),
                Token::Number(12.5),
                Token::Operator('*'),
                Token::Identifier("harvests".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_minus_is_operator() {
        assert_eq!(
            tokenize("-5").unwrap(),
            vec![Token::Operator('-'), Token::Number(5.0)]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }

    #[test]
    fn test_tokenize_rejects_foreign_syntax() {
        for formula in ["__import__('os')", "a ^ 2", "x = 1", "a[0]", "f(a, b)"] {
            let err = tokenize(formula).unwrap_err();
            assert!(err.message.contains("Unexpected"), "{formula}: {err}");
        }
    }

    #[test]
    fn test_tokenize_invalid_number() {
        assert!(tokenize(".").unwrap_err().message.contains("Invalid number"));
        assert!(tokenize("2e").unwrap_err().message.contains("Invalid number"));
    }
}
