//! Formula tokenizer
//!
//! Converts formula strings like "=B2 * (1 + $A$1)" into a sequence of
//! spanned tokens that the parser turns into an AST.

use crate::types::CellAddress;
use std::iter::Peekable;
use std::str::CharIndices;

/// A token in a formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal (e.g., 123, 45.67, 1.5e10)
    Number(f64),
    /// A double-quoted string literal
    Text(String),
    /// TRUE or FALSE
    Bool(bool),
    /// A single cell reference, absolute markers dropped
    CellRef(CellAddress),
    /// Any other name: a function, a named range or a sheet name
    Identifier(String),
    /// Binary/comparison operators: + - * / ^ = <> >= <= < >
    Operator(String),
    OpenParen,
    CloseParen,
    /// Argument separator
    Comma,
    /// Range operator (A1:B2)
    Colon,
    /// Sheet qualifier (Sheet2!A1)
    Bang,
}

/// A token together with its byte span in the formula body
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
    /// Offending source text
    pub fragment: String,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize, fragment: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position,
            fragment: fragment.into(),
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

/// Strip the conventional leading '=' of a stored formula
pub fn formula_body(formula: &str) -> &str {
    formula.strip_prefix('=').unwrap_or(formula)
}

/// Tokenizer for formula expressions
pub struct Tokenizer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer over a formula body (without the leading '=')
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    /// Tokenize the entire formula into a vector of lexemes
    pub fn tokenize(mut self) -> Result<Vec<Lexeme>, TokenizeError> {
        let mut lexemes = Vec::new();

        while let Some(lexeme) = self.next_lexeme()? {
            lexemes.push(lexeme);
        }

        Ok(lexemes)
    }

    fn next_lexeme(&mut self) -> Result<Option<Lexeme>, TokenizeError> {
        self.skip_whitespace();

        let Some((start, c)) = self.chars.peek().copied() else {
            return Ok(None);
        };

        let token = match c {
            '"' => self.read_string()?,

            '(' => self.single(Token::OpenParen),
            ')' => self.single(Token::CloseParen),
            ',' => self.single(Token::Comma),
            ':' => self.single(Token::Colon),
            '!' => self.single(Token::Bang),

            '+' | '-' | '*' | '/' | '^' | '=' => self.single(Token::Operator(c.to_string())),
            '<' => self.read_less_than_operator(),
            '>' => self.read_greater_than_operator(),

            c if c.is_ascii_digit() || c == '.' => self.read_number()?,

            c if c.is_alphabetic() || c == '_' || c == '$' => self.read_identifier(),

            c => {
                return Err(TokenizeError::new(
                    format!("Unexpected character: '{c}'"),
                    start,
                    c.to_string(),
                ));
            }
        };

        Ok(Some(Lexeme {
            token,
            start,
            end: self.offset(),
        }))
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Read a double-quoted string literal; `""` is an escaped quote
    fn read_string(&mut self) -> Result<Token, TokenizeError> {
        let start = self.offset();
        self.advance();
        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(TokenizeError::new(
                        "Unterminated string literal",
                        start,
                        &self.source[start..],
                    ));
                }
                Some('"') => {
                    if self.peek() == Some('"') {
                        value.push('"');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
            }
        }

        Ok(Token::Text(value))
    }

    /// Read a number (integer, decimal, or scientific notation)
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start = self.offset();

        self.take_digits();
        if self.peek() == Some('.') {
            self.advance();
            self.take_digits();
        }

        // Exponent only when digits follow, so "1E" stays a number + name
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some((_, '+' | '-'))) {
                lookahead.next();
            }
            if lookahead.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                self.chars = lookahead;
                self.take_digits();
            }
        }

        let text = &self.source[start..self.offset()];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| TokenizeError::new(format!("Invalid number: {text}"), start, text))
    }

    fn take_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Read a name and classify it as a cell reference, boolean or identifier
    fn read_identifier(&mut self) -> Token {
        let start = self.offset();

        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$')
        {
            self.advance();
        }

        let text = &self.source[start..self.offset()];
        if text.eq_ignore_ascii_case("TRUE") {
            Token::Bool(true)
        } else if text.eq_ignore_ascii_case("FALSE") {
            Token::Bool(false)
        } else if let Some(address) = CellAddress::parse(text) {
            Token::CellRef(address)
        } else {
            Token::Identifier(text.to_string())
        }
    }

    /// Read operators starting with '<'
    fn read_less_than_operator(&mut self) -> Token {
        self.advance();

        match self.peek() {
            Some('=') => self.single(Token::Operator("<=".to_string())),
            Some('>') => self.single(Token::Operator("<>".to_string())),
            _ => Token::Operator("<".to_string()),
        }
    }

    /// Read operators starting with '>'
    fn read_greater_than_operator(&mut self) -> Token {
        self.advance();

        match self.peek() {
            Some('=') => self.single(Token::Operator(">=".to_string())),
            _ => Token::Operator(">".to_string()),
        }
    }
}

/// Convenience function to tokenize a formula body
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, TokenizeError> {
    Tokenizer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|lexeme| lexeme.token)
            .collect()
    }

    fn op(s: &str) -> Token {
        Token::Operator(s.to_string())
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokens("42"), vec![Token::Number(42.0)]);
        assert_eq!(tokens("3.567"), vec![Token::Number(3.567)]);
        assert_eq!(tokens(".5"), vec![Token::Number(0.5)]);
        assert_eq!(tokens("1.5e10"), vec![Token::Number(1.5e10)]);
        assert_eq!(tokens("2E-5"), vec![Token::Number(2e-5)]);
    }

    #[test]
    fn test_tokenize_string_with_escaped_quotes() {
        assert_eq!(
            tokens("\"say \"\"hi\"\"\""),
            vec![Token::Text("say \"hi\"".to_string())]
        );
    }

    #[test]
    fn test_tokenize_cell_references() {
        assert_eq!(
            tokens("A1 + $B$2 + c$3"),
            vec![
                Token::CellRef(CellAddress::new(1, 1)),
                op("+"),
                Token::CellRef(CellAddress::new(2, 2)),
                op("+"),
                Token::CellRef(CellAddress::new(3, 3)),
            ]
        );
    }

    #[test]
    fn test_tokenize_booleans() {
        assert_eq!(
            tokens("TRUE = false"),
            vec![Token::Bool(true), op("="), Token::Bool(false)]
        );
    }

    #[test]
    fn test_tokenize_identifiers_that_are_not_cells() {
        assert_eq!(
            tokens("SUM tax_rate ABCD1"),
            vec![
                Token::Identifier("SUM".to_string()),
                Token::Identifier("tax_rate".to_string()),
                Token::Identifier("ABCD1".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparison_operators() {
        assert_eq!(
            tokens("< > <= >= <> ="),
            vec![op("<"), op(">"), op("<="), op(">="), op("<>"), op("=")]
        );
    }

    #[test]
    fn test_tokenize_out_of_scope_punctuation() {
        assert_eq!(
            tokens("Sheet2!A1:B2,"),
            vec![
                Token::Identifier("Sheet2".to_string()),
                Token::Bang,
                Token::CellRef(CellAddress::new(1, 1)),
                Token::Colon,
                Token::CellRef(CellAddress::new(2, 2)),
                Token::Comma,
            ]
        );
    }

    #[test]
    fn test_tokenize_records_spans() {
        let lexemes = tokenize("A1 * 20").unwrap();
        assert_eq!((lexemes[0].start, lexemes[0].end), (0, 2));
        assert_eq!((lexemes[1].start, lexemes[1].end), (3, 4));
        assert_eq!((lexemes[2].start, lexemes[2].end), (5, 7));
    }

    #[test]
    fn test_formula_body_strips_equals() {
        assert_eq!(formula_body("=A1+1"), "A1+1");
        assert_eq!(formula_body("A1+1"), "A1+1");
    }

    #[test]
    fn test_tokenize_empty_and_whitespace() {
        assert!(tokens("").is_empty());
        assert!(tokens("   ").is_empty());
    }

    #[test]
    fn test_tokenize_error_unterminated_string() {
        let err = tokenize("\"hello").unwrap_err();
        assert!(err.message.contains("Unterminated"));
        assert_eq!(err.fragment, "\"hello");
    }

    #[test]
    fn test_tokenize_error_unexpected_char() {
        let err = tokenize("A1 & B1").unwrap_err();
        assert!(err.message.contains("Unexpected"));
        assert_eq!(err.fragment, "&");
        assert_eq!(err.position, 3);
    }
}
