//! Formula parser
//!
//! Converts a sequence of lexemes into an Abstract Syntax Tree (AST).
//! Uses recursive descent parsing with operator precedence:
//!
//! ```text
//! comparison := additive (cmp additive)*
//! additive   := term (("+" | "-") term)*
//! term       := power (("*" | "/") power)*
//! power      := unary ("^" unary)*
//! unary      := ("-" | "+") unary | primary
//! primary    := number | string | bool | cell | "(" comparison ")"
//! ```
//!
//! Anything outside this grammar (function calls, ranges, cross-sheet
//! references, named references) is rejected with the offending source text.

use super::tokenizer::{formula_body, tokenize, Lexeme, Token};
use crate::types::{CellAddress, CellValue};
use std::fmt;

/// Binary operators, in their spreadsheet spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "^" => Self::Power,
            "=" => Self::Equal,
            "<>" => Self::NotEqual,
            "<" => Self::Less,
            ">" => Self::Greater,
            "<=" => Self::LessEqual,
            ">=" => Self::GreaterEqual,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "^",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::Greater
                | Self::LessEqual
                | Self::GreaterEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

/// Abstract Syntax Tree node for formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A number, string or boolean literal
    Literal(CellValue),
    /// A single cell on the active sheet
    CellRef(CellAddress),
    /// Unary operation: -expr, +expr
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation: left op right
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn number(n: f64) -> Self {
        Expr::Literal(CellValue::Number(n))
    }
}

/// Renders the expression back in spreadsheet notation, fully parenthesized
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(CellValue::Text(s)) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::CellRef(address) => write!(f, "{address}"),
            Expr::Unary { op, operand } => match op {
                UnaryOperator::Negate => write!(f, "-{operand}"),
                UnaryOperator::Plus => write!(f, "+{operand}"),
            },
            Expr::Binary { op, left, right } => write!(f, "({left}{}{right})", op.symbol()),
        }
    }
}

/// Error during parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    /// Offending source text
    pub fragment: String,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize, fragment: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position,
            fragment: fragment.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at position {}: {} ('{}')",
            self.position, self.message, self.fragment
        )
    }
}

impl std::error::Error for ParseError {}

/// Parser for formula lexemes
pub struct Parser<'a> {
    source: &'a str,
    lexemes: Vec<Lexeme>,
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser over lexemes produced from `source`
    pub fn new(source: &'a str, lexemes: Vec<Lexeme>) -> Self {
        Self {
            source,
            lexemes,
            position: 0,
        }
    }

    /// Parse the lexemes into an AST
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.lexemes.is_empty() {
            return Err(ParseError::new("Empty formula", 0, self.source));
        }

        let expr = self.comparison()?;

        if let Some(lexeme) = self.lexemes.get(self.position) {
            let message = match lexeme.token {
                Token::Comma => "argument lists are not supported",
                Token::CloseParen => "unbalanced ')'",
                _ => "unexpected input after expression",
            };
            return Err(ParseError::new(
                message,
                lexeme.start,
                &self.source[lexeme.start..],
            ));
        }

        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.position).map(|lexeme| &lexeme.token)
    }

    fn advance(&mut self) {
        if self.position < self.lexemes.len() {
            self.position += 1;
        }
    }

    /// Source text covering lexemes `from..=to` (clamped to the input)
    fn fragment(&self, from: usize, to: usize) -> &'a str {
        let last = to.min(self.lexemes.len() - 1);
        &self.source[self.lexemes[from].start..self.lexemes[last].end]
    }

    fn error_at(&self, index: usize, message: impl Into<String>, through: usize) -> ParseError {
        ParseError::new(
            message,
            self.lexemes[index].start,
            self.fragment(index, through),
        )
    }

    /// Consume the current token when it is one of the given operators
    fn match_any_operator(&mut self, ops: &[&str]) -> Option<BinaryOperator> {
        if let Some(Token::Operator(s)) = self.peek() {
            if ops.contains(&s.as_str()) {
                let op = BinaryOperator::from_symbol(s);
                self.advance();
                return op;
            }
        }
        None
    }

    /// Left-associative binary level
    fn binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;

        while let Some(op) = self.match_any_operator(ops) {
            let right = next(self)?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["=", "<>", "<", ">", "<=", ">="], Self::additive)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["+", "-"], Self::term)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["*", "/"], Self::power)
    }

    /// Spreadsheets evaluate `^` left to right and after unary minus
    fn power(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["^"], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Operator(s)) if s == "-" => UnaryOperator::Negate,
            Some(Token::Operator(s)) if s == "+" => UnaryOperator::Plus,
            _ => return self.operand(),
        };
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// A primary, rejecting range and sheet qualifiers that follow it
    fn operand(&mut self) -> Result<Expr, ParseError> {
        let start = self.position;
        let expr = self.primary()?;

        match self.peek() {
            Some(Token::Colon) => Err(self.error_at(
                start,
                "range references are not supported",
                self.position + 1,
            )),
            Some(Token::Bang) => Err(self.error_at(
                start,
                "cross-sheet references are not supported",
                self.position + 1,
            )),
            _ => Ok(expr),
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let index = self.position;
        let Some(token) = self.peek().cloned() else {
            return Err(ParseError::new(
                "unexpected end of formula",
                self.source.len(),
                self.source,
            ));
        };

        match token {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::number(n))
            }
            Token::Text(s) => {
                self.advance();
                Ok(Expr::Literal(CellValue::Text(s)))
            }
            Token::Bool(b) => {
                self.advance();
                Ok(Expr::Literal(CellValue::Bool(b)))
            }
            Token::CellRef(address) => {
                self.advance();
                // Names like LOG10 spell a valid address
                if self.peek() == Some(&Token::OpenParen) {
                    return Err(self.error_at(
                        index,
                        "function calls are not supported",
                        index + 1,
                    ));
                }
                Ok(Expr::CellRef(address))
            }
            Token::Identifier(name) => {
                self.advance();
                match self.peek() {
                    Some(Token::OpenParen) => {
                        Err(self.error_at(index, "function calls are not supported", index + 1))
                    }
                    Some(Token::Colon) | Some(Token::Bang) => {
                        // Whole-column ranges (A:A) and sheet names; reported by `operand`
                        Ok(Expr::Literal(CellValue::Text(name)))
                    }
                    _ => Err(self.error_at(index, "named references are not supported", index)),
                }
            }
            Token::OpenParen => {
                self.advance();
                let expr = self.comparison()?;
                if self.peek() != Some(&Token::CloseParen) {
                    return Err(match self.lexemes.get(self.position) {
                        Some(_) => self.error_at(self.position, "expected ')'", self.position),
                        None => self.error_at(index, "unclosed '('", self.lexemes.len()),
                    });
                }
                self.advance();
                Ok(expr)
            }
            Token::Comma => Err(self.error_at(index, "argument lists are not supported", index)),
            Token::Colon | Token::Bang | Token::CloseParen | Token::Operator(_) => {
                Err(self.error_at(index, "unexpected token", index))
            }
        }
    }
}

/// Parse a formula as stored in a cell (with or without the leading '=')
pub fn parse_formula(formula: &str) -> Result<Expr, ParseError> {
    let body = formula_body(formula);
    let lexemes = tokenize(body).map_err(|e| ParseError::new(e.message, e.position, e.fragment))?;
    Parser::new(body, lexemes).parse()
}
