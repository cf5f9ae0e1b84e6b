//! Parse error types.

use crate::lexer::Token;
use std::fmt;

/// Parse error with source offset and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Byte offset into the source text where the error occurred
    pub offset: usize,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token (found X, expected Y)
    UnexpectedToken,
    /// Unexpected end of input
    UnexpectedEof,
    /// Empty filter expression
    EmptyInput,
}

impl ParseError {
    /// Create an "expected token" error.
    pub fn expected_token(expected: &Token, found: Option<&Token>, offset: usize) -> Self {
        let (kind, message) = match found {
            Some(token) => (
                ParseErrorKind::UnexpectedToken,
                format!("expected {}, found {}", expected, token),
            ),
            None => (
                ParseErrorKind::UnexpectedEof,
                format!("expected {}, found end of input", expected),
            ),
        };
        Self {
            kind,
            offset,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token>, context: &str, offset: usize) -> Self {
        let (kind, message) = match found {
            Some(token) => (
                ParseErrorKind::UnexpectedToken,
                format!("unexpected {} {}", token, context),
            ),
            None => (
                ParseErrorKind::UnexpectedEof,
                format!("unexpected end of input {}", context),
            ),
        };
        Self {
            kind,
            offset,
            message,
        }
    }

    /// Create an "empty input" error.
    pub fn empty_input() -> Self {
        Self {
            kind: ParseErrorKind::EmptyInput,
            offset: 0,
            message: "empty filter expression".to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for ParseError {}
