//! Token stream wrapper for the hand-written parser.

use super::ParseError;
use crate::lexer::{Span, Token};

/// Token stream with lookahead and offset tracking.
///
/// Provides consuming, lookahead and source-offset methods for the
/// recursive descent parser.
pub struct TokenStream<'t> {
    tokens: &'t [(Token, Span)],
    pos: usize,
    end_offset: usize,
}

impl<'t> TokenStream<'t> {
    /// Create a new token stream.
    ///
    /// `end_offset` is the source length, reported for errors at end of
    /// input.
    pub fn new(tokens: &'t [(Token, Span)], end_offset: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end_offset,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// Advance to the next token and return the consumed one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches, ignoring payload.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance past it.
    pub fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_offset(),
            ))
        }
    }

    /// Whether the end of the token stream has been reached.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte offset of the current token, or of end of input.
    pub fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.end_offset)
    }
}
