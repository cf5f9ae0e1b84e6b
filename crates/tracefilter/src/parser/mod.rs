//! Parser for filter expressions.
//!
//! Hand-written recursive descent over the token stream produced by the
//! lexer. Builds the [`Expr`](crate::ast::Expr) tree consumed by the
//! validation passes.

mod error;
mod expr;
mod stream;

pub use error::{ParseError, ParseErrorKind};
pub use stream::TokenStream;

use crate::ast::Expr;
use crate::lexer::{Span, Token};

/// Result of parsing a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFilter {
    /// The input was exactly `*`: no predicate at all. The caller is
    /// expected to skip filter compilation for this event entirely.
    MatchAll,
    /// A boolean predicate expression.
    Expr(Expr),
}

/// Parse a token stream into an expression tree.
///
/// Empty input, unmatched parentheses and trailing tokens are errors.
/// A stream consisting solely of `*` yields [`ParsedFilter::MatchAll`].
pub fn parse(tokens: &[(Token, Span)], end_offset: usize) -> Result<ParsedFilter, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::empty_input());
    }
    if let [(Token::Star, _)] = tokens {
        return Ok(ParsedFilter::MatchAll);
    }

    let mut stream = TokenStream::new(tokens, end_offset);
    let expr = expr::parse_expr(&mut stream)?;
    if !stream.at_end() {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "after end of expression",
            stream.current_offset(),
        ));
    }
    Ok(ParsedFilter::Expr(expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
    use crate::lexer::tokenize;

    fn parse_text(text: &str) -> Result<ParsedFilter, ParseError> {
        let tokens = tokenize(text).unwrap();
        parse(&tokens, text.len())
    }

    fn expr(text: &str) -> Expr {
        match parse_text(text).unwrap() {
            ParsedFilter::Expr(e) => e,
            ParsedFilter::MatchAll => panic!("unexpected match-all"),
        }
    }

    #[test]
    fn parses_simple_comparison() {
        assert_eq!(
            expr("int_loglevel >= 5"),
            Expr::Binary {
                op: BinaryOp::Ge,
                left: Box::new(Expr::Field("int_loglevel".into())),
                right: Box::new(Expr::Literal(Literal::Int(5))),
            }
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a == 1 || b == 2 && c == 3  =>  a == 1 || (b == 2 && c == 3)
        let parsed = expr("a == 1 || b == 2 && c == 3");
        match parsed {
            Expr::Binary {
                op: BinaryOp::Or,
                right,
                ..
            } => match *right {
                Expr::Binary {
                    op: BinaryOp::And, ..
                } => {}
                other => panic!("expected && on the right, got {:?}", other),
            },
            other => panic!("expected || at the root, got {:?}", other),
        }
    }

    #[test]
    fn logical_operators_are_left_associative() {
        let parsed = expr("a == 1 && b == 2 && c == 3");
        match parsed {
            Expr::Binary {
                op: BinaryOp::And,
                left,
                ..
            } => assert!(matches!(
                *left,
                Expr::Binary {
                    op: BinaryOp::And,
                    ..
                }
            )),
            other => panic!("expected && at the root, got {:?}", other),
        }
    }

    #[test]
    fn not_binds_tightest() {
        let parsed = expr("!(a == 1) && b == 2");
        match parsed {
            Expr::Binary {
                op: BinaryOp::And,
                left,
                ..
            } => assert!(matches!(
                *left,
                Expr::Unary {
                    op: UnaryOp::Not,
                    ..
                }
            )),
            other => panic!("expected && at the root, got {:?}", other),
        }
    }

    #[test]
    fn sole_star_is_match_all() {
        assert_eq!(parse_text("*").unwrap(), ParsedFilter::MatchAll);
    }

    #[test]
    fn star_inside_expression_is_rejected() {
        assert!(parse_text("a == * && b == 2").is_err());
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = parse_text("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyInput);
    }

    #[test]
    fn unmatched_paren_is_rejected() {
        let err = parse_text("(a == 1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.offset, 7);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse_text("a == 1 b").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    }

    #[test]
    fn chained_comparison_is_a_parse_error() {
        // Comparisons are non-associative at the grammar level.
        assert!(parse_text("a == 1 == 2").is_err());
    }
}
