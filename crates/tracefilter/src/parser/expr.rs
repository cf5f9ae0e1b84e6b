//! Expression parser (precedence climbing).
//!
//! Precedence, highest to lowest: `!` > comparison operators
//! (non-associative) > `&&` (left) > `||` (left). Parenthesized
//! subexpressions reset precedence.
//!
//! Comparison nesting is deliberately not enforced by the grammar; a
//! parenthesized comparison parses fine as a comparison operand and is
//! rejected afterwards by the nesting validator.

use super::{ParseError, TokenStream};
use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::lexer::{QuotedLit, Token};

/// Parse a full expression.
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_or(stream)
}

fn parse_or(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut left = parse_and(stream)?;
    while stream.eat(&Token::OrOr) {
        let right = parse_and(stream)?;
        left = Expr::Binary {
            op: BinaryOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_and(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut left = parse_comparison(stream)?;
    while stream.eat(&Token::AndAnd) {
        let right = parse_comparison(stream)?;
        left = Expr::Binary {
            op: BinaryOp::And,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

/// Non-associative: at most one comparison operator per level.
fn parse_comparison(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let left = parse_unary(stream)?;
    let op = match stream.peek() {
        Some(Token::EqEq) => BinaryOp::Eq,
        Some(Token::BangEq) => BinaryOp::Ne,
        Some(Token::Gt) => BinaryOp::Gt,
        Some(Token::GtEq) => BinaryOp::Ge,
        Some(Token::Lt) => BinaryOp::Lt,
        Some(Token::LtEq) => BinaryOp::Le,
        _ => return Ok(left),
    };
    stream.advance();
    let right = parse_unary(stream)?;
    Ok(Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    if stream.eat(&Token::Bang) {
        let operand = parse_unary(stream)?;
        return Ok(Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        });
    }
    parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let offset = stream.current_offset();
    match stream.peek().cloned() {
        Some(Token::Ident(name)) => {
            stream.advance();
            Ok(Expr::Field(name))
        }
        Some(Token::Int(value)) => {
            stream.advance();
            Ok(Expr::Literal(Literal::Int(value)))
        }
        Some(Token::Quoted(QuotedLit::Str(s))) => {
            stream.advance();
            Ok(Expr::Literal(Literal::Str(s)))
        }
        Some(Token::Quoted(QuotedLit::Glob(p))) => {
            stream.advance();
            Ok(Expr::Literal(Literal::Glob(p)))
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(inner)
        }
        found => Err(ParseError::unexpected_token(
            found.as_ref(),
            "where a literal, field name or '(' was expected",
            offset,
        )),
    }
}
