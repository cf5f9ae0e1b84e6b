//! String-usage validation.
//!
//! Ordering is undefined for string and glob operands: only `==` and
//! `!=` are allowed when a comparison involves a string or glob
//! literal. Comparing an integer literal to a string literal is also a
//! type error.

use crate::ast::{Expr, Literal};
use crate::error::CompileError;

pub fn check(expr: &Expr) -> Result<(), CompileError> {
    match expr {
        Expr::Binary { op, left, right } if op.is_comparison() => {
            let left_str = is_string_like(left);
            let right_str = is_string_like(right);

            if op.is_ordering() && (left_str || right_str) {
                return Err(CompileError::Type(format!(
                    "ordering operator '{}' is undefined for string operands",
                    op.symbol()
                )));
            }
            if left_str != right_str && is_literal(left) && is_literal(right) {
                return Err(CompileError::Type(format!(
                    "cannot compare an integer literal to a string literal with '{}'",
                    op.symbol()
                )));
            }
            Ok(())
        }
        Expr::Binary { left, right, .. } => {
            check(left)?;
            check(right)
        }
        Expr::Unary { operand, .. } => check(operand),
        Expr::Literal(_) | Expr::Field(_) => Ok(()),
    }
}

fn is_string_like(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Literal(Literal::Str(_)) | Expr::Literal(Literal::Glob(_))
    )
}

fn is_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(_))
}
