//! Binary-operator nesting check.
//!
//! Enforces the shape the grammar alone cannot express: comparison
//! operands must be a literal or a field reference (never another
//! comparison, reachable through parentheses), and logical operators
//! combine boolean-valued subexpressions only.

use crate::ast::{BinaryOp, Expr};
use crate::error::CompileError;

/// Validate the operator nesting structure of the whole tree.
///
/// The root itself must be boolean-valued: a bare field or literal is
/// not a predicate.
pub fn check(expr: &Expr) -> Result<(), CompileError> {
    check_boolean(expr)
}

/// A subexpression in boolean position: comparison, NOT or logical.
fn check_boolean(expr: &Expr) -> Result<(), CompileError> {
    match expr {
        Expr::Binary { op, left, right } if op.is_comparison() => {
            check_operand(left, *op)?;
            check_operand(right, *op)
        }
        Expr::Binary { left, right, .. } => {
            check_boolean(left)?;
            check_boolean(right)
        }
        Expr::Unary { operand, .. } => check_boolean(operand),
        Expr::Literal(_) | Expr::Field(_) => Err(CompileError::Nesting(
            "expected a comparison or logical subexpression, found a bare operand".to_string(),
        )),
    }
}

/// A direct operand of a comparison: literal or field only.
fn check_operand(expr: &Expr, parent: BinaryOp) -> Result<(), CompileError> {
    match expr {
        Expr::Literal(_) | Expr::Field(_) => Ok(()),
        Expr::Binary { op, .. } if op.is_comparison() => Err(CompileError::Nesting(format!(
            "comparison '{}' cannot be an operand of comparison '{}'",
            op.symbol(),
            parent.symbol()
        ))),
        Expr::Binary { op, .. } => Err(CompileError::Nesting(format!(
            "logical expression '{}' cannot be an operand of comparison '{}'",
            op.symbol(),
            parent.symbol()
        ))),
        Expr::Unary { .. } => Err(CompileError::Nesting(format!(
            "'!' expression cannot be an operand of comparison '{}'",
            parent.symbol()
        ))),
    }
}
