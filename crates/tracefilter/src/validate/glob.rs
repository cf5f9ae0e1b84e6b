//! Glob pattern validation.
//!
//! Supported syntax: literal characters, `*` for an arbitrary-length
//! match, and backslash escapes for a literal `*` or `\`. Everything
//! else is rejected before the pattern reaches normalization.
//!
//! In practice the lexer already rejects foreign escape sequences, so
//! the dangling-backslash and bad-escape checks here guard the public
//! validation entry point against patterns built programmatically.

use crate::ast::{Expr, Literal};
use crate::error::CompileError;

pub fn check(expr: &Expr) -> Result<(), CompileError> {
    match expr {
        Expr::Literal(Literal::Glob(pattern)) => validate_glob_pattern(pattern),
        Expr::Literal(_) | Expr::Field(_) => Ok(()),
        Expr::Unary { operand, .. } => check(operand),
        Expr::Binary { left, right, .. } => {
            check(left)?;
            check(right)
        }
    }
}

/// Validate a single glob pattern.
pub fn validate_glob_pattern(pattern: &str) -> Result<(), CompileError> {
    if pattern.is_empty() {
        return Err(CompileError::GlobSyntax {
            pattern: pattern.to_string(),
            reason: "empty pattern".to_string(),
        });
    }

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some('*') | Some('\\') => {}
            Some(other) => {
                return Err(CompileError::GlobSyntax {
                    pattern: pattern.to_string(),
                    reason: format!("unsupported escape '\\{}'", other),
                })
            }
            None => {
                return Err(CompileError::GlobSyntax {
                    pattern: pattern.to_string(),
                    reason: "dangling backslash".to_string(),
                })
            }
        }
    }
    Ok(())
}
