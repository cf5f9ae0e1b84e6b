//! Semantic validation passes.
//!
//! A fixed, ordered sequence of checks over the parsed tree. Each pass
//! either accepts the tree unchanged or rejects compilation; none of
//! them rewrites anything (rewriting is the normalizer's job, run after
//! validation).
//!
//! Order matters and is part of the compiler's contract: an input that
//! violates several rules always reports the first pass's error.
//!
//! 1. `nesting` — comparison/logical structure
//! 2. `strings` — operator compatibility with string operands
//! 3. `glob` — glob pattern syntax

mod glob;
mod nesting;
mod strings;

pub use glob::validate_glob_pattern;

use crate::ast::Expr;
use crate::error::CompileError;

/// Run all validation passes in order, stopping at the first failure.
pub fn validate(expr: &Expr) -> Result<(), CompileError> {
    nesting::check(expr)?;
    strings::check(expr)?;
    glob::check(expr)?;
    Ok(())
}
