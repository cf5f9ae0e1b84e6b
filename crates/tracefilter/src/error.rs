//! Compiler error taxonomy.
//!
//! Every pipeline stage reports failure through [`CompileError`]. All
//! variants are terminal: compilation never returns partial bytecode,
//! and no error is logged or swallowed inside the pipeline itself.
//! Presentation is the caller's responsibility.

use crate::lexer::LexError;
use crate::parser::ParseError;

/// Error produced by any stage of the filter compilation pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// Invalid character, escape or literal in the source text.
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    /// The token stream does not form a valid expression.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A comparison operator was nested inside another comparison, or a
    /// logical operator was applied to a non-boolean operand.
    #[error("nesting error: {0}")]
    Nesting(String),

    /// An operator was applied to operands of an incompatible type,
    /// e.g. an ordering operator on a string.
    #[error("type error: {0}")]
    Type(String),

    /// A glob pattern uses unsupported wildcard syntax.
    #[error("invalid glob pattern \"{pattern}\": {reason}")]
    GlobSyntax {
        /// The offending pattern
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// A field name outside the caller-supplied closed namespace.
    #[error("unknown event field '{name}'")]
    UnknownField {
        /// The unresolved field name
        name: String,
    },

    /// The encoded bytecode would overflow a 16-bit wire-format length.
    #[error("filter too large: {what} ({count}) exceeds the wire-format limit of {limit}")]
    Capacity {
        /// Which quantity overflowed
        what: &'static str,
        /// The actual count
        count: usize,
        /// The wire-format maximum
        limit: usize,
    },
}

impl CompileError {
    pub(crate) fn capacity(what: &'static str, count: usize) -> Self {
        CompileError::Capacity {
            what,
            count,
            limit: u16::MAX as usize,
        }
    }
}
