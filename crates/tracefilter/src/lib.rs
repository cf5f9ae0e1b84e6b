//! Filter-expression bytecode compiler for the tracing control plane.
//!
//! Operators attach boolean predicates to trace event definitions, e.g.
//! `int_loglevel >= 5 && logger_name == "app.*"`. Because the predicate
//! runs on every candidate event at the instrumentation site, it is
//! compiled ahead of time into a compact, position-independent bytecode
//! that a minimal stack evaluator executes with no allocation and no
//! access to compiler state.
//!
//! # Pipeline
//!
//! text → [`lexer`] → [`parser`] → [`validate`] (ordered passes) →
//! [`normalize`] → [`ir`] lowering → [`codegen`] → [`bytecode::FilterBytecode`]
//!
//! Each stage may reject the input; failure aborts compilation and
//! returns a [`CompileError`] — never a partial buffer. A filter that
//! fails to compile is neither "match everything" nor "match nothing";
//! the caller must surface the error.
//!
//! # Example
//!
//! ```
//! use tracefilter::{compile, CompileOptions, CompiledFilter};
//!
//! let options = CompileOptions::default();
//! match compile("int_loglevel >= 5", &options).unwrap() {
//!     CompiledFilter::Bytecode(buf) => assert!(!buf.is_empty()),
//!     CompiledFilter::MatchAll => unreachable!(),
//! }
//! ```

pub mod agent;
pub mod ast;
pub mod bytecode;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod validate;

pub use bytecode::{FieldCategory, FilterBytecode, Program};
pub use error::CompileError;
pub use parser::ParsedFilter;

use std::collections::HashMap;

/// Known event-context fields and their value categories.
///
/// Empty by default. Whether membership is enforced is controlled by
/// [`CompileOptions::resolve_fields_statically`]; schema entries are
/// used for type checking either way.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: HashMap<String, FieldCategory>,
}

impl FieldSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    pub fn with(mut self, name: impl Into<String>, category: FieldCategory) -> Self {
        self.fields.insert(name.into(), category);
        self
    }

    /// Look up a field's declared category.
    pub fn category(&self, name: &str) -> Option<FieldCategory> {
        self.fields.get(name).copied()
    }
}

/// Compilation options.
///
/// The default is an open field namespace: unresolved names are left to
/// the runtime evaluator, which treats them as "no match". Domains with
/// a known event-context schema (e.g. kernel tracepoint fields) use
/// [`CompileOptions::closed`] to make unknown names a compile error.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Reject field names missing from the schema at lowering time.
    pub resolve_fields_statically: bool,
    /// Known fields and their categories.
    pub schema: FieldSchema,
}

impl CompileOptions {
    /// Open namespace with a schema used for type checking only.
    pub fn open(schema: FieldSchema) -> Self {
        Self {
            resolve_fields_statically: false,
            schema,
        }
    }

    /// Closed namespace: every field reference must be in the schema.
    pub fn closed(schema: FieldSchema) -> Self {
        Self {
            resolve_fields_statically: true,
            schema,
        }
    }
}

/// Result of compiling a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledFilter {
    /// The input was the bare `*` placeholder: no predicate to encode.
    /// The caller records every event occurrence without a filter.
    MatchAll,
    /// A self-contained bytecode buffer, owned by the caller.
    Bytecode(FilterBytecode),
}

/// Compile a filter expression to bytecode.
///
/// Synchronous and side-effect-free: allocates only the transient
/// AST/IR plus the returned buffer, holds no shared state, and may be
/// called concurrently from any number of threads.
pub fn compile(text: &str, options: &CompileOptions) -> Result<CompiledFilter, CompileError> {
    let tokens = lexer::tokenize(text)?;
    let parsed = parser::parse(&tokens, text.len())?;
    let mut expr = match parsed {
        ParsedFilter::MatchAll => {
            tracing::debug!(filter = text, "match-all placeholder, no bytecode emitted");
            return Ok(CompiledFilter::MatchAll);
        }
        ParsedFilter::Expr(expr) => expr,
    };

    validate::validate(&expr)?;
    normalize::normalize(&mut expr);
    let ir = ir::lower(&expr, options)?;
    let buffer = codegen::generate(&ir)?;

    tracing::debug!(
        filter = text,
        instructions = ir.instrs.len(),
        constants = ir.constants.len(),
        fields = ir.fields.len(),
        bytes = buffer.len(),
        "filter compiled"
    );
    Ok(CompiledFilter::Bytecode(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_simple_filter() {
        let compiled = compile("int_loglevel >= 5", &CompileOptions::default()).unwrap();
        assert!(matches!(compiled, CompiledFilter::Bytecode(_)));
    }

    #[test]
    fn star_bypasses_compilation() {
        let compiled = compile("*", &CompileOptions::default()).unwrap();
        assert_eq!(compiled, CompiledFilter::MatchAll);
    }

    #[test]
    fn compilation_is_deterministic() {
        let options = CompileOptions::default();
        let text = "(a == 1 || b == 2) && logger_name == \"app.*\"";
        let first = compile(text, &options).unwrap();
        let second = compile(text, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn errors_carry_no_partial_bytecode() {
        let err = compile("a == ", &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }
}
