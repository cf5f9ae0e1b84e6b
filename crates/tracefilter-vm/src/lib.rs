//! Reference stack evaluator for compiled trace filter bytecode.
//!
//! Decodes a [`tracefilter::Program`] and executes it against an event
//! context. This crate exists to validate the bytecode contract — the
//! production evaluator at the instrumentation site is a separate,
//! privileged implementation that consumes the same wire format.
//!
//! Execution reports the number of instructions actually executed so
//! tests can assert short-circuit behavior, not just the final verdict.

pub mod executor;
mod glob;

pub use executor::{execute, EvalError, EventContext, Execution, FieldValue, Verdict};
pub use glob::glob_match;
