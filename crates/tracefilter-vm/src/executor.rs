//! Bytecode executor.
//!
//! Stack machine over a decoded [`Program`]. Values are popped from and
//! pushed onto an explicit operand stack; skips move the program
//! counter forward by whole instructions.
//!
//! Missing or mistyped event fields make the enclosing comparison
//! false rather than raising an error: an event whose context cannot
//! satisfy the predicate is simply not recorded. Structural problems
//! (an ill-typed stack) are reported as [`EvalError`] — they indicate a
//! buffer this compiler did not produce.

use crate::glob::glob_match;
use tracefilter::bytecode::{Constant, Instruction, Opcode, Program};

/// A runtime event-context field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Integer-valued field (log level, counters).
    Int(i64),
    /// String-valued field (logger name, message).
    Str(String),
}

/// Runtime event context queried during evaluation.
pub trait EventContext {
    /// Look up a field by name; `None` when the event has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// Final evaluation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The event satisfies the predicate and is recorded.
    Record,
    /// The event is discarded.
    Discard,
}

/// Outcome of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// The verdict for this event.
    pub verdict: Verdict,
    /// Number of instructions actually executed (skipped instructions
    /// are not counted).
    pub executed: usize,
}

/// Structural evaluation failure.
///
/// These never occur on buffers produced by the compiler; they guard
/// the evaluator against foreign bytecode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("operand stack underflow at instruction {at}")]
    StackUnderflow { at: usize },
    #[error("instruction {at} expected a boolean on the stack")]
    ExpectedBoolean { at: usize },
    #[error("glob comparison at instruction {at} has no glob operand")]
    MissingPattern { at: usize },
    #[error("evaluation ended with {depth} values on the stack")]
    UnbalancedStack { depth: usize },
}

/// A value on the operand stack.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Bool(bool),
    Int(i64),
    Str(String),
    Glob(String),
    /// Field absent from the event context; poisons comparisons.
    Missing,
}

impl Slot {
    fn from_constant(constant: &Constant) -> Self {
        match constant {
            Constant::Int(v) => Slot::Int(*v),
            Constant::Str(s) => Slot::Str(s.clone()),
            Constant::Glob(p) => Slot::Glob(p.clone()),
        }
    }

    fn from_field(value: Option<FieldValue>) -> Self {
        match value {
            Some(FieldValue::Int(v)) => Slot::Int(v),
            Some(FieldValue::Str(s)) => Slot::Str(s),
            None => Slot::Missing,
        }
    }
}

fn int_compare(opcode: Opcode, a: &Slot, b: &Slot) -> bool {
    let (a, b) = match (a, b) {
        (Slot::Int(a), Slot::Int(b)) => (*a, *b),
        // Missing or mistyped operands never match.
        _ => return false,
    };
    match opcode {
        Opcode::CmpEq => a == b,
        Opcode::CmpNe => a != b,
        Opcode::CmpGt => a > b,
        Opcode::CmpGe => a >= b,
        Opcode::CmpLt => a < b,
        Opcode::CmpLe => a <= b,
        _ => unreachable!("not an integer comparison opcode"),
    }
}

fn str_equal(a: &Slot, b: &Slot) -> bool {
    match (a, b) {
        (Slot::Str(a), Slot::Str(b)) => a == b,
        _ => false,
    }
}

fn glob_compare(at: usize, a: &Slot, b: &Slot) -> Result<bool, EvalError> {
    // The pattern may sit on either side of the comparison.
    let (pattern, subject) = match (a, b) {
        (subject, Slot::Glob(pattern)) => (pattern, subject),
        (Slot::Glob(pattern), subject) => (pattern, subject),
        _ => return Err(EvalError::MissingPattern { at }),
    };
    Ok(match subject {
        Slot::Str(s) => glob_match(pattern, s),
        // A glob pattern against a second pattern compares the raw text.
        Slot::Glob(p) => p == pattern,
        _ => false,
    })
}

/// Execute a decoded program against an event context.
pub fn execute(program: &Program, ctx: &dyn EventContext) -> Result<Execution, EvalError> {
    let mut stack: Vec<Slot> = Vec::with_capacity(8);
    let mut pc = 0usize;
    let mut executed = 0usize;

    while pc < program.instructions.len() {
        let Instruction { opcode, operand } = program.instructions[pc];
        executed += 1;

        match opcode {
            Opcode::PushConst => {
                // Decode validated the index.
                stack.push(Slot::from_constant(&program.constants[operand as usize]));
            }
            Opcode::PushField => {
                let descriptor = &program.fields[operand as usize];
                stack.push(Slot::from_field(ctx.field(&descriptor.name)));
            }
            Opcode::CmpEq
            | Opcode::CmpNe
            | Opcode::CmpGt
            | Opcode::CmpGe
            | Opcode::CmpLt
            | Opcode::CmpLe => {
                let b = stack.pop().ok_or(EvalError::StackUnderflow { at: pc })?;
                let a = stack.pop().ok_or(EvalError::StackUnderflow { at: pc })?;
                stack.push(Slot::Bool(int_compare(opcode, &a, &b)));
            }
            Opcode::StrEq | Opcode::StrNe => {
                let b = stack.pop().ok_or(EvalError::StackUnderflow { at: pc })?;
                let a = stack.pop().ok_or(EvalError::StackUnderflow { at: pc })?;
                let equal = str_equal(&a, &b);
                stack.push(Slot::Bool(if opcode == Opcode::StrEq {
                    equal
                } else {
                    !equal
                }));
            }
            Opcode::GlobEq | Opcode::GlobNe => {
                let b = stack.pop().ok_or(EvalError::StackUnderflow { at: pc })?;
                let a = stack.pop().ok_or(EvalError::StackUnderflow { at: pc })?;
                let matched = glob_compare(pc, &a, &b)?;
                stack.push(Slot::Bool(if opcode == Opcode::GlobEq {
                    matched
                } else {
                    !matched
                }));
            }
            Opcode::Not => {
                let value = stack.pop().ok_or(EvalError::StackUnderflow { at: pc })?;
                match value {
                    Slot::Bool(b) => stack.push(Slot::Bool(!b)),
                    _ => return Err(EvalError::ExpectedBoolean { at: pc }),
                }
            }
            Opcode::SkipIfFalse | Opcode::SkipIfTrue => {
                let top = match stack.last() {
                    Some(Slot::Bool(b)) => *b,
                    Some(_) => return Err(EvalError::ExpectedBoolean { at: pc }),
                    None => return Err(EvalError::StackUnderflow { at: pc }),
                };
                let take = if opcode == Opcode::SkipIfFalse {
                    !top
                } else {
                    top
                };
                if take {
                    // The deciding value stays on the stack as the
                    // result of the whole logical expression.
                    pc += operand as usize;
                } else {
                    stack.pop();
                }
            }
        }
        pc += 1;
    }

    match stack.as_slice() {
        [Slot::Bool(result)] => Ok(Execution {
            verdict: if *result {
                Verdict::Record
            } else {
                Verdict::Discard
            },
            executed,
        }),
        other => Err(EvalError::UnbalancedStack { depth: other.len() }),
    }
}
