//! Intermediate representation and lowering.
//!
//! Lowers a validated, normalized expression tree into a flat,
//! stack-oriented instruction sequence referencing a deduplicated
//! constant pool and field table. Short-circuit `&&`/`||` become
//! conditional-skip instructions over instruction counts: the right
//! operand is never evaluated when the left one already decides the
//! result.
//!
//! Field names resolve against the caller's schema here, not at parse
//! time: the field namespace depends on the evaluation domain, and the
//! caller chooses whether unknown names are a hard error or deferred to
//! the runtime evaluator ([`CompileOptions::resolve_fields_statically`]).

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::bytecode::{Constant, FieldCategory, FieldDescriptor};
use crate::error::CompileError;
use crate::CompileOptions;

/// Comparison operator, decoupled from the AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// How a comparison interprets its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareMode {
    /// 64-bit integer comparison.
    Int,
    /// Exact string comparison.
    Str,
    /// Glob pattern match.
    Glob,
}

impl CompareMode {
    fn category(self) -> FieldCategory {
        match self {
            CompareMode::Int => FieldCategory::Integer,
            CompareMode::Str => FieldCategory::String,
            CompareMode::Glob => FieldCategory::Glob,
        }
    }
}

/// A stack-machine IR instruction.
///
/// Indices are `usize` here; the generator narrows them to the wire
/// format's 16-bit operands and reports overflow as a capacity error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    /// Push constant pool entry.
    PushConst(usize),
    /// Push the runtime value of a field table entry.
    PushField(usize),
    /// Pop two operands, push the comparison result.
    Compare {
        /// The comparison operator
        op: CompareOp,
        /// Operand interpretation
        mode: CompareMode,
    },
    /// Pop a boolean, push its negation.
    Not,
    /// Skip the next n instructions when the top of stack is false
    /// (leaving it in place), otherwise pop it.
    SkipIfFalse(usize),
    /// Skip the next n instructions when the top of stack is true
    /// (leaving it in place), otherwise pop it.
    SkipIfTrue(usize),
}

/// Lowered program: instructions plus the tables they index.
///
/// Invariant: every operand index references an existing pool/table
/// entry; entries appear in first-use order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ir {
    /// Flat instruction sequence.
    pub instrs: Vec<Instr>,
    /// Deduplicated literal values.
    pub constants: Vec<Constant>,
    /// Deduplicated field descriptors.
    pub fields: Vec<FieldDescriptor>,
}

struct Lowering<'o> {
    options: &'o CompileOptions,
    instrs: Vec<Instr>,
    constants: IndexSet<Constant>,
    fields: IndexMap<String, FieldCategory>,
}

/// Lower a validated, normalized expression tree to IR.
pub fn lower(expr: &Expr, options: &CompileOptions) -> Result<Ir, CompileError> {
    let mut lowering = Lowering {
        options,
        instrs: Vec::new(),
        constants: IndexSet::new(),
        fields: IndexMap::new(),
    };
    lowering.lower_boolean(expr)?;
    Ok(Ir {
        instrs: lowering.instrs,
        constants: lowering.constants.into_iter().collect(),
        fields: lowering
            .fields
            .into_iter()
            .map(|(name, category)| FieldDescriptor { name, category })
            .collect(),
    })
}

impl Lowering<'_> {
    fn lower_boolean(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Binary { op, left, right } if !op.is_comparison() => {
                self.lower_boolean(left)?;
                let skip_at = self.instrs.len();
                // Placeholder; patched once the right operand's length
                // is known.
                self.instrs.push(match op {
                    BinaryOp::And => Instr::SkipIfFalse(0),
                    BinaryOp::Or => Instr::SkipIfTrue(0),
                    _ => unreachable!(),
                });
                self.lower_boolean(right)?;
                let count = self.instrs.len() - skip_at - 1;
                self.instrs[skip_at] = match op {
                    BinaryOp::And => Instr::SkipIfFalse(count),
                    BinaryOp::Or => Instr::SkipIfTrue(count),
                    _ => unreachable!(),
                };
                Ok(())
            }
            Expr::Binary { op, left, right } => self.lower_comparison(*op, left, right),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                self.lower_boolean(operand)?;
                self.instrs.push(Instr::Not);
                Ok(())
            }
            // Unreachable on validated trees.
            Expr::Literal(_) | Expr::Field(_) => Err(CompileError::Nesting(
                "bare operand in boolean position".to_string(),
            )),
        }
    }

    fn lower_comparison(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<(), CompileError> {
        let mode = self.infer_mode(left, right)?;
        let op = match op {
            BinaryOp::Eq => CompareOp::Eq,
            BinaryOp::Ne => CompareOp::Ne,
            BinaryOp::Gt => CompareOp::Gt,
            BinaryOp::Ge => CompareOp::Ge,
            BinaryOp::Lt => CompareOp::Lt,
            BinaryOp::Le => CompareOp::Le,
            BinaryOp::And | BinaryOp::Or => {
                return Err(CompileError::Nesting(
                    "logical operator in comparison position".to_string(),
                ))
            }
        };
        self.lower_operand(left, mode)?;
        self.lower_operand(right, mode)?;
        self.instrs.push(Instr::Compare { op, mode });
        Ok(())
    }

    /// Decide the comparison mode from the operands.
    ///
    /// A glob literal forces glob match; a string literal or a
    /// string-category schema field forces exact string comparison;
    /// everything else compares as integers.
    fn infer_mode(&self, left: &Expr, right: &Expr) -> Result<CompareMode, CompileError> {
        let mut mode = CompareMode::Int;
        for operand in [left, right] {
            match operand {
                Expr::Literal(Literal::Glob(_)) => return Ok(CompareMode::Glob),
                Expr::Literal(Literal::Str(_)) => mode = CompareMode::Str,
                Expr::Field(name) => {
                    if let Some(category) = self.options.schema.category(name) {
                        match category {
                            FieldCategory::String | FieldCategory::Glob
                                if mode == CompareMode::Int =>
                            {
                                mode = CompareMode::Str
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(mode)
    }

    fn lower_operand(&mut self, expr: &Expr, mode: CompareMode) -> Result<(), CompileError> {
        match expr {
            Expr::Literal(lit) => {
                let constant = match lit {
                    Literal::Int(v) => Constant::Int(*v),
                    Literal::Str(s) => Constant::Str(s.clone()),
                    Literal::Glob(p) => Constant::Glob(p.clone()),
                };
                let (idx, _) = self.constants.insert_full(constant);
                self.instrs.push(Instr::PushConst(idx));
                Ok(())
            }
            Expr::Field(name) => {
                let category = self.resolve_field(name, mode)?;
                let idx = match self.fields.get_index_of(name) {
                    Some(idx) => {
                        let existing = self.fields[idx];
                        if existing != category {
                            return Err(CompileError::Type(format!(
                                "field '{}' is used with conflicting value categories",
                                name
                            )));
                        }
                        idx
                    }
                    None => self.fields.insert_full(name.clone(), category).0,
                };
                self.instrs.push(Instr::PushField(idx));
                Ok(())
            }
            // Unreachable on validated trees.
            _ => Err(CompileError::Nesting(
                "comparison operand is not a literal or field".to_string(),
            )),
        }
    }

    /// Resolve a field name against the schema and check category
    /// compatibility with the comparison it appears in.
    fn resolve_field(&self, name: &str, mode: CompareMode) -> Result<FieldCategory, CompileError> {
        match self.options.schema.category(name) {
            Some(declared) => {
                let compatible = match declared {
                    FieldCategory::Integer => mode == CompareMode::Int,
                    FieldCategory::String | FieldCategory::Glob => mode != CompareMode::Int,
                };
                if !compatible {
                    return Err(CompileError::Type(format!(
                        "field '{}' holds a {} value and cannot be compared as {}",
                        name,
                        match declared {
                            FieldCategory::Integer => "integer",
                            FieldCategory::String | FieldCategory::Glob => "string",
                        },
                        match mode {
                            CompareMode::Int => "an integer",
                            CompareMode::Str => "a string",
                            CompareMode::Glob => "a glob subject",
                        }
                    )));
                }
                // The use site decides string vs glob for string fields.
                Ok(mode.category())
            }
            None if self.options.resolve_fields_statically => Err(CompileError::UnknownField {
                name: name.to_string(),
            }),
            None => Ok(mode.category()),
        }
    }
}
