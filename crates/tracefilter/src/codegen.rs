//! Bytecode generation.
//!
//! Serializes the lowered IR into the wire format described in
//! [`bytecode`](crate::bytecode). Encoding is deterministic: the same
//! IR always produces byte-identical output, and all multi-byte values
//! are little-endian regardless of host.

use crate::bytecode::{
    Constant, FilterBytecode, Opcode, MAGIC, TAG_GLOB, TAG_INT, TAG_STR, VERSION,
};
use crate::error::CompileError;
use crate::ir::{CompareMode, CompareOp, Instr, Ir};

const LIMIT: usize = u16::MAX as usize;

fn narrow(value: usize, what: &'static str) -> Result<u16, CompileError> {
    u16::try_from(value).map_err(|_| CompileError::capacity(what, value))
}

fn compare_opcode(op: CompareOp, mode: CompareMode) -> Result<Opcode, CompileError> {
    let opcode = match (mode, op) {
        (CompareMode::Int, CompareOp::Eq) => Opcode::CmpEq,
        (CompareMode::Int, CompareOp::Ne) => Opcode::CmpNe,
        (CompareMode::Int, CompareOp::Gt) => Opcode::CmpGt,
        (CompareMode::Int, CompareOp::Ge) => Opcode::CmpGe,
        (CompareMode::Int, CompareOp::Lt) => Opcode::CmpLt,
        (CompareMode::Int, CompareOp::Le) => Opcode::CmpLe,
        (CompareMode::Str, CompareOp::Eq) => Opcode::StrEq,
        (CompareMode::Str, CompareOp::Ne) => Opcode::StrNe,
        (CompareMode::Glob, CompareOp::Eq) => Opcode::GlobEq,
        (CompareMode::Glob, CompareOp::Ne) => Opcode::GlobNe,
        // Ordering on strings is rejected by validation before lowering.
        (CompareMode::Str | CompareMode::Glob, _) => {
            return Err(CompileError::Type(
                "ordering comparison reached code generation with string operands".to_string(),
            ))
        }
    };
    Ok(opcode)
}

/// Generate the final bytecode buffer from lowered IR.
pub fn generate(ir: &Ir) -> Result<FilterBytecode, CompileError> {
    if ir.instrs.len() > LIMIT {
        return Err(CompileError::capacity("instruction count", ir.instrs.len()));
    }
    if ir.constants.len() > LIMIT {
        return Err(CompileError::capacity(
            "constant pool size",
            ir.constants.len(),
        ));
    }
    if ir.fields.len() > LIMIT {
        return Err(CompileError::capacity("field table size", ir.fields.len()));
    }

    let mut bytes = Vec::with_capacity(16 + ir.instrs.len() * 3);
    bytes.extend_from_slice(&MAGIC.to_le_bytes());
    bytes.push(VERSION);
    bytes.push(0); // reserved
    bytes.extend_from_slice(&(ir.instrs.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(ir.constants.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(ir.fields.len() as u16).to_le_bytes());

    for instr in &ir.instrs {
        let (opcode, operand) = match *instr {
            Instr::PushConst(idx) => (Opcode::PushConst, narrow(idx, "constant index")?),
            Instr::PushField(idx) => (Opcode::PushField, narrow(idx, "field index")?),
            Instr::Compare { op, mode } => (compare_opcode(op, mode)?, 0),
            Instr::Not => (Opcode::Not, 0),
            Instr::SkipIfFalse(count) => (Opcode::SkipIfFalse, narrow(count, "skip offset")?),
            Instr::SkipIfTrue(count) => (Opcode::SkipIfTrue, narrow(count, "skip offset")?),
        };
        bytes.push(opcode as u8);
        bytes.extend_from_slice(&operand.to_le_bytes());
    }

    for constant in &ir.constants {
        match constant {
            Constant::Int(v) => {
                bytes.push(TAG_INT);
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            Constant::Str(s) => {
                bytes.push(TAG_STR);
                let len = narrow(s.len(), "string constant length")?;
                bytes.extend_from_slice(&len.to_le_bytes());
                bytes.extend_from_slice(s.as_bytes());
            }
            Constant::Glob(p) => {
                bytes.push(TAG_GLOB);
                let len = narrow(p.len(), "glob constant length")?;
                bytes.extend_from_slice(&len.to_le_bytes());
                bytes.extend_from_slice(p.as_bytes());
            }
        }
    }

    for field in &ir.fields {
        let len = narrow(field.name.len(), "field name length")?;
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(field.name.as_bytes());
        bytes.push(field.category as u8);
    }

    Ok(FilterBytecode::from_bytes(bytes))
}
