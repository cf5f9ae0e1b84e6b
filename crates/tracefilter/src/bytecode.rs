//! Bytecode wire contract.
//!
//! The binary format handed across the process boundary to the runtime
//! evaluator. The buffer is self-describing and position-independent:
//! all multi-byte values are little-endian, all references are relative
//! indices, and nothing points back into compiler memory.
//!
//! # Layout (version 1)
//!
//! ```text
//! magic            u16   0x74F1
//! version          u8    1
//! reserved         u8    0
//! instruction count u16
//! constant count    u16
//! field count       u16
//! instructions      count * (opcode u8, operand u16)
//! constant pool     count * (tag u8, i64 | u16 len + utf-8 bytes)
//! field table       count * (u16 len + utf-8 name, category u8)
//! ```
//!
//! Skip operands are instruction counts, not byte offsets, so the
//! evaluator never decodes into the middle of an instruction.

use serde::{Deserialize, Serialize};

/// Wire-format magic number.
pub const MAGIC: u16 = 0x74F1;

/// Wire-format version emitted by this compiler.
pub const VERSION: u8 = 1;

/// Bytecode instruction kind.
///
/// Stack-based: operands are popped from the evaluation stack, results
/// pushed back. Comparison opcodes carry their operand kind so the
/// evaluator needs no type inference of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// Push constant pool entry operand[0].
    PushConst = 0x01,
    /// Push the event-context value of field table entry operand[0].
    PushField = 0x02,

    /// Pop b, pop a, push a == b (integers).
    CmpEq = 0x10,
    /// Pop b, pop a, push a != b (integers).
    CmpNe = 0x11,
    /// Pop b, pop a, push a > b (integers).
    CmpGt = 0x12,
    /// Pop b, pop a, push a >= b (integers).
    CmpGe = 0x13,
    /// Pop b, pop a, push a < b (integers).
    CmpLt = 0x14,
    /// Pop b, pop a, push a <= b (integers).
    CmpLe = 0x15,

    /// Pop b, pop a, push exact string equality.
    StrEq = 0x20,
    /// Pop b, pop a, push exact string inequality.
    StrNe = 0x21,

    /// Pop b, pop a, push glob pattern match.
    GlobEq = 0x28,
    /// Pop b, pop a, push glob pattern mismatch.
    GlobNe = 0x29,

    /// Pop a boolean, push its negation.
    Not = 0x30,

    /// If the top of stack is false, skip the next operand[0]
    /// instructions leaving the value in place; otherwise pop it.
    SkipIfFalse = 0x40,
    /// If the top of stack is true, skip the next operand[0]
    /// instructions leaving the value in place; otherwise pop it.
    SkipIfTrue = 0x41,
}

impl Opcode {
    /// Decode an opcode byte.
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => Opcode::PushConst,
            0x02 => Opcode::PushField,
            0x10 => Opcode::CmpEq,
            0x11 => Opcode::CmpNe,
            0x12 => Opcode::CmpGt,
            0x13 => Opcode::CmpGe,
            0x14 => Opcode::CmpLt,
            0x15 => Opcode::CmpLe,
            0x20 => Opcode::StrEq,
            0x21 => Opcode::StrNe,
            0x28 => Opcode::GlobEq,
            0x29 => Opcode::GlobNe,
            0x30 => Opcode::Not,
            0x40 => Opcode::SkipIfFalse,
            0x41 => Opcode::SkipIfTrue,
            _ => return None,
        })
    }
}

/// Constant pool tags.
pub const TAG_INT: u8 = 0;
pub const TAG_STR: u8 = 1;
pub const TAG_GLOB: u8 = 2;

/// A constant pool entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    /// 64-bit signed integer.
    Int(i64),
    /// Exact-match string.
    Str(String),
    /// Canonical glob pattern (escapes verbatim).
    Glob(String),
}

/// Expected value category of an event-context field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldCategory {
    /// Compared as a 64-bit integer.
    Integer = 0,
    /// Compared as an exact string.
    String = 1,
    /// Matched against a glob pattern.
    Glob = 2,
}

impl FieldCategory {
    /// Decode a category tag byte.
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => FieldCategory::Integer,
            1 => FieldCategory::String,
            2 => FieldCategory::Glob,
            _ => return None,
        })
    }
}

/// A field table entry: runtime field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Event-context field name.
    pub name: String,
    /// Expected value category.
    pub category: FieldCategory,
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Operation to perform.
    pub opcode: Opcode,
    /// Pool/table index or skip count; 0 when unused.
    pub operand: u16,
}

/// A compiled, self-contained filter bytecode buffer.
///
/// Owned by the caller once compilation succeeds; holds no references
/// into the compiler and stays valid after the AST and IR are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBytecode {
    bytes: Vec<u8>,
}

impl FilterBytecode {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The raw wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer is empty (never true for compiled output).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the buffer, yielding the bytes for transport.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Why a bytecode buffer failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("buffer truncated")]
    Truncated,
    #[error("bad magic number {0:#06x}")]
    BadMagic(u16),
    #[error("unsupported bytecode version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown opcode byte {0:#04x}")]
    UnknownOpcode(u8),
    #[error("unknown constant tag {0}")]
    UnknownConstantTag(u8),
    #[error("unknown field category tag {0}")]
    UnknownCategoryTag(u8),
    #[error("string entry is not valid UTF-8")]
    BadUtf8,
    #[error("instruction {at} references {what} index {index} out of range")]
    IndexOutOfRange {
        at: usize,
        what: &'static str,
        index: u16,
    },
    #[error("skip at instruction {at} jumps past the end of the stream")]
    SkipOutOfRange { at: usize },
    #[error("trailing bytes after field table")]
    TrailingBytes,
}

/// Decoded view of a bytecode buffer.
///
/// This is what an independent evaluator reconstructs from the wire
/// bytes; decoding validates every index so execution needs no bounds
/// bookkeeping beyond the stack itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Linear instruction stream.
    pub instructions: Vec<Instruction>,
    /// Deduplicated literal values, first-use order.
    pub constants: Vec<Constant>,
    /// Deduplicated field descriptors, first-use order.
    pub fields: Vec<FieldDescriptor>,
}

struct Reader<'b> {
    bytes: &'b [u8],
    pos: usize,
}

impl<'b> Reader<'b> {
    fn u8(&mut self) -> Result<u8, DecodeError> {
        let b = *self.bytes.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let end = self.pos.checked_add(2).ok_or(DecodeError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        Ok(u16::from_le_bytes([slice[0], slice[1]]))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        let end = self.pos.checked_add(8).ok_or(DecodeError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(slice);
        Ok(i64::from_le_bytes(buf))
    }

    fn utf8(&mut self, len: usize) -> Result<String, DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        String::from_utf8(slice.to_vec()).map_err(|_| DecodeError::BadUtf8)
    }
}

impl Program {
    /// Decode and validate a wire buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader { bytes, pos: 0 };

        let magic = r.u16()?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        let version = r.u8()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let _reserved = r.u8()?;
        let instr_count = r.u16()? as usize;
        let const_count = r.u16()? as usize;
        let field_count = r.u16()? as usize;

        let mut instructions = Vec::with_capacity(instr_count);
        for _ in 0..instr_count {
            let byte = r.u8()?;
            let opcode = Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode(byte))?;
            let operand = r.u16()?;
            instructions.push(Instruction { opcode, operand });
        }

        let mut constants = Vec::with_capacity(const_count);
        for _ in 0..const_count {
            let tag = r.u8()?;
            let constant = match tag {
                TAG_INT => Constant::Int(r.i64()?),
                TAG_STR => {
                    let len = r.u16()? as usize;
                    Constant::Str(r.utf8(len)?)
                }
                TAG_GLOB => {
                    let len = r.u16()? as usize;
                    Constant::Glob(r.utf8(len)?)
                }
                other => return Err(DecodeError::UnknownConstantTag(other)),
            };
            constants.push(constant);
        }

        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let len = r.u16()? as usize;
            let name = r.utf8(len)?;
            let tag = r.u8()?;
            let category =
                FieldCategory::from_u8(tag).ok_or(DecodeError::UnknownCategoryTag(tag))?;
            fields.push(FieldDescriptor { name, category });
        }

        if r.pos != bytes.len() {
            return Err(DecodeError::TrailingBytes);
        }

        let program = Program {
            instructions,
            constants,
            fields,
        };
        program.validate_indices()?;
        Ok(program)
    }

    /// No instruction may reference a missing pool/table entry or skip
    /// past the end of the stream.
    fn validate_indices(&self) -> Result<(), DecodeError> {
        for (at, instr) in self.instructions.iter().enumerate() {
            match instr.opcode {
                Opcode::PushConst => {
                    if instr.operand as usize >= self.constants.len() {
                        return Err(DecodeError::IndexOutOfRange {
                            at,
                            what: "constant",
                            index: instr.operand,
                        });
                    }
                }
                Opcode::PushField => {
                    if instr.operand as usize >= self.fields.len() {
                        return Err(DecodeError::IndexOutOfRange {
                            at,
                            what: "field",
                            index: instr.operand,
                        });
                    }
                }
                Opcode::SkipIfFalse | Opcode::SkipIfTrue => {
                    if at + 1 + instr.operand as usize > self.instructions.len() {
                        return Err(DecodeError::SkipOutOfRange { at });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        let bytes = [0x00u8, 0x00, 1, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            Program::decode(&bytes),
            Err(DecodeError::BadMagic(0))
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC.to_le_bytes());
        bytes.push(99);
        bytes.push(0);
        bytes.extend_from_slice(&[0u8; 6]);
        assert!(matches!(
            Program::decode(&bytes),
            Err(DecodeError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let bytes = MAGIC.to_le_bytes();
        assert!(matches!(
            Program::decode(&bytes),
            Err(DecodeError::Truncated)
        ));
    }

    #[test]
    fn rejects_dangling_constant_index() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC.to_le_bytes());
        bytes.push(VERSION);
        bytes.push(0);
        bytes.extend_from_slice(&1u16.to_le_bytes()); // one instruction
        bytes.extend_from_slice(&0u16.to_le_bytes()); // empty pool
        bytes.extend_from_slice(&0u16.to_le_bytes()); // empty table
        bytes.push(Opcode::PushConst as u8);
        bytes.extend_from_slice(&0u16.to_le_bytes());
        assert!(matches!(
            Program::decode(&bytes),
            Err(DecodeError::IndexOutOfRange { .. })
        ));
    }
}
