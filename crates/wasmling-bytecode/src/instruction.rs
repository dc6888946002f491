//! Typed instructions: an opcode plus its immediate.

use std::fmt;

use wasmling_syntax::error::{error_at, Error, Result};

use crate::encode::{decode_f32, encode_f32};
use crate::leb128::{decode_unsigned, write_unsigned};
use crate::opcode::Opcode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    End,
    LocalGet(u32),
    F32Const(f32),
    F32Neg,
    F32Add,
    F32Sub,
    F32Mul,
    F32Div,
    F32Max,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::End => Opcode::End,
            Instruction::LocalGet(_) => Opcode::LocalGet,
            Instruction::F32Const(_) => Opcode::F32Const,
            Instruction::F32Neg => Opcode::F32Neg,
            Instruction::F32Add => Opcode::F32Add,
            Instruction::F32Sub => Opcode::F32Sub,
            Instruction::F32Mul => Opcode::F32Mul,
            Instruction::F32Div => Opcode::F32Div,
            Instruction::F32Max => Opcode::F32Max,
        }
    }

    /// Operator instruction for an opcode without immediates.
    pub fn from_operator(op: Opcode) -> Option<Self> {
        Some(match op {
            Opcode::End => Instruction::End,
            Opcode::F32Neg => Instruction::F32Neg,
            Opcode::F32Add => Instruction::F32Add,
            Opcode::F32Sub => Instruction::F32Sub,
            Opcode::F32Mul => Instruction::F32Mul,
            Opcode::F32Div => Instruction::F32Div,
            Opcode::F32Max => Instruction::F32Max,
            Opcode::LocalGet | Opcode::F32Const => return None,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode().code());
        match self {
            Instruction::LocalGet(slot) => write_unsigned(out, *slot),
            Instruction::F32Const(value) => out.extend_from_slice(&encode_f32(*value)),
            _ => {}
        }
    }

    /// Decodes one instruction from the start of `bytes`.
    ///
    /// An opcode outside the table is a hard error. Returns the instruction
    /// and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let Some(&byte) = bytes.first() else {
            return error_at(0, "expected an instruction, found end of input");
        };
        let op = Opcode::from_byte(byte)
            .ok_or_else(|| Error::at(format!("unrecognized opcode {:#04x}", byte), 0))?;
        let rest = &bytes[1..];
        match op {
            Opcode::LocalGet => {
                let (slot, len) = decode_unsigned(rest).map_err(|e| shift(e, 1))?;
                Ok((Instruction::LocalGet(slot), 1 + len))
            }
            Opcode::F32Const => {
                let value = decode_f32(rest).map_err(|e| shift(e, 1))?;
                Ok((Instruction::F32Const(value), 5))
            }
            other => match Instruction::from_operator(other) {
                Some(instr) => Ok((instr, 1)),
                None => error_at(0, format!("opcode {} needs an immediate", other.mnemonic())),
            },
        }
    }
}

/// Moves a relative error offset forward by `by` bytes.
pub(crate) fn shift(mut err: Error, by: usize) -> Error {
    err.offset = Some(err.offset.unwrap_or(0) + by);
    err
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match self {
            Instruction::LocalGet(slot) => write!(f, "{} {}", mnemonic, slot),
            Instruction::F32Const(value) => write!(f, "{} {:?}", mnemonic, value),
            _ => f.write_str(mnemonic),
        }
    }
}
