//! Function body builder: lowers expression trees to instruction bytes.

use wasmling_bytecode::encode::{encode_bytes, encode_vector};
use wasmling_bytecode::leb128::write_unsigned;
use wasmling_bytecode::{Instruction as BC, Opcode};
use wasmling_syntax::ast::*;
use wasmling_syntax::error::{error, Error, Result};

pub(crate) struct FuncBuilder {
    name: String,
    code: Vec<u8>,
    // None when lowering a bare expression: every slot is taken to be f32
    slot_types: Option<Vec<ValType>>,
}

impl FuncBuilder {
    pub(crate) fn new(name: String, slot_types: Option<Vec<ValType>>) -> Self {
        Self { name, code: Vec::new(), slot_types }
    }

    pub(crate) fn for_function(f: &FunctionDef) -> Self {
        let mut slots = f.param_types();
        slots.extend_from_slice(&f.locals);
        Self::new(f.name.clone(), Some(slots))
    }

    pub(crate) fn emit(&mut self, i: BC) {
        i.encode(&mut self.code);
    }

    /// Instruction bytes emitted so far, without locals or terminator.
    pub(crate) fn into_code(self) -> Vec<u8> {
        self.code
    }

    /// Complete body: locals vector, instructions, `end`, behind a byte count.
    pub(crate) fn finish(mut self, locals: &[ValType]) -> Vec<u8> {
        self.emit(BC::End);
        let mut body = encode_locals(locals);
        body.extend_from_slice(&self.code);
        encode_bytes(&body)
    }

    fn slot_type(&self, slot: u32, name: &str) -> Result<ValType> {
        match &self.slot_types {
            None => Ok(ValType::F32),
            Some(types) => types.get(slot as usize).copied().ok_or_else(|| {
                Error::in_function(format!("variable '{}' uses unknown slot {}", name, slot), &self.name)
            }),
        }
    }

    fn expect_f32(&self, ty: ValType, op: Opcode) -> Result<()> {
        if ty == ValType::F32 {
            Ok(())
        } else {
            Err(Error::in_function(format!("{} expects f32 operands, found {}", op.mnemonic(), ty), &self.name))
        }
    }

    /// Post-order lowering: operands first, then the operator consuming them.
    pub(crate) fn emit_expr(&mut self, e: &Expr) -> Result<ValType> {
        match e {
            Expr::Const(value) => {
                self.emit(BC::F32Const(*value));
                Ok(ValType::F32)
            }
            Expr::Local { slot, name } => {
                let ty = self.slot_type(*slot, name)?;
                self.emit(BC::LocalGet(*slot));
                Ok(ty)
            }
            Expr::Unary { op, operand } => {
                let opcode = Opcode::from_unary(*op);
                let ty = self.emit_expr(operand)?;
                self.expect_f32(ty, opcode)?;
                self.emit_operator(opcode)
            }
            Expr::Binary { op, lhs, rhs } => {
                let opcode = Opcode::from_binary(*op);
                let l = self.emit_expr(lhs)?;
                self.expect_f32(l, opcode)?;
                let r = self.emit_expr(rhs)?;
                self.expect_f32(r, opcode)?;
                self.emit_operator(opcode)
            }
            Expr::NAry { op, args } => {
                if !op.is_reducible() {
                    return Err(Error::in_function(
                        format!("'{}' cannot reduce more than two operands", op.symbol()),
                        &self.name,
                    ));
                }
                if args.len() < 2 {
                    return Err(Error::in_function(
                        format!("{}() needs at least two operands, found {}", op.symbol(), args.len()),
                        &self.name,
                    ));
                }
                let opcode = Opcode::from_binary(*op);
                // left fold: a b op c op d op ...
                let first = self.emit_expr(&args[0])?;
                self.expect_f32(first, opcode)?;
                for arg in &args[1..] {
                    let ty = self.emit_expr(arg)?;
                    self.expect_f32(ty, opcode)?;
                    self.emit_operator(opcode)?;
                }
                Ok(ValType::F32)
            }
        }
    }

    fn emit_operator(&mut self, op: Opcode) -> Result<ValType> {
        match BC::from_operator(op) {
            Some(i) => {
                self.emit(i);
                Ok(ValType::F32)
            }
            None => error(format!("{} is not an operator", op.mnemonic())),
        }
    }
}

/// Locals vector with consecutive slots of the same type grouped as
/// `(count, type)` entries. No locals encodes as a single zero byte.
pub(crate) fn encode_locals(locals: &[ValType]) -> Vec<u8> {
    let mut groups: Vec<(u32, ValType)> = Vec::new();
    for &ty in locals {
        match groups.last_mut() {
            Some((count, last)) if *last == ty => *count += 1,
            _ => groups.push((1, ty)),
        }
    }
    let entries: Vec<Vec<u8>> = groups
        .into_iter()
        .map(|(count, ty)| {
            let mut entry = Vec::with_capacity(6);
            write_unsigned(&mut entry, count);
            entry.push(ty.code());
            entry
        })
        .collect();
    encode_vector(&entries)
}
