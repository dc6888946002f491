//! Human-readable listings of decoded modules.

use std::fmt;

use wasmling_bytecode::opcode::describe;
use wasmling_bytecode::{Instruction, Opcode};

use crate::decode::{DecodedModule, FuncType, TypeCode};

/// One line per instruction.
///
/// Unlike [`crate::decode::Body::instructions`] this never fails: an
/// unrecognized opcode is shown as `>>0xNN<<` and ends the listing, since the
/// length of its immediates is unknown.
pub fn disassemble(code: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pos = 0;
    while pos < code.len() {
        match Instruction::decode(&code[pos..]) {
            Ok((instr, len)) => {
                lines.push(instr.to_string());
                pos += len;
            }
            Err(_) => {
                let byte = code[pos];
                lines.push(match Opcode::from_byte(byte) {
                    Some(_) => format!("{} <truncated>", describe(byte)),
                    None => describe(byte),
                });
                break;
            }
        }
    }
    lines
}

fn join(codes: &[TypeCode]) -> String {
    codes.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

pub fn display_type(ty: &FuncType) -> String {
    format!("({}) -> {}", join(&ty.params), join(&ty.results))
}

/// Full listing: types, exports, then every function body.
impl fmt::Display for DecodedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.types.iter().enumerate() {
            writeln!(f, "type[{}] {}", i, display_type(ty))?;
        }
        for e in &self.exports {
            writeln!(f, "export \"{}\" = func {}", e.name, e.index)?;
        }
        for (i, body) in self.bodies.iter().enumerate() {
            let name = self.export_name(i as u32).map(|n| format!(" \"{}\"", n)).unwrap_or_default();
            let sig = self.func_type(i as u32).map(display_type).unwrap_or_else(|| "<no type>".to_string());
            writeln!(f, "func[{}]{} {}", i, name, sig)?;
            if !body.locals.is_empty() {
                writeln!(f, "  locals {}", join(&body.locals))?;
            }
            for line in disassemble(&body.code) {
                writeln!(f, "  {}", line)?;
            }
        }
        Ok(())
    }
}

pub fn display_module(m: &DecodedModule) -> String {
    m.to_string()
}
