//! Binary encoding for wasmling modules.
//!
//! This crate holds the leaf pieces of the pipeline: the LEB128 integer
//! codec, the float/string/vector/section primitives, the closed opcode
//! table and the typed instructions built on it. Both the assembler and the
//! decoder depend on it so the two directions agree on every byte.

pub mod encode;
pub mod format;
pub mod instruction;
pub mod leb128;
pub mod opcode;

pub use encode::{decode_f32, encode_f32, encode_string, encode_vector, make_section};
pub use format::{ExportKind, SectionId};
pub use instruction::Instruction;
pub use leb128::{decode_signed, decode_unsigned, encode_signed, encode_unsigned};
pub use opcode::Opcode;
