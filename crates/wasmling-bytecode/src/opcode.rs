//! The closed instruction set.

use wasmling_syntax::ast::{BinaryOp, UnaryOp, ValType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    End = 0x0B,      // end of function body
    LocalGet = 0x20, // push local slot (1 immediate: uleb slot)
    F32Const = 0x43, // push constant (1 immediate: 4-byte f32)
    F32Neg = 0x8C,
    F32Add = 0x92,
    F32Sub = 0x93,
    F32Mul = 0x94,
    F32Div = 0x95,
    F32Max = 0x97,
}

impl Opcode {
    pub const ALL: [Opcode; 9] = [
        Opcode::End,
        Opcode::LocalGet,
        Opcode::F32Const,
        Opcode::F32Neg,
        Opcode::F32Add,
        Opcode::F32Sub,
        Opcode::F32Mul,
        Opcode::F32Div,
        Opcode::F32Max,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x0B => Some(Opcode::End),
            0x20 => Some(Opcode::LocalGet),
            0x43 => Some(Opcode::F32Const),
            0x8C => Some(Opcode::F32Neg),
            0x92 => Some(Opcode::F32Add),
            0x93 => Some(Opcode::F32Sub),
            0x94 => Some(Opcode::F32Mul),
            0x95 => Some(Opcode::F32Div),
            0x97 => Some(Opcode::F32Max),
            _ => None,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::End => "end",
            Opcode::LocalGet => "local.get",
            Opcode::F32Const => "f32.const",
            Opcode::F32Neg => "f32.neg",
            Opcode::F32Add => "f32.add",
            Opcode::F32Sub => "f32.sub",
            Opcode::F32Mul => "f32.mul",
            Opcode::F32Div => "f32.div",
            Opcode::F32Max => "f32.max",
        }
    }

    /// Short symbol used when rendering expressions.
    pub const fn symbol(self) -> &'static str {
        match self {
            Opcode::End => "end",
            Opcode::LocalGet => "get",
            Opcode::F32Const => "const",
            Opcode::F32Neg => "-",
            Opcode::F32Add => "+",
            Opcode::F32Sub => "-",
            Opcode::F32Mul => "*",
            Opcode::F32Div => "/",
            Opcode::F32Max => "max",
        }
    }

    /// Values popped from the operand stack.
    pub const fn stack_operands(self) -> usize {
        match self {
            Opcode::End | Opcode::LocalGet | Opcode::F32Const => 0,
            Opcode::F32Neg => 1,
            Opcode::F32Add | Opcode::F32Sub | Opcode::F32Mul | Opcode::F32Div | Opcode::F32Max => 2,
        }
    }

    /// Immediate operands following the opcode byte.
    pub const fn immediates(self) -> usize {
        match self {
            Opcode::LocalGet | Opcode::F32Const => 1,
            _ => 0,
        }
    }

    pub const fn from_unary(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Neg => Opcode::F32Neg,
        }
    }

    pub const fn from_binary(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => Opcode::F32Add,
            BinaryOp::Sub => Opcode::F32Sub,
            BinaryOp::Mul => Opcode::F32Mul,
            BinaryOp::Div => Opcode::F32Div,
            BinaryOp::Max => Opcode::F32Max,
        }
    }
}

/// Mnemonic for a raw byte, or a marked placeholder when it is not in the table.
pub fn describe(byte: u8) -> String {
    match Opcode::from_byte(byte) {
        Some(op) => op.mnemonic().to_string(),
        None => unrecognized(byte),
    }
}

/// Name of a value type byte, with the same placeholder for unknown codes.
pub fn describe_valtype(byte: u8) -> String {
    match ValType::from_code(byte) {
        Some(ty) => ty.name().to_string(),
        None => unrecognized(byte),
    }
}

pub fn unrecognized(byte: u8) -> String {
    format!(">>{:#04x}<<", byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_round_trips_through_bytes() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op.code()), Some(op));
        }
    }

    #[test]
    fn byte_values_match_format() {
        assert_eq!(Opcode::End.code(), 0x0B);
        assert_eq!(Opcode::LocalGet.code(), 0x20);
        assert_eq!(Opcode::F32Const.code(), 0x43);
        assert_eq!(Opcode::F32Neg.code(), 0x8C);
        assert_eq!(Opcode::F32Add.code(), 0x92);
        assert_eq!(Opcode::F32Sub.code(), 0x93);
        assert_eq!(Opcode::F32Mul.code(), 0x94);
        assert_eq!(Opcode::F32Div.code(), 0x95);
        assert_eq!(Opcode::F32Max.code(), 0x97);
    }

    #[test]
    fn arity_and_immediates() {
        assert_eq!(Opcode::F32Neg.stack_operands(), 1);
        assert_eq!(Opcode::F32Max.stack_operands(), 2);
        assert_eq!(Opcode::LocalGet.stack_operands(), 0);
        assert_eq!(Opcode::LocalGet.immediates(), 1);
        assert_eq!(Opcode::F32Const.immediates(), 1);
        assert_eq!(Opcode::F32Add.immediates(), 0);
    }

    #[test]
    fn unknown_bytes_are_marked() {
        assert_eq!(Opcode::from_byte(0x96), None);
        assert_eq!(describe(0x92), "f32.add");
        assert_eq!(describe(0x96), ">>0x96<<");
        assert_eq!(describe_valtype(0x7D), "f32");
        assert_eq!(describe_valtype(0x7C), ">>0x7c<<");
    }

    #[test]
    fn ast_operators_map_to_opcodes() {
        assert_eq!(Opcode::from_unary(UnaryOp::Neg), Opcode::F32Neg);
        assert_eq!(Opcode::from_binary(BinaryOp::Max), Opcode::F32Max);
        assert_eq!(Opcode::from_binary(BinaryOp::Div).symbol(), BinaryOp::Div.symbol());
    }
}
