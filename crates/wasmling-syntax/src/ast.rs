//! AST types for wasmling modules: value types, expression nodes, function
//! definitions and the module that owns them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{error_in, Result};

/// Numeric value types, each with a fixed one-byte binary tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValType {
    I32,
    F32,
}

impl ValType {
    /// Binary tag used in type and locals vectors.
    pub const fn code(self) -> u8 {
        match self {
            ValType::I32 => 0x7F,
            ValType::F32 => 0x7D,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x7F => Some(ValType::I32),
            0x7D => Some(ValType::F32),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValType::I32 => "i32",
            ValType::F32 => "f32",
        }
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operators taking one stack operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
        }
    }
}

/// Operators taking two stack operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Max,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Max => "max",
        }
    }

    /// Whether the operator renders between its operands rather than as a call.
    pub const fn is_infix(self) -> bool {
        !matches!(self, BinaryOp::Max)
    }

    /// Whether an n-ary node may fold its children with this operator.
    ///
    /// A left fold only gives the intended result for operators whose
    /// grouping does not matter, so `-` and `/` are excluded.
    pub const fn is_reducible(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Mul | BinaryOp::Max)
    }
}

/// Expression nodes. Every node owns its children; the tree has no sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// f32 literal pushed with the constant opcode.
    Const(f32),
    /// Read of local slot `slot`. `name` must match the parameter at that slot.
    Local { slot: u32, name: String },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    /// Call-like node such as `max(a, b, c)`, lowered as a left fold.
    #[serde(rename = "nary")]
    NAry { op: BinaryOp, args: Vec<Expr> },
}

impl Expr {
    pub fn constant(value: f32) -> Self {
        Expr::Const(value)
    }

    pub fn local(slot: u32, name: impl Into<String>) -> Self {
        Expr::Local { slot, name: name.into() }
    }

    pub fn neg(operand: Expr) -> Self {
        Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand) }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn nary(op: BinaryOp, args: Vec<Expr>) -> Self {
        Expr::NAry { op, args }
    }

    /// Variable references in left-to-right occurrence order.
    ///
    /// Duplicates are kept: `a + a` yields slot 0 twice.
    pub fn locals(&self) -> Vec<(u32, &str)> {
        let mut out = Vec::new();
        self.collect_locals(&mut out);
        out
    }

    fn collect_locals<'a>(&'a self, out: &mut Vec<(u32, &'a str)>) {
        match self {
            Expr::Const(_) => {}
            Expr::Local { slot, name } => out.push((*slot, name.as_str())),
            Expr::Unary { operand, .. } => operand.collect_locals(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_locals(out);
                rhs.collect_locals(out);
            }
            Expr::NAry { args, .. } => {
                for arg in args {
                    arg.collect_locals(out);
                }
            }
        }
    }

    /// Whether rendering this node as an operand needs parentheses.
    fn needs_parens(&self) -> bool {
        match self {
            Expr::Binary { op, .. } | Expr::NAry { op, .. } => op.is_infix(),
            _ => false,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_parens() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{:?}", value),
            Expr::Local { name, .. } => f.write_str(name),
            Expr::Unary { op, operand } => {
                f.write_str(op.symbol())?;
                operand.fmt_operand(f)
            }
            Expr::Binary { op, lhs, rhs } if op.is_infix() => {
                lhs.fmt_operand(f)?;
                write!(f, " {} ", op.symbol())?;
                rhs.fmt_operand(f)
            }
            Expr::Binary { op, lhs, rhs } => write!(f, "{}({}, {})", op.symbol(), lhs, rhs),
            Expr::NAry { op, args } if op.is_infix() => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.symbol())?;
                    }
                    arg.fmt_operand(f)?;
                }
                Ok(())
            }
            Expr::NAry { op, args } => {
                write!(f, "{}(", op.symbol())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Function parameter. Its position in the list is its local slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: ValType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ValType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// A function of the module: signature, export flag and expression body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub export: bool,
    pub params: Vec<Param>,
    pub results: Vec<ValType>,
    pub body: Expr,
    /// Extra local slots declared after the parameters.
    #[serde(default)]
    pub locals: Vec<ValType>,
}

impl FunctionDef {
    /// Builds and validates a function with no extra locals.
    pub fn new(
        name: impl Into<String>,
        export: bool,
        params: Vec<Param>,
        results: Vec<ValType>,
        body: Expr,
    ) -> Result<Self> {
        let def = Self { name: name.into(), export, params, results, body, locals: Vec::new() };
        def.validate()?;
        Ok(def)
    }

    /// Replaces the extra locals and re-validates.
    pub fn with_locals(mut self, locals: Vec<ValType>) -> Result<Self> {
        self.locals = locals;
        self.validate()?;
        Ok(self)
    }

    /// Checks the slot/parameter coupling and the result arity.
    ///
    /// Every variable reference must point inside the local space, and a
    /// reference to a parameter slot must use that parameter's name.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return error_in(&self.name, "function name must not be empty");
        }
        if self.results.len() != 1 {
            return error_in(
                &self.name,
                format!("expected exactly one result type, found {}", self.results.len()),
            );
        }
        let slots = self.params.len() + self.locals.len();
        for (slot, name) in self.body.locals() {
            let index = slot as usize;
            if index >= slots {
                return error_in(
                    &self.name,
                    format!("variable '{}' uses slot {} but only {} slots exist", name, slot, slots),
                );
            }
            if let Some(param) = self.params.get(index) {
                if param.name != name {
                    return error_in(
                        &self.name,
                        format!(
                            "variable '{}' uses slot {} which belongs to parameter '{}'",
                            name, slot, param.name
                        ),
                    );
                }
            }
        }
        Ok(())
    }

    /// Type of a local slot: parameters first, then extra locals.
    pub fn local_type(&self, slot: u32) -> Option<ValType> {
        let index = slot as usize;
        match self.params.get(index) {
            Some(param) => Some(param.ty),
            None => self.locals.get(index - self.params.len()).copied(),
        }
    }

    pub fn param_types(&self) -> Vec<ValType> {
        self.params.iter().map(|p| p.ty).collect()
    }

    /// Renders `name(a: f32, b: f32) -> f32`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| format!("{}: {}", p.name, p.ty)).collect();
        let results: Vec<&str> = self.results.iter().map(|t| t.name()).collect();
        format!("{}({}) -> {}", self.name, params.join(", "), results.join(", "))
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.signature(), self.body)
    }
}

/// Ordered function table. A function's index is its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub functions: Vec<FunctionDef>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a function and returns its index.
    pub fn push(&mut self, function: FunctionDef) -> u32 {
        self.functions.push(function);
        (self.functions.len() - 1) as u32
    }

    pub fn with_function(mut self, function: FunctionDef) -> Self {
        self.functions.push(function);
        self
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.functions.iter().position(|f| f.name == name).map(|i| i as u32)
    }

    pub fn exports(&self) -> impl Iterator<Item = (u32, &FunctionDef)> {
        self.functions.iter().enumerate().filter(|(_, f)| f.export).map(|(i, f)| (i as u32, f))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
