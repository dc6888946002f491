//! Reference evaluator for decoded modules.

use std::fmt;

use tracing::trace;
use wasmling_bytecode::Instruction;
use wasmling_syntax::ast::ValType;
use wasmling_syntax::error::{error, Error, Result};

use crate::decode::{DecodedModule, TypeCode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    F32(f32),
}

impl Value {
    pub fn ty(&self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
            Value::F32(_) => ValType::F32,
        }
    }

    pub fn zero(ty: ValType) -> Self {
        match ty {
            ValType::I32 => Value::I32(0),
            ValType::F32 => Value::F32(0.0),
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(x) => Some(*x),
            Value::I32(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(n) => write!(f, "{}", n),
            Value::F32(x) => write!(f, "{:?}", x),
        }
    }
}

pub struct Vm {
    stack: Vec<Value>,
}

impl Default for Vm { fn default() -> Self { Self::new() } }

impl Vm {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Calls the export `name` with `args` and returns its results.
    pub fn invoke(&mut self, module: &DecodedModule, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        let export = module.export(name).ok_or_else(|| Error::new(format!("Undefined export '{}'", name)))?;
        self.call(module, export.index, args).map_err(|e| e.with_function(name))
    }

    pub fn call(&mut self, module: &DecodedModule, func: u32, args: &[Value]) -> Result<Vec<Value>> {
        let ty = module.func_type(func).ok_or_else(|| Error::new(format!("no function {}", func)))?;
        let body = module.bodies.get(func as usize).ok_or_else(|| Error::new(format!("no body for function {}", func)))?;
        if args.len() != ty.params.len() {
            return error(format!("expected {} args, got {}", ty.params.len(), args.len()));
        }
        for (i, (arg, &want)) in args.iter().zip(&ty.params).enumerate() {
            if TypeCode::Known(arg.ty()) != want {
                return error(format!("argument {} must be {}, got {}", i, want, arg.ty()));
            }
        }
        let mut locals: Vec<Value> = args.to_vec();
        for &code in &body.locals {
            let ty = code.known().ok_or_else(|| Error::new(format!("cannot initialise local of type {}", code)))?;
            locals.push(Value::zero(ty));
        }

        self.stack.clear();
        for instr in body.instructions()? {
            trace!(%instr, depth = self.stack.len(), "step");
            match instr {
                Instruction::End => break,
                Instruction::LocalGet(slot) => {
                    let v = *locals.get(slot as usize).ok_or_else(|| format!("invalid local index {}", slot))?;
                    self.stack.push(v);
                }
                Instruction::F32Const(x) => self.stack.push(Value::F32(x)),
                Instruction::F32Neg => {
                    let a = self.pop_f32("f32.neg")?;
                    self.stack.push(Value::F32(-a));
                }
                Instruction::F32Add => self.binary("f32.add", |a, b| a + b)?,
                Instruction::F32Sub => self.binary("f32.sub", |a, b| a - b)?,
                Instruction::F32Mul => self.binary("f32.mul", |a, b| a * b)?,
                Instruction::F32Div => self.binary("f32.div", |a, b| a / b)?,
                Instruction::F32Max => self.binary("f32.max", f32_max)?,
            }
        }

        if self.stack.len() != ty.results.len() {
            return error(format!(
                "function left {} values on the stack, expected {}",
                self.stack.len(),
                ty.results.len()
            ));
        }
        for (v, &want) in self.stack.iter().zip(&ty.results) {
            if TypeCode::Known(v.ty()) != want {
                return error(format!("result must be {}, got {}", want, v.ty()));
            }
        }
        Ok(std::mem::take(&mut self.stack))
    }

    fn pop_f32(&mut self, op: &str) -> Result<f32> {
        match self.stack.pop() {
            Some(Value::F32(x)) => Ok(x),
            Some(other) => error(format!("{} expects f32, got {}", op, other.ty())),
            None => error(format!("stack underflow in {}", op)),
        }
    }

    fn binary(&mut self, op: &str, f: impl Fn(f32, f32) -> f32) -> Result<()> {
        let b = self.pop_f32(op)?;
        let a = self.pop_f32(op)?;
        self.stack.push(Value::F32(f(a, b)));
        Ok(())
    }
}

/// `max` with NaN propagation and -0.0 < +0.0.
fn f32_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        return f32::NAN;
    }
    if a == b {
        // only differs for signed zeros
        return if a.is_sign_negative() { b } else { a };
    }
    if a > b { a } else { b }
}
