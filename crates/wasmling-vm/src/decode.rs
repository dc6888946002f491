//! Decoder for modules produced by the assembler.
//!
//! Understands the type, function, export and code sections (custom sections
//! are skipped). Every offset in a returned error is absolute within the
//! buffer passed to [`DecodedModule::decode`].
//!
//! [`DecodedModule::decode_lenient`] accepts unknown value type bytes and
//! keeps them as [`TypeCode::Unknown`] so listings can still be produced.

use std::fmt;

use tracing::debug;
use wasmling_bytecode::format::{ExportKind, SectionId, FUNC_TYPE, MAGIC, VERSION};
use wasmling_bytecode::leb128::decode_unsigned;
use wasmling_bytecode::opcode::describe_valtype;
use wasmling_bytecode::Instruction;
use wasmling_syntax::ast::ValType;
use wasmling_syntax::error::{error_at, Error, Result};

// Upper bound on declared locals per function, so a corrupt count cannot
// trigger a huge allocation.
const MAX_LOCALS: usize = 50_000;

/// Value type slot of a signature or local declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
    Known(ValType),
    Unknown(u8),
}

impl TypeCode {
    pub fn from_byte(byte: u8) -> Self {
        ValType::from_code(byte).map_or(TypeCode::Unknown(byte), TypeCode::Known)
    }

    pub fn byte(self) -> u8 {
        match self {
            TypeCode::Known(ty) => ty.code(),
            TypeCode::Unknown(b) => b,
        }
    }

    pub fn known(self) -> Option<ValType> {
        match self {
            TypeCode::Known(ty) => Some(ty),
            TypeCode::Unknown(_) => None,
        }
    }
}

impl From<ValType> for TypeCode {
    fn from(ty: ValType) -> Self {
        TypeCode::Known(ty)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe_valtype(self.byte()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub params: Vec<TypeCode>,
    pub results: Vec<TypeCode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub locals: Vec<TypeCode>,
    /// Raw instruction bytes, terminating `end` included.
    pub code: Vec<u8>,
    /// Absolute offset of `code[0]` in the module buffer.
    pub offset: usize,
}

impl Body {
    /// Strictly decodes the instruction stream up to and including `end`.
    pub fn instructions(&self) -> Result<Vec<Instruction>> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos < self.code.len() {
            let (instr, len) = Instruction::decode(&self.code[pos..]).map_err(|e| relocate(e, self.offset + pos))?;
            out.push(instr);
            pos += len;
            if instr == Instruction::End {
                if pos != self.code.len() {
                    return error_at(self.offset + pos, "bytes after end of function body");
                }
                return Ok(out);
            }
        }
        error_at(self.offset + pos, "function body is missing its end marker")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedModule {
    pub types: Vec<FuncType>,
    /// Type index of each function.
    pub functions: Vec<u32>,
    pub exports: Vec<Export>,
    pub bodies: Vec<Body>,
}

impl DecodedModule {
    /// Strict decode: unknown value types are errors.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, false)
    }

    /// Like [`decode`](Self::decode), but unknown value type bytes are kept
    /// as [`TypeCode::Unknown`]. Meant for listings, not evaluation.
    pub fn decode_lenient(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, true)
    }

    fn decode_with(bytes: &[u8], lenient: bool) -> Result<Self> {
        let mut r = Reader::new(bytes, lenient);
        if r.take(MAGIC.len())? != MAGIC {
            return error_at(0, "not a module: bad magic bytes");
        }
        if r.take(VERSION.len())? != VERSION {
            return error_at(MAGIC.len(), "unsupported module version");
        }

        let mut module = DecodedModule::default();
        let mut last_id = 0u8;
        while !r.is_empty() {
            let id_at = r.pos;
            let raw = r.byte()?;
            let id = SectionId::from_byte(raw)
                .ok_or_else(|| Error::at(format!("unknown section id {}", raw), id_at))?;
            let size = r.uleb()? as usize;
            let end = r.pos.checked_add(size).filter(|&e| e <= bytes.len()).ok_or_else(|| {
                Error::at(format!("{} section runs past end of module", id.name()), id_at)
            })?;
            if id != SectionId::Custom {
                if raw <= last_id {
                    return error_at(id_at, format!("{} section out of order", id.name()));
                }
                last_id = raw;
            }
            let mut section = Reader { bytes: &bytes[..end], pos: r.pos, lenient };
            match id {
                SectionId::Custom => section.pos = end,
                SectionId::Type => module.types = section.vec(Reader::func_type)?,
                SectionId::Function => module.functions = section.vec(Reader::uleb)?,
                SectionId::Export => module.exports = section.vec(Reader::export)?,
                SectionId::Code => module.bodies = section.vec(Reader::body)?,
                other => return error_at(id_at, format!("unsupported {} section", other.name())),
            }
            if section.pos != end {
                return error_at(section.pos, format!("{} section size mismatch", id.name()));
            }
            r.pos = end;
        }

        module.check_indices()?;
        debug!(
            functions = module.functions.len(),
            exports = module.exports.len(),
            "decoded module"
        );
        Ok(module)
    }

    fn check_indices(&self) -> Result<()> {
        if self.functions.len() != self.bodies.len() {
            return Err(Error::new(format!(
                "{} functions declared but {} bodies present",
                self.functions.len(),
                self.bodies.len()
            )));
        }
        for (i, &ty) in self.functions.iter().enumerate() {
            if ty as usize >= self.types.len() {
                return Err(Error::new(format!("function {} uses missing type {}", i, ty)));
            }
        }
        for export in &self.exports {
            if export.index as usize >= self.functions.len() {
                return Err(Error::new(format!("export '{}' points at missing function {}", export.name, export.index)));
            }
        }
        Ok(())
    }

    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }

    pub fn func_type(&self, func: u32) -> Option<&FuncType> {
        let ty = *self.functions.get(func as usize)?;
        self.types.get(ty as usize)
    }

    /// Name under which a function is exported, if any.
    pub fn export_name(&self, func: u32) -> Option<&str> {
        self.exports.iter().find(|e| e.index == func).map(|e| e.name.as_str())
    }
}

fn relocate(mut err: Error, base: usize) -> Error {
    err.offset = Some(base + err.offset.unwrap_or(0));
    err
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    lenient: bool,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], lenient: bool) -> Self {
        Self { bytes, pos: 0, lenient }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn byte(&mut self) -> Result<u8> {
        let b = *self.bytes.get(self.pos).ok_or_else(|| Error::at("unexpected end of data", self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        if end > self.bytes.len() {
            return error_at(self.bytes.len(), "unexpected end of data");
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn uleb(&mut self) -> Result<u32> {
        let (value, len) = decode_unsigned(&self.bytes[self.pos..]).map_err(|e| relocate(e, self.pos))?;
        self.pos += len;
        Ok(value)
    }

    fn vec<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let count = self.uleb()? as usize;
        // each item occupies at least one byte
        if count > self.bytes.len() - self.pos {
            return error_at(self.pos, format!("vector count {} exceeds remaining data", count));
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(item(self)?);
        }
        Ok(out)
    }

    fn valtype(&mut self) -> Result<TypeCode> {
        let at = self.pos;
        let code = TypeCode::from_byte(self.byte()?);
        match code {
            TypeCode::Unknown(b) if !self.lenient => error_at(at, format!("unknown value type {:#04x}", b)),
            _ => Ok(code),
        }
    }

    fn func_type(&mut self) -> Result<FuncType> {
        let at = self.pos;
        let tag = self.byte()?;
        if tag != FUNC_TYPE {
            return error_at(at, format!("expected function type {:#04x}, found {:#04x}", FUNC_TYPE, tag));
        }
        let params = self.vec(Reader::valtype)?;
        let results = self.vec(Reader::valtype)?;
        Ok(FuncType { params, results })
    }

    fn name(&mut self) -> Result<String> {
        let len = self.uleb()? as usize;
        // one byte per character
        Ok(self.take(len)?.iter().map(|&b| b as char).collect())
    }

    fn export(&mut self) -> Result<Export> {
        let name = self.name()?;
        let at = self.pos;
        let raw = self.byte()?;
        let kind = match ExportKind::from_byte(raw) {
            Some(ExportKind::Func) => ExportKind::Func,
            Some(other) => return error_at(at, format!("unsupported export kind {:?} for '{}'", other, name)),
            None => return error_at(at, format!("unknown export kind {:#04x}", raw)),
        };
        let index = self.uleb()?;
        Ok(Export { name, kind, index })
    }

    fn body(&mut self) -> Result<Body> {
        let size = self.uleb()? as usize;
        let start = self.pos;
        let end = start + size;
        if end > self.bytes.len() {
            return error_at(start, "function body runs past end of section");
        }
        let mut inner = Reader { bytes: &self.bytes[..end], pos: start, lenient: self.lenient };
        let groups = inner.vec(|r| Ok((r.uleb()?, r.valtype()?)))?;
        let mut locals = Vec::new();
        for (count, ty) in groups {
            if locals.len() + count as usize > MAX_LOCALS {
                return error_at(start, "too many locals");
            }
            locals.extend(std::iter::repeat(ty).take(count as usize));
        }
        let offset = inner.pos;
        let code = self.bytes[offset..end].to_vec();
        self.pos = end;
        Ok(Body { locals, code, offset })
    }
}
