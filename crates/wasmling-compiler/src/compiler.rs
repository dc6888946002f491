//! Module assembler: function table to binary module.

use std::collections::HashMap;

use tracing::{debug, trace};
use wasmling_bytecode::encode::{encode_string, encode_vector, make_section};
use wasmling_bytecode::format::{ExportKind, SectionId, FUNC_TYPE, MAGIC, VERSION};
use wasmling_bytecode::leb128::{encode_unsigned, write_unsigned};
use wasmling_syntax::ast::*;
use wasmling_syntax::error::{error, Error, Result};

use crate::builder::FuncBuilder;

pub struct Compiler {
    func_indices: HashMap<String, u32>,
}

impl Default for Compiler { fn default() -> Self { Self::new() } }

impl Compiler {
    pub fn new() -> Self {
        Self { func_indices: HashMap::new() }
    }

    /// Index assigned to `name` by the last call to [`Compiler::compile`].
    pub fn function_index(&self, name: &str) -> Option<u32> {
        self.func_indices.get(name).copied()
    }

    /// Assembles `module` into header + type, function, export and code sections.
    ///
    /// The section order is fixed; consumers decode them in exactly this order.
    pub fn compile(&mut self, module: &Module) -> Result<Vec<u8>> {
        self.func_indices.clear();
        for (idx, f) in module.functions.iter().enumerate() {
            if self.func_indices.contains_key(&f.name) {
                return error(format!("Duplicate function '{}'", f.name));
            }
            f.validate()?;
            self.func_indices.insert(f.name.clone(), idx as u32);
        }

        let types = type_section(module);
        let funcs = function_section(module);
        let exports = export_section(module)?;
        let code = code_section(module)?;
        debug!(
            functions = module.functions.len(),
            type_bytes = types.len(),
            function_bytes = funcs.len(),
            export_bytes = exports.len(),
            code_bytes = code.len(),
            "assembled module"
        );

        let mut out = Vec::with_capacity(MAGIC.len() + VERSION.len() + types.len() + funcs.len() + exports.len() + code.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION);
        out.extend_from_slice(&types);
        out.extend_from_slice(&funcs);
        out.extend_from_slice(&exports);
        out.extend_from_slice(&code);
        Ok(out)
    }
}

/// One `0x60 params results` record per function, no interning.
pub fn type_section(module: &Module) -> Vec<u8> {
    let records: Vec<Vec<u8>> = module
        .functions
        .iter()
        .map(|f| {
            let params: Vec<[u8; 1]> = f.params.iter().map(|p| [p.ty.code()]).collect();
            let results: Vec<[u8; 1]> = f.results.iter().map(|t| [t.code()]).collect();
            let mut record = vec![FUNC_TYPE];
            record.extend(encode_vector(&params));
            record.extend(encode_vector(&results));
            record
        })
        .collect();
    make_section(SectionId::Type, &encode_vector(&records))
}

/// Function `i` uses type record `i`.
pub fn function_section(module: &Module) -> Vec<u8> {
    let indices: Vec<Vec<u8>> = (0..module.functions.len() as u32).map(encode_unsigned).collect();
    make_section(SectionId::Function, &encode_vector(&indices))
}

/// Exported functions only; the entry count is tracked by hand because
/// non-exported functions contribute nothing.
pub fn export_section(module: &Module) -> Result<Vec<u8>> {
    let mut count: u32 = 0;
    let mut entries = Vec::new();
    for (idx, f) in module.functions.iter().enumerate() {
        if !f.export {
            continue;
        }
        count += 1;
        let name = encode_string(&f.name).map_err(|e| e.with_function(&f.name))?;
        entries.extend(name);
        entries.push(ExportKind::Func as u8);
        write_unsigned(&mut entries, idx as u32);
    }
    let mut payload = encode_unsigned(count);
    payload.extend(entries);
    Ok(make_section(SectionId::Export, &payload))
}

pub fn code_section(module: &Module) -> Result<Vec<u8>> {
    let bodies = module.functions.iter().map(lower_function).collect::<Result<Vec<_>>>()?;
    Ok(make_section(SectionId::Code, &encode_vector(&bodies)))
}

/// Size-prefixed body of one function: locals, instructions, `end`.
pub fn lower_function(f: &FunctionDef) -> Result<Vec<u8>> {
    let mut b = FuncBuilder::for_function(f);
    let ty = b.emit_expr(&f.body)?;
    let expected = f.results.first().copied();
    if expected != Some(ty) {
        return Err(Error::in_function(
            format!(
                "body produces {} but the declared result is {}",
                ty,
                expected.map(|t| t.name()).unwrap_or("nothing")
            ),
            &f.name,
        ));
    }
    let body = b.finish(&f.locals);
    trace!(function = %f.name, bytes = body.len(), "lowered function");
    Ok(body)
}
