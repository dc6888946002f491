//! Built-in module used when no model file is given.

use wasmling_syntax::ast::*;
use wasmling_syntax::error::Result;

fn f32_params(names: &[&str]) -> Vec<Param> {
    names.iter().map(|n| Param::new(*n, ValType::F32)).collect()
}

pub fn demo_module() -> Result<Module> {
    let a = || Expr::local(0, "a");
    let b = || Expr::local(1, "b");
    let mut m = Module::new();
    m.push(FunctionDef::new("add", true, f32_params(&["a", "b"]), vec![ValType::F32], Expr::binary(BinaryOp::Add, a(), b()))?);
    m.push(FunctionDef::new("sub", true, f32_params(&["a", "b"]), vec![ValType::F32], Expr::binary(BinaryOp::Sub, a(), b()))?);
    m.push(FunctionDef::new(
        "neg",
        true,
        f32_params(&["number"]),
        vec![ValType::F32],
        Expr::neg(Expr::local(0, "number")),
    )?);
    m.push(FunctionDef::new(
        "max3",
        true,
        f32_params(&["a", "b", "c"]),
        vec![ValType::F32],
        Expr::nary(BinaryOp::Max, vec![a(), b(), Expr::local(2, "c")]),
    )?);
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_builds_and_assembles() {
        let m = demo_module().unwrap();
        assert_eq!(m.len(), 4);
        assert_eq!(m.exports().count(), 4);
        assert!(wasmling_compiler::assemble(&m).is_ok());
    }
}
