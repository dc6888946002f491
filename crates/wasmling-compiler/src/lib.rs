//! wasmling compiler: expression trees -> binary module.
//!
//! Lowering is a post-order walk of each function body; assembly then wraps
//! the lowered bodies together with their signatures and exports into the
//! four sections of a module.

mod builder;
pub mod compiler;

pub use compiler::{code_section, export_section, function_section, lower_function, type_section, Compiler};

use wasmling_syntax::ast::{Expr, Module};
use wasmling_syntax::error::Result;

/// Assembles a module with a fresh [`Compiler`].
pub fn assemble(module: &Module) -> Result<Vec<u8>> {
    Compiler::new().compile(module)
}

/// Lowers a bare expression to instruction bytes, without locals or `end`.
///
/// Variable references are taken to be f32 since no signature is known.
pub fn lower(expr: &Expr) -> Result<Vec<u8>> {
    let mut b = builder::FuncBuilder::new("<expr>".to_string(), None);
    b.emit_expr(expr)?;
    Ok(b.into_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmling_syntax::ast::*;

    fn f32_params(names: &[&str]) -> Vec<Param> {
        names.iter().map(|n| Param::new(*n, ValType::F32)).collect()
    }

    fn add_fn() -> FunctionDef {
        FunctionDef::new(
            "add",
            true,
            f32_params(&["a", "b"]),
            vec![ValType::F32],
            Expr::binary(BinaryOp::Add, Expr::local(0, "a"), Expr::local(1, "b")),
        )
        .unwrap()
    }

    fn neg_fn() -> FunctionDef {
        FunctionDef::new("neg", true, f32_params(&["a"]), vec![ValType::F32], Expr::neg(Expr::local(0, "a"))).unwrap()
    }

    #[test]
    fn lowers_binary_add() {
        let e = Expr::binary(BinaryOp::Add, Expr::local(0, "a"), Expr::local(1, "b"));
        assert_eq!(lower(&e).unwrap(), vec![0x20, 0x00, 0x20, 0x01, 0x92]);
    }

    #[test]
    fn lowers_unary_neg() {
        let e = Expr::neg(Expr::local(0, "a"));
        assert_eq!(lower(&e).unwrap(), vec![0x20, 0x00, 0x8C]);
    }

    #[test]
    fn lowers_nested_post_order() {
        // (a - 1.0) * -b
        let e = Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Sub, Expr::local(0, "a"), Expr::constant(1.0)),
            Expr::neg(Expr::local(1, "b")),
        );
        assert_eq!(
            lower(&e).unwrap(),
            vec![0x20, 0x00, 0x43, 0x00, 0x00, 0x80, 0x3F, 0x93, 0x20, 0x01, 0x8C, 0x94]
        );
    }

    #[test]
    fn assembles_add_and_neg() {
        let module = Module::new().with_function(add_fn()).with_function(neg_fn());
        let bytes = assemble(&module).unwrap();
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
            // type: two records
            0x01, 0x0C, 0x02,
            0x60, 0x02, 0x7D, 0x7D, 0x01, 0x7D,
            0x60, 0x01, 0x7D, 0x01, 0x7D,
            // function: [0, 1]
            0x03, 0x03, 0x02, 0x00, 0x01,
            // export: add -> 0, neg -> 1
            0x07, 0x0D, 0x02,
            0x03, b'a', b'd', b'd', 0x00, 0x00,
            0x03, b'n', b'e', b'g', 0x00, 0x01,
            // code: two bodies ending in end
            0x0A, 0x0F, 0x02,
            0x07, 0x00, 0x20, 0x00, 0x20, 0x01, 0x92, 0x0B,
            0x05, 0x00, 0x20, 0x00, 0x8C, 0x0B,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn assembly_is_deterministic() {
        let module = Module::new().with_function(add_fn()).with_function(neg_fn());
        let mut compiler = Compiler::new();
        let first = compiler.compile(&module).unwrap();
        let second = compiler.compile(&module).unwrap();
        assert_eq!(first, second);
        assert_eq!(compiler.function_index("neg"), Some(1));
    }

    #[test]
    fn non_exported_functions_keep_their_index() {
        let mut hidden = add_fn();
        hidden.name = "hidden".to_string();
        hidden.export = false;
        let module = Module::new().with_function(hidden).with_function(neg_fn());
        let section = export_section(&module).unwrap();
        assert_eq!(section, vec![0x07, 0x07, 0x01, 0x03, b'n', b'e', b'g', 0x00, 0x01]);
    }

    #[test]
    fn empty_module_has_empty_sections() {
        let bytes = assemble(&Module::new()).unwrap();
        assert_eq!(
            bytes,
            vec![0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x03, 0x01, 0x00, 0x07, 0x01, 0x00, 0x0A, 0x01, 0x00]
        );
    }

    #[test]
    fn rejects_duplicate_function_names() {
        let module = Module::new().with_function(add_fn()).with_function(add_fn());
        let err = assemble(&module).unwrap_err();
        assert_eq!(err.msg, "Duplicate function 'add'");
    }

    #[test]
    fn revalidates_deserialized_functions() {
        let mut broken = add_fn();
        broken.body = Expr::local(1, "a");
        let err = assemble(&Module::new().with_function(broken)).unwrap_err();
        assert!(err.msg.contains("belongs to parameter 'b'"), "{}", err);
    }

    #[test]
    fn rejects_result_type_mismatch() {
        let f = FunctionDef::new("f", false, f32_params(&["a"]), vec![ValType::I32], Expr::local(0, "a")).unwrap();
        let err = lower_function(&f).unwrap_err();
        assert_eq!(err.msg, "body produces f32 but the declared result is i32");
    }

    #[test]
    fn rejects_unencodable_export_name() {
        let mut f = neg_fn();
        f.name = "n".repeat(200);
        let err = assemble(&Module::new().with_function(f)).unwrap_err();
        assert!(err.msg.contains("limit 127"), "{}", err);
    }

    #[test]
    fn declared_locals_precede_code() {
        let f = FunctionDef::new("k", false, vec![], vec![ValType::F32], Expr::constant(0.0))
            .unwrap()
            .with_locals(vec![ValType::F32, ValType::F32])
            .unwrap();
        let body = lower_function(&f).unwrap();
        assert_eq!(&body[..4], &[0x09, 0x01, 0x02, 0x7D]);
        assert_eq!(body.last(), Some(&0x0B));
    }
}
