use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap().parent().unwrap().to_path_buf()
}

fn arith_model() -> PathBuf {
    workspace_root().join("demos/arith.json")
}

fn build_into(dir: &tempfile::TempDir, model: Option<PathBuf>) -> PathBuf {
    let out = dir.path().join("out.wasm");
    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("build");
    if let Some(model) = model {
        cmd.arg(model);
    }
    cmd.arg("-o").arg(&out);
    cmd.assert().success().stdout(predicate::str::contains("wrote"));
    out
}

#[test]
fn builds_demo_module() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let out = build_into(&tmp_dir, None);
    let bytes = std::fs::read(out).unwrap();
    assert_eq!(&bytes[..8], &[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn build_prints_hex_dump() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("build").arg(arith_model()).arg("-o").arg(tmp_dir.path().join("a.wasm")).arg("--hex");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("00000000  00 61 73 6d 01 00 00 00"));
}

#[test]
fn shows_model_in_infix_form() {
    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("show").arg(arith_model());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("add(a: f32, b: f32) -> f32 = a + b"))
        .stdout(predicate::str::contains("max3(a: f32, b: f32, c: f32) -> f32 = max(a, b, c)"))
        .stdout(predicate::str::contains("half(a: f32) -> f32 = a * 0.5"));
}

#[test]
fn disassembles_built_module() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let out = build_into(&tmp_dir, Some(arith_model()));
    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("disasm").arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("export \"add\" = func 0"))
        .stdout(predicate::str::contains("f32.add"))
        .stdout(predicate::str::contains("f32.const 0.5"));
}

#[test]
fn runs_exported_functions() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let out = build_into(&tmp_dir, Some(arith_model()));

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("run").arg(&out).arg("add").arg("21.25").arg("20.75");
    cmd.assert().success().stdout(predicate::str::contains("42.0"));

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("run").arg(&out).arg("neg").arg("42");
    cmd.assert().success().stdout(predicate::str::contains("-42.0"));

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("run").arg(&out).arg("max3").arg("-1").arg("7.5").arg("3");
    cmd.assert().success().stdout(predicate::str::contains("7.5"));
}

#[test]
fn unexported_function_is_not_callable() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let out = build_into(&tmp_dir, Some(arith_model()));
    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("run").arg(&out).arg("half").arg("4");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Undefined export 'half'"));
}

#[test]
fn bad_model_is_nonzero() {
    let bad = "{ \"functions\": [ { \"name\": "; // malformed on purpose
    let tmp_dir = tempfile::tempdir().unwrap();
    let bad_path = tmp_dir.path().join("bad.json");
    std::fs::write(&bad_path, bad).unwrap();

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("show").arg(bad_path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid model"));
}

#[test]
fn mismatched_slot_name_is_reported() {
    let model = r#"{ "functions": [ { "name": "f", "export": true,
        "params": [ {"name": "a", "ty": "f32"}, {"name": "b", "ty": "f32"} ],
        "results": ["f32"],
        "body": { "local": { "slot": 0, "name": "b" } } } ] }"#;
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("slot.json");
    std::fs::write(&path, model).unwrap();

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("build").arg(&path).arg("-o").arg(tmp_dir.path().join("slot.wasm"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("belongs to parameter 'a'"));
}

#[test]
fn garbage_binary_is_rejected() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("junk.wasm");
    std::fs::write(&path, b"not a module").unwrap();

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("disasm").arg(&path);
    cmd.assert().failure().stderr(predicate::str::contains("Decode error"));
}

#[rustfmt::skip]
const UNKNOWN_PARAM_TYPE: [u8; 35] = [
    0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
    0x01, 0x06, 0x01, 0x60, 0x01, 0x7C, 0x01, 0x7D,
    0x03, 0x02, 0x01, 0x00,
    0x07, 0x05, 0x01, 0x01, b'f', 0x00, 0x00,
    0x0A, 0x06, 0x01, 0x04, 0x00, 0x20, 0x00, 0x0B,
];

#[test]
fn disasm_marks_unknown_value_type() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("odd.wasm");
    std::fs::write(&path, UNKNOWN_PARAM_TYPE).unwrap();

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("disasm").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("type[0] (>>0x7c<<) -> f32"))
        .stdout(predicate::str::contains("local.get 0"));
}

#[test]
fn run_rejects_unknown_value_type() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("odd.wasm");
    std::fs::write(&path, UNKNOWN_PARAM_TYPE).unwrap();

    let mut cmd = Command::cargo_bin("wasmling").unwrap();
    cmd.arg("run").arg(&path).arg("f").arg("1");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown value type 0x7c"));
}
