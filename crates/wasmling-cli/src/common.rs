use owo_colors::OwoColorize;
use wasmling_syntax::error::Error;

pub fn render_error(kind: &str, err: &Error) {
    eprintln!("{}: {}", kind.red().bold(), err.msg.red());
    if let Some(name) = &err.function {
        eprintln!("  --> function '{}'", name);
    }
    if let Some(offset) = err.offset {
        eprintln!("  --> byte {:#06x}", offset);
    }
    provide_error_suggestions(&err.msg);
}

pub fn provide_error_suggestions(err_msg: &str) {
    if err_msg.contains("belongs to parameter") || err_msg.contains("slot") {
        eprintln!("{}", "Help: A variable's slot must be its parameter's position (0 for the first).".yellow());
        eprintln!("    {}", "Example: add(a, b) reads a from slot 0 and b from slot 1".bright_black());
    } else if err_msg.contains("expects f32 operands") {
        eprintln!("{}", "Help: Every operator works on f32 values; declare the parameter as f32.".yellow());
    } else if err_msg.contains("declared result") || err_msg.contains("exactly one result") {
        eprintln!("{}", "Help: Functions return a single value whose type matches the body.".yellow());
    } else if err_msg.contains("at least two operands") || err_msg.contains("cannot reduce") {
        eprintln!("{}", "Help: n-ary nodes fold left and accept add, mul or max with two or more operands.".yellow());
    } else if err_msg.contains("cannot encode name") {
        eprintln!("{}", "Help: Export names are limited to 127 Latin-1 characters.".yellow());
    } else if err_msg.contains("Duplicate function") {
        eprintln!("{}", "Help: Function names must be unique within a module.".yellow());
    } else if err_msg.contains("Undefined export") {
        eprintln!("{}", "Help: Use 'wasmling disasm <file>' to list the exported functions.".yellow());
    } else if err_msg.contains("args") {
        eprintln!("{}", "Help: Pass one number per parameter of the exported function.".yellow());
    } else if err_msg.contains("unknown value type") {
        eprintln!("{}", "Help: 'wasmling disasm' can still list modules with unknown value types.".yellow());
    } else if err_msg.contains("magic") || err_msg.contains("version") {
        eprintln!("{}", "Help: The file does not look like a module built by 'wasmling build'.".yellow());
    } else if err_msg.contains("Failed to read") || err_msg.contains("Failed to write") {
        eprintln!("{}", "Help: Check that the path exists and is accessible.".yellow());
    } else if err_msg.contains("Invalid model") {
        eprintln!("{}", "Help: Models are JSON documents of the form { \"functions\": [ ... ] }.".yellow());
        eprintln!("    {}", "See demos/arith.json for a complete example".bright_black());
    }
}
