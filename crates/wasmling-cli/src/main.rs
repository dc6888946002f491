mod common;
mod demo;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use wasmling_compiler::Compiler;
use wasmling_syntax::ast::Module;
use wasmling_syntax::error::{Error, Result};
use wasmling_vm::{display_module, DecodedModule, Value, Vm};

#[derive(Parser, Debug)]
#[command(name = "wasmling", version, about = "Compile expression models to wasm modules")]
struct Cli {
    /// Log compiler internals to stderr (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a JSON model (or the built-in demo) into a binary module
    Build {
        model: Option<PathBuf>,
        #[arg(short = 'o', long = "output", default_value = "module.wasm")]
        output: PathBuf,
        /// Also print a hex dump of the module
        #[arg(long = "hex", default_value_t = false)]
        hex: bool,
    },
    /// Print the functions of a model in infix form
    Show { model: Option<PathBuf> },
    /// List the sections and instructions of a binary module
    Disasm { wasm: PathBuf },
    /// Call an exported function of a binary module
    Run {
        wasm: PathBuf,
        export: String,
        #[arg(allow_negative_numbers = true)]
        args: Vec<f32>,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_model(path: Option<&Path>) -> Result<Module> {
    let Some(path) = path else {
        debug!("no model given, using the built-in demo");
        return demo::demo_module();
    };
    let text = fs::read_to_string(path)
        .map_err(|e| Error::new(format!("Failed to read {}: {}", path.display(), e)))?;
    let module: Module = serde_json::from_str(&text)
        .map_err(|e| Error::new(format!("Invalid model {}: {}", path.display(), e)))?;
    for f in &module.functions {
        f.validate().map_err(|e| e.with_function(f.name.clone()))?;
    }
    Ok(module)
}

fn read_binary(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::new(format!("Failed to read {}: {}", path.display(), e)))
}

fn disasm(wasm: &Path) -> Result<()> {
    // listings tolerate unknown value types
    let module = DecodedModule::decode_lenient(&read_binary(wasm)?)?;
    print!("{}", display_module(&module));
    Ok(())
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(row, chunk)| {
            let cells: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            format!("{:08x}  {}", row * 16, cells.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build(model: Option<&Path>, output: &Path, hex: bool) -> Result<()> {
    let module = load_model(model)?;
    let bytes = Compiler::new().compile(&module)?;
    fs::write(output, &bytes).map_err(|e| Error::new(format!("Failed to write {}: {}", output.display(), e)))?;
    info!(path = %output.display(), bytes = bytes.len(), "module written");
    if hex {
        println!("{}", hex_dump(&bytes));
    }
    println!("{} {} ({} bytes)", "wrote".green(), output.display(), bytes.len());
    Ok(())
}

fn show(model: Option<&Path>) -> Result<()> {
    let module = load_model(model)?;
    for f in &module.functions {
        if f.export {
            println!("{}{}", "export ".cyan(), f);
        } else {
            println!("{}", f);
        }
    }
    Ok(())
}

fn run(wasm: &Path, export: &str, args: &[f32]) -> Result<()> {
    let module = DecodedModule::decode(&read_binary(wasm)?)?;
    let args: Vec<Value> = args.iter().map(|&x| Value::F32(x)).collect();
    let results = Vm::new().invoke(&module, export, &args)?;
    for value in results {
        println!("{}", value);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (kind, outcome) = match &cli.command {
        Command::Build { model, output, hex } => ("Compile error", build(model.as_deref(), output, *hex)),
        Command::Show { model } => ("Model error", show(model.as_deref())),
        Command::Disasm { wasm } => ("Decode error", disasm(wasm)),
        Command::Run { wasm, export, args } => ("Runtime error", run(wasm, export, args)),
    };

    if let Err(e) = outcome {
        common::render_error(kind, &e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_rows() {
        let bytes: Vec<u8> = (0u8..18).collect();
        let dump = hex_dump(&bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000000  00 01 02"));
        assert_eq!(lines[1], "00000010  10 11");
    }

    #[test]
    fn cli_parses_run_with_negative_args() {
        let cli = Cli::try_parse_from(["wasmling", "run", "m.wasm", "add", "-1.5", "2"]).unwrap();
        match cli.command {
            Command::Run { export, args, .. } => {
                assert_eq!(export, "add");
                assert_eq!(args, vec![-1.5, 2.0]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
