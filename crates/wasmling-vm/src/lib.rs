//! wasmling VM: reads modules produced by the compiler back in.
//!
//! [`DecodedModule`] is the inverse of the assembler, [`display`] renders
//! listings for inspection, and [`Vm`] evaluates exported functions so
//! emitted modules can be checked without an external host.

pub mod decode;
pub mod display;
pub mod vm;

pub use decode::{Body, DecodedModule, Export, FuncType, TypeCode};
pub use display::{disassemble, display_module};
pub use vm::{Value, Vm};
