//! Error handling types shared by every wasmling crate.
//!
//! The pipeline is construction-only, so most errors are programmer errors:
//! a function definition whose variable references disagree with its
//! parameter list, an n-ary node with too few children, a name that cannot
//! be encoded. Decoding a module (the inverse direction, used by the
//! disassembler and the reference evaluator) reports malformed input with
//! the byte offset where it was found.
//!
//! # Examples
//!
//! ```rust
//! use wasmling_syntax::error::{error, Error, Result};
//!
//! fn check_arity(params: usize) -> Result<()> {
//!     if params > 16 {
//!         error(format!("too many parameters: {}", params))
//!     } else {
//!         Ok(())
//!     }
//! }
//!
//! assert!(check_arity(2).is_ok());
//! let located = Error::at("truncated LEB128 value", 0x1f);
//! assert_eq!(located.to_string(), "truncated LEB128 value at byte 0x1f");
//! ```

use std::fmt;

/// An error raised while building, lowering, assembling or decoding a module.
///
/// Each error carries a message and optionally the function it concerns
/// and/or the byte offset in a binary buffer where it was detected.
///
/// ```rust
/// use wasmling_syntax::Error;
///
/// let err = Error::in_function("slot 3 is out of range", "add");
/// assert_eq!(err.to_string(), "slot 3 is out of range in function 'add'");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// Human-readable error message
    pub msg: String,

    /// Name of the function being processed, if any
    pub function: Option<String>,

    /// Byte offset into the buffer being decoded, if any
    pub offset: Option<usize>,
}

impl Error {
    /// Creates an error with no location information.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            function: None,
            offset: None,
        }
    }

    /// Creates an error attached to a named function.
    pub fn in_function(msg: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            function: Some(function.into()),
            offset: None,
        }
    }

    /// Creates an error located at a byte offset of a decoded buffer.
    pub fn at(msg: impl Into<String>, offset: usize) -> Self {
        Self {
            msg: msg.into(),
            function: None,
            offset: Some(offset),
        }
    }

    /// Attaches a function name unless one is already present.
    ///
    /// Used when an error bubbles up from lowering an expression to the
    /// function that owns it.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        if self.function.is_none() {
            self.function = Some(function.into());
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)?;
        if let Some(name) = &self.function {
            write!(f, " in function '{}'", name)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " at byte {:#04x}", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` type for wasmling operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::new(msg))`.
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}

/// Shorthand for `Err(Error::in_function(msg, function))`.
pub fn error_in<T>(function: impl Into<String>, msg: impl Into<String>) -> Result<T> {
    Err(Error::in_function(msg, function))
}

/// Shorthand for `Err(Error::at(msg, offset))`.
pub fn error_at<T>(offset: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::at(msg, offset))
}
