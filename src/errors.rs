/*!
 * Error Types
 * Centralized gate error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gate operation result
///
/// # Must Use
/// Gate operations can be rejected and must be handled
#[must_use = "gate operations can fail and must be handled"]
pub type GateResult<T> = Result<T, GateError>;

/// Gate errors with serialization support
///
/// `PathEscape` deliberately carries no payload: the caller learns that the
/// request was denied, never where it pointed or whether that target exists.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error", content = "details", rename_all = "snake_case")]
pub enum GateError {
    #[error("Invalid input: {0}")]
    #[diagnostic(
        code(gate::invalid_input),
        help("Supply a non-empty UTF-8 file name without NUL bytes that names a file, not the sandbox root.")
    )]
    InvalidInput(String),

    #[error("Access denied")]
    #[diagnostic(code(gate::path_escape))]
    PathEscape,

    #[error("Not found: {0}")]
    #[diagnostic(code(gate::not_found), help("The file does not exist inside the sandbox."))]
    NotFound(String),

    #[error("Not a regular file: {0}")]
    #[diagnostic(code(gate::not_a_file))]
    NotAFile(String),

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    #[diagnostic(
        code(gate::file_too_large),
        help("Raise SANDBOX_GATE_MAX_FILE_SIZE or split the content.")
    )]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Sandbox is read-only")]
    #[diagnostic(code(gate::read_only))]
    ReadOnly,

    #[error("Invalid sandbox root: {0}")]
    #[diagnostic(
        code(gate::invalid_root),
        help("The root must be an existing directory. Enable SANDBOX_GATE_CREATE_ROOT to create it on startup.")
    )]
    InvalidRoot(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(gate::io))]
    Io(String),
}

/// Integer outcome codes for callers that only carry a status number.
///
/// `PathEscape` and `Io` keep the values the first C-ABI surface returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    PathEscape = -1,
    Io = -2,
    InvalidInput = -3,
    NotFound = -4,
    NotAFile = -5,
    FileTooLarge = -6,
    ReadOnly = -7,
    InvalidRoot = -8,
}

impl ErrorCode {
    /// Status value reported on success
    pub const SUCCESS: i32 = 0;

    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl GateError {
    /// Stable outcome code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            GateError::InvalidInput(_) => ErrorCode::InvalidInput,
            GateError::PathEscape => ErrorCode::PathEscape,
            GateError::NotFound(_) => ErrorCode::NotFound,
            GateError::NotAFile(_) => ErrorCode::NotAFile,
            GateError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            GateError::ReadOnly => ErrorCode::ReadOnly,
            GateError::InvalidRoot(_) => ErrorCode::InvalidRoot,
            GateError::Io(_) => ErrorCode::Io,
        }
    }

    /// Whether this is a security rejection rather than an operational failure
    pub fn is_security_rejection(&self) -> bool {
        matches!(self, GateError::PathEscape)
    }

    /// Convert std::io::Error to GateError
    pub(crate) fn io(e: std::io::Error, context: impl Into<String>) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => GateError::NotFound(context.into()),
            _ => GateError::Io(format!("{}: {}", context.into(), e)),
        }
    }
}

/// Collapse an outcome into the integer status used by thin callers
pub fn status_code<T>(result: &GateResult<T>) -> i32 {
    match result {
        Ok(_) => ErrorCode::SUCCESS,
        Err(e) => e.code().as_i32(),
    }
}
