use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_PARSE: &str = "MX-ERR-PARSE";
pub const ERR_UNRESOLVED_TARGET: &str = "MX-ERR-UNRESOLVED-TARGET";
pub const ERR_UNSUPPORTED_SIGNATURE: &str = "MX-ERR-UNSUPPORTED-SIGNATURE";
pub const ERR_EMIT: &str = "MX-ERR-EMIT";
pub const ERR_READ: &str = "MX-ERR-READ";
pub const ERR_TEMP_FILE: &str = "MX-ERR-TEMP-FILE";
pub const ERR_SPAWN: &str = "MX-ERR-SPAWN";
pub const ERR_CONFIG: &str = "MX-ERR-CONFIG";
pub const ERR_MISSING_TOOL: &str = "MX-ERR-MISSING-TOOL";

/// Exit status for invalid configuration or command line.
pub const EXIT_USAGE: i32 = 2;
/// Exit status when instrumentation failed and the real tool was never started.
pub const EXIT_TRANSFORM: i32 = 3;
/// Exit status when the real tool could not be started.
pub const EXIT_SPAWN: i32 = 127;

// ═══════════════════════════════════════════════════════════════════════════════
// TOOL ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse {file}:{line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("target function `{name}` was not found in {file}")]
    UnresolvedTarget { file: String, name: String },

    #[error("target function `{name}` in {file} cannot be intercepted: {reason}")]
    UnsupportedSignature {
        file: String,
        name: String,
        reason: String,
    },

    #[error("instrumented output for {file} is not valid Rust: {message}")]
    Emit { file: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write instrumented copy of {}: {source}", path.display())]
    TempFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start `{tool}`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("missing real tool: expected `mockexec <tool> [args...]`")]
    MissingTool,
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Parse { .. } => ERR_PARSE,
            Error::UnresolvedTarget { .. } => ERR_UNRESOLVED_TARGET,
            Error::UnsupportedSignature { .. } => ERR_UNSUPPORTED_SIGNATURE,
            Error::Emit { .. } => ERR_EMIT,
            Error::Read { .. } => ERR_READ,
            Error::TempFile { .. } => ERR_TEMP_FILE,
            Error::Spawn { .. } => ERR_SPAWN,
            Error::Config(_) => ERR_CONFIG,
            Error::MissingTool => ERR_MISSING_TOOL,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::MissingTool => EXIT_USAGE,
            Error::Spawn { .. } => EXIT_SPAWN,
            _ => EXIT_TRANSFORM,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure of an override callable to accept the arguments it was handed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("expected {expected} argument(s), got {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("argument {position} should be `{expected}`, got `{found}`")]
    ArgumentType {
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// Programmer errors surfaced while dispatching to a registered override.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(
        "override for `{name}` reported {reported} result(s) but the intercepted function declares {declared}"
    )]
    ArityMismatch {
        name: String,
        declared: usize,
        reported: usize,
    },

    #[error("override for `{name}` could not be called: {source}")]
    Call {
        name: String,
        #[source]
        source: CallError,
    },

    #[error("override for `{name}` returned `{found}` as result {position}, expected `{expected}`")]
    ResultType {
        name: String,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
}
