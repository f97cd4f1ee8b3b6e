//! Error types.
//!
//! Journal errors are a separate type so gate callers can tell a corrupted
//! log apart from "not a duplicate". Command-level failures are not errors at
//! all; they are captured in [`crate::commands::CommandOutcome`].

use thiserror::Error;

/// Errors raised by the operation journal subsystem.
#[derive(Debug, Error)]
pub enum JournalError {
    /// A log line does not match `<kind>: <payload>`. Aborts the entire read:
    /// partial reconstruction could silently under-report duplicates.
    #[error("malformed journal line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    /// A delete entry referenced a path with no tracked state. Only raised
    /// under [`crate::journal::DeletePolicy::Strict`].
    #[error("journal deletes untracked path {path:?}")]
    UntrackedDelete { path: String },

    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level toolkit error.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("unsupported archive format: {0:?}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
