//! Command surface: agent-invocable operations.
//!
//! Journaled mutations (write/append/delete) consult the duplicate gate
//! before touching the filesystem and record after success; everything else
//! passes straight through to the OS or library underneath with no
//! idempotence tracking.

pub mod archive;
pub mod download;
pub mod files;
pub mod git;
pub mod ingest;

use serde::{Deserialize, Serialize};

/// Result of one command invocation.
///
/// Failures local to a command are captured here rather than raised; only
/// journal and configuration errors surface as `Err` at the API boundary so
/// callers can tell a corrupted journal from an ordinary failed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The operation ran and succeeded.
    Applied(String),
    /// The journal shows the effect is already in place; nothing was touched.
    Skipped(String),
    /// The underlying OS or library call failed. Never journaled.
    Failed(String),
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CommandOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CommandOutcome::Failed(_))
    }

    pub fn message(&self) -> &str {
        match self {
            CommandOutcome::Applied(msg)
            | CommandOutcome::Skipped(msg)
            | CommandOutcome::Failed(msg) => msg,
        }
    }
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandOutcome::Applied(msg) | CommandOutcome::Skipped(msg) => f.write_str(msg),
            CommandOutcome::Failed(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Human-readable byte size (1 KB = 1024 bytes).
pub fn readable_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
