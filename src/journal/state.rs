//! Reconstructed journal state.

use crate::error::JournalError;
use crate::journal::entry::{LogEntry, Operation};
use std::collections::HashMap;
use tracing::debug;

/// Path to last recorded checksum. Derived by folding the journal in file
/// order; never persisted and never cached across gate calls.
pub type JournalState = HashMap<String, Option<String>>;

/// How reconstruction treats a delete entry for a path it is not tracking.
///
/// `Ignore` keeps the gate usable over partial or hand-edited logs; `Strict`
/// refuses to reconstruct from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    #[default]
    Ignore,
    Strict,
}

/// Fold entries left-to-right into current state.
///
/// Write and append entries set or overwrite the path's checksum; delete
/// entries remove the key. No entry is skipped or reordered, so the result is
/// deterministic for a given log. An entry error from the underlying reader
/// aborts the whole fold.
pub fn reconstruct<I>(entries: I, policy: DeletePolicy) -> Result<JournalState, JournalError>
where
    I: IntoIterator<Item = Result<LogEntry, JournalError>>,
{
    let mut state = JournalState::new();
    for entry in entries {
        let entry = entry?;
        match entry.operation {
            Operation::Write | Operation::Append => {
                state.insert(entry.path, entry.checksum);
            }
            Operation::Delete => {
                if state.remove(&entry.path).is_none() {
                    match policy {
                        DeletePolicy::Ignore => {
                            debug!(path = %entry.path, "journal deletes untracked path; ignoring");
                        }
                        DeletePolicy::Strict => {
                            return Err(JournalError::UntrackedDelete { path: entry.path });
                        }
                    }
                }
            }
        }
    }
    Ok(state)
}
