//! Operation Journal
//!
//! Append-only record of past file mutations, used to reconstruct the
//! last-known state of every touched path without re-reading file contents,
//! and to gate redundant writes and deletes before they execute.
//!
//! The log file is the sole source of truth: state is refolded from disk on
//! every duplicate check so appends from concurrent processes are observed.
//! There is no cross-process locking, so two processes can race past each
//! other's gate between a check and the matching [`OperationJournal::record`]
//! call. That window is an accepted limitation, not a guarantee to fix.

pub mod checksum;
pub mod entry;
pub mod reader;
pub mod state;

pub use checksum::text_checksum;
pub use entry::{LogEntry, Operation, LEGACY_LINE_MARKER};
pub use reader::LogReader;
pub use state::{reconstruct, DeletePolicy, JournalState};

use crate::error::JournalError;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Duplicate-check gate and writer over one journal file.
pub struct OperationJournal {
    log_path: PathBuf,
    delete_policy: DeletePolicy,
}

impl OperationJournal {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        OperationJournal {
            log_path: log_path.into(),
            delete_policy: DeletePolicy::default(),
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Refold the full journal into current path state.
    pub fn state(&self) -> Result<JournalState, JournalError> {
        reconstruct(LogReader::open(&self.log_path)?, self.delete_policy)
    }

    /// All entries in file order.
    pub fn entries(&self) -> Result<Vec<LogEntry>, JournalError> {
        LogReader::open(&self.log_path)?.collect()
    }

    /// Decide whether `operation` on `path` has already been performed.
    ///
    /// Delete is a duplicate when the path is absent from reconstructed state;
    /// write is a duplicate when the recorded digest equals `checksum` exactly.
    /// Appends are never duplicates: repeating one grows the target, so no
    /// duplicate concept applies and the gate always lets them through.
    ///
    /// Journal read errors surface as `Err`, distinct from `Ok(false)`: a
    /// corrupted log must not silently read as "no history".
    pub fn is_duplicate(
        &self,
        operation: Operation,
        path: &str,
        checksum: Option<&str>,
    ) -> Result<bool, JournalError> {
        let state = self.state()?;
        Ok(match operation {
            Operation::Delete => !state.contains_key(path),
            Operation::Write => state
                .get(path)
                .is_some_and(|recorded| recorded.as_deref() == checksum),
            Operation::Append => false,
        })
    }

    /// Append one entry to the journal, creating the log file and its parent
    /// directories on first use.
    ///
    /// Recording is plain file I/O and is exempt from the gate: it must never
    /// be skipped or itself journaled, or state would always read as current.
    pub fn record(
        &self,
        operation: Operation,
        path: &str,
        checksum: Option<&str>,
    ) -> Result<(), JournalError> {
        let entry = LogEntry::new(operation, path, checksum.map(str::to_string));
        let line = entry.to_line();
        debug!(%line, "recording journal entry");

        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
