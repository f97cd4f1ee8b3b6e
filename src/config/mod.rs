//! Toolkit configuration.
//!
//! An explicit configuration value passed into each service constructor; no
//! process-wide singleton. Loaded from defaults, an optional global file, an
//! optional workspace `opkit.toml`, and an `OPKIT_*` environment overlay.

mod loader;

pub use loader::ConfigLoader;

use crate::error::ToolkitError;
use crate::journal::DeletePolicy;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_journal_path() -> PathBuf {
    PathBuf::from(".opkit/operations.log")
}

fn default_max_chunk_len() -> usize {
    4000
}

fn default_overlap() -> usize {
    200
}

fn default_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

/// Operation journal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Journal file location, resolved against the workspace root unless
    /// absolute.
    #[serde(default = "default_journal_path")]
    pub path: PathBuf,

    /// Treat a journaled delete of an untracked path as an error instead of
    /// ignoring it.
    #[serde(default)]
    pub strict_reconstruction: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
            strict_reconstruction: false,
        }
    }
}

/// Ingestion windowing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum characters per chunk.
    #[serde(default = "default_max_chunk_len")]
    pub max_chunk_len: usize,

    /// Overlapping characters between consecutive chunks. Must stay below
    /// `max_chunk_len`.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: default_max_chunk_len(),
            overlap: default_overlap(),
        }
    }
}

/// Download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Whether the download command is enabled for this workspace.
    #[serde(default = "default_true")]
    pub allow: bool,

    /// Retry attempts for transient upstream errors (502/503/504).
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            allow: default_true(),
            retries: default_retries(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolkitConfig {
    #[serde(default)]
    pub journal: JournalConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ToolkitConfig {
    /// Resolve the journal file location against the workspace root.
    pub fn journal_path(&self, workspace_root: &Path) -> PathBuf {
        if self.journal.path.is_absolute() {
            self.journal.path.clone()
        } else {
            workspace_root.join(&self.journal.path)
        }
    }

    /// Reconstruction policy for the journal.
    pub fn delete_policy(&self) -> DeletePolicy {
        if self.journal.strict_reconstruction {
            DeletePolicy::Strict
        } else {
            DeletePolicy::Ignore
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ToolkitError> {
        if self.ingest.max_chunk_len == 0 {
            return Err(ToolkitError::ConfigError(
                "ingest.max_chunk_len must be greater than zero".to_string(),
            ));
        }
        if self.ingest.overlap >= self.ingest.max_chunk_len {
            return Err(ToolkitError::ConfigError(format!(
                "ingest.overlap ({}) must be smaller than ingest.max_chunk_len ({})",
                self.ingest.overlap, self.ingest.max_chunk_len
            )));
        }
        Ok(())
    }
}
