//! CLI Tooling
//!
//! Command-line interface for the agent operations toolkit. Workspace-scoped;
//! journaled mutations run through the duplicate gate, everything else is a
//! direct pass-through.

use crate::commands::archive::{self, ArchiveFormat};
use crate::commands::download;
use crate::commands::files::FileCommandService;
use crate::commands::git::GitCommandService;
use crate::commands::ingest::{self, MemorySink};
use crate::config::{ConfigLoader, ToolkitConfig};
use crate::error::ToolkitError;
use crate::journal::{LogEntry, OperationJournal};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::debug;

/// Opkit CLI - Idempotent agent operations toolkit
#[derive(Parser)]
#[command(name = "opkit")]
#[command(about = "Idempotent file and version-control operations for agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write text to a file (skipped when the journal shows identical content)
    Write {
        path: String,
        text: String,
    },
    /// Append text to a file (never gated)
    Append {
        path: String,
        text: String,
    },
    /// Delete a file (skipped when the journal shows it already gone)
    Delete {
        path: String,
    },
    /// Print a file's contents
    Read {
        path: String,
    },
    /// Recursively list files in a directory
    List {
        directory: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Ingest a file into the chunk sink in overlapping windows
    Ingest {
        path: String,
        /// Maximum characters per chunk (default from config)
        #[arg(long)]
        max_chunk_len: Option<usize>,
        /// Overlapping characters between chunks (default from config)
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Copy a file
    Copy {
        source: String,
        destination: String,
    },
    /// Rename (move) a file
    Rename {
        old_path: String,
        new_path: String,
    },
    /// Directory commands
    Dir {
        #[command(subcommand)]
        command: DirCommands,
    },
    /// Show file metadata (size, timestamps, permissions, ownership)
    Info {
        path: String,
    },
    /// Show the size of a file or directory tree
    Size {
        path: String,
    },
    /// Change permissions of a file or directory tree (octal, e.g. 755)
    Chmod {
        path: String,
        mode: String,
    },
    /// Change owner and group of a file or directory
    Chown {
        path: String,
        owner: String,
        group: String,
    },
    /// Compress files into an archive
    Compress {
        /// Paths to include
        #[arg(required = true)]
        paths: Vec<String>,
        /// Archive format (zip, tar, gz, bz2)
        #[arg(long, default_value = "zip")]
        format: String,
        /// Output file name without extension
        #[arg(long, default_value = "output")]
        output: String,
    },
    /// Extract an archive next to itself
    Decompress {
        archive: String,
    },
    /// Download a file over HTTP
    Download {
        url: String,
        dest: String,
    },
    /// Version-control commands
    Git {
        #[command(subcommand)]
        command: GitCommands,
    },
    /// Operation journal inspection
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },
    /// Write a default opkit.toml into the workspace
    Init {
        /// Overwrite an existing opkit.toml
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum DirCommands {
    /// Create a directory (and missing parents)
    Create { path: String },
    /// Rename (move) a directory
    Rename { old_path: String, new_path: String },
    /// Delete a directory and its contents
    Delete { path: String },
}

#[derive(Subcommand)]
pub enum GitCommands {
    /// Clone a repository
    Clone { url: String, path: String },
    /// Initialize a new repository
    Init { path: String },
    /// Stage a file
    Add { repo: String, path: String },
    /// Unstage a file
    Remove { repo: String, path: String },
    /// Commit staged changes
    Commit {
        repo: String,
        #[arg(short, long)]
        message: String,
    },
    /// Push HEAD to a remote branch
    Push {
        repo: String,
        branch: String,
        #[arg(long, default_value = "origin")]
        remote: String,
    },
    /// Pull a remote branch into the working tree
    Pull {
        repo: String,
        branch: String,
        #[arg(long, default_value = "origin")]
        remote: String,
    },
    /// Switch to a branch, creating it when missing
    Checkout { repo: String, branch: String },
    /// Merge a branch into the current branch
    Merge { repo: String, branch: String },
    /// Show branch, changed files, and untracked files
    Status { repo: String },
    /// Show recent commits
    Log {
        repo: String,
        #[arg(long, default_value = "25")]
        max_count: usize,
    },
    /// Create a pull request on the hosting service
    Pr {
        repo: String,
        #[arg(long)]
        base: String,
        #[arg(long)]
        head: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        /// API token for the hosting service
        #[arg(long, env = "OPKIT_GITHUB_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[derive(Subcommand)]
pub enum JournalCommands {
    /// Show reconstructed path state
    State {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List raw journal entries in file order
    Entries {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Chunk sink used by the CLI ingest command: counts chunks and traces them.
struct TracingSink {
    chunks: usize,
}

impl MemorySink for TracingSink {
    fn add(&mut self, text: String) {
        self.chunks += 1;
        debug!(chunk = self.chunks, bytes = text.len(), "chunk forwarded");
    }
}

/// CLI context holding the loaded configuration and journal.
pub struct CliContext {
    config: ToolkitConfig,
    journal: OperationJournal,
    workspace_root: PathBuf,
}

impl CliContext {
    /// Create a new CLI context for a workspace.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ToolkitError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let journal = OperationJournal::new(config.journal_path(&workspace_root))
            .with_delete_policy(config.delete_policy());
        Ok(Self {
            config,
            journal,
            workspace_root,
        })
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    pub fn journal(&self) -> &OperationJournal {
        &self.journal
    }

    fn files(&self) -> FileCommandService<'_> {
        FileCommandService::new(&self.journal, self.workspace_root.clone())
    }

    /// Execute a CLI command, returning the text to print.
    pub fn execute(&self, command: &Commands) -> Result<String, ToolkitError> {
        match command {
            Commands::Write { path, text } => Ok(self.files().write_file(path, text)?.to_string()),
            Commands::Append { path, text } => {
                Ok(self.files().append_file(path, text)?.to_string())
            }
            Commands::Delete { path } => Ok(self.files().delete_file(path)?.to_string()),
            Commands::Read { path } => Ok(self.files().read_file(path).to_string()),
            Commands::List { directory, format } => {
                let files = self.files().list_files(directory);
                if format == "json" {
                    serde_json::to_string_pretty(&files).map_err(|e| {
                        ToolkitError::ConfigError(format!("Failed to encode output: {}", e))
                    })
                } else {
                    Ok(format_file_list_text(directory, &files))
                }
            }
            Commands::Ingest {
                path,
                max_chunk_len,
                overlap,
            } => {
                let max_len = max_chunk_len.unwrap_or(self.config.ingest.max_chunk_len);
                let overlap = overlap.unwrap_or(self.config.ingest.overlap);
                if overlap >= max_len {
                    return Err(ToolkitError::ConfigError(format!(
                        "overlap ({}) must be smaller than max chunk length ({})",
                        overlap, max_len
                    )));
                }
                let mut sink = TracingSink { chunks: 0 };
                Ok(ingest::ingest_file(path, &mut sink, max_len, overlap).to_string())
            }
            Commands::Copy {
                source,
                destination,
            } => Ok(self.files().copy_file(source, destination).to_string()),
            Commands::Rename { old_path, new_path } => {
                Ok(self.files().rename_file(old_path, new_path).to_string())
            }
            Commands::Dir { command } => Ok(match command {
                DirCommands::Create { path } => self.files().create_directory(path),
                DirCommands::Rename { old_path, new_path } => {
                    self.files().rename_directory(old_path, new_path)
                }
                DirCommands::Delete { path } => self.files().delete_directory(path),
            }
            .to_string()),
            Commands::Info { path } => Ok(self.files().file_info(path).to_string()),
            Commands::Size { path } => Ok(self.files().file_size(path).to_string()),
            Commands::Chmod { path, mode } => {
                Ok(self.files().change_permissions(path, mode).to_string())
            }
            Commands::Chown { path, owner, group } => {
                Ok(self.files().change_owner(path, owner, group).to_string())
            }
            Commands::Compress {
                paths,
                format,
                output,
            } => {
                let format = ArchiveFormat::from_name(format)?;
                Ok(archive::compress(paths, format, output).to_string())
            }
            Commands::Decompress { archive } => Ok(archive::decompress(archive).to_string()),
            Commands::Download { url, dest } => {
                Ok(download::download_file(&self.config.download, url, dest).to_string())
            }
            Commands::Git { command } => Ok(self.execute_git(command).to_string()),
            Commands::Journal { command } => self.execute_journal(command),
            Commands::Init { force } => self.handle_init(*force),
        }
    }

    fn execute_git(&self, command: &GitCommands) -> crate::commands::CommandOutcome {
        match command {
            GitCommands::Clone { url, path } => GitCommandService::clone_repository(url, path),
            GitCommands::Init { path } => GitCommandService::init_repository(path),
            GitCommands::Add { repo, path } => GitCommandService::add(repo, path),
            GitCommands::Remove { repo, path } => GitCommandService::remove(repo, path),
            GitCommands::Commit { repo, message } => GitCommandService::commit(repo, message),
            GitCommands::Push {
                repo,
                branch,
                remote,
            } => GitCommandService::push(repo, remote, branch),
            GitCommands::Pull {
                repo,
                branch,
                remote,
            } => GitCommandService::pull(repo, remote, branch),
            GitCommands::Checkout { repo, branch } => {
                GitCommandService::checkout_branch(repo, branch)
            }
            GitCommands::Merge { repo, branch } => GitCommandService::merge_branch(repo, branch),
            GitCommands::Status { repo } => GitCommandService::status(repo),
            GitCommands::Log { repo, max_count } => GitCommandService::log(repo, *max_count),
            GitCommands::Pr {
                repo,
                base,
                head,
                title,
                body,
                token,
            } => GitCommandService::create_pull_request(repo, base, head, title, body, token),
        }
    }

    fn execute_journal(&self, command: &JournalCommands) -> Result<String, ToolkitError> {
        match command {
            JournalCommands::State { format } => {
                let state = self.journal.state()?;
                if format == "json" {
                    serde_json::to_string_pretty(&state).map_err(|e| {
                        ToolkitError::ConfigError(format!("Failed to encode output: {}", e))
                    })
                } else {
                    Ok(format_journal_state_text(&state))
                }
            }
            JournalCommands::Entries { format } => {
                let entries = self.journal.entries()?;
                if format == "json" {
                    serde_json::to_string_pretty(&entries).map_err(|e| {
                        ToolkitError::ConfigError(format!("Failed to encode output: {}", e))
                    })
                } else {
                    Ok(format_journal_entries_text(&entries))
                }
            }
        }
    }

    fn handle_init(&self, force: bool) -> Result<String, ToolkitError> {
        let target = self.workspace_root.join("opkit.toml");
        if target.exists() && !force {
            return Ok(format!(
                "{} already exists. Use --force to overwrite.",
                target.display()
            ));
        }
        let rendered = toml::to_string_pretty(&ToolkitConfig::default()).map_err(|e| {
            ToolkitError::ConfigError(format!("Failed to render default config: {}", e))
        })?;
        std::fs::write(&target, rendered)?;
        Ok(format!("Wrote default configuration to {}", target.display()))
    }
}

/// Format a section heading with bold/underline.
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn format_file_list_text(directory: &str, files: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Files under {}", directory))
    ));
    if files.is_empty() {
        out.push_str("No files found.\n");
        return out;
    }
    for file in files {
        out.push_str(file);
        out.push('\n');
    }
    out
}

fn format_journal_state_text(state: &crate::journal::JournalState) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Journal state")));
    if state.is_empty() {
        out.push_str("No tracked paths.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Checksum"]);
    let mut rows: Vec<_> = state.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    for (path, checksum) in rows {
        table.add_row(vec![
            path.clone(),
            checksum.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

fn format_journal_entries_text(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Journal entries")));
    if entries.is_empty() {
        out.push_str("Journal is empty.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Operation", "Path", "Checksum"]);
    for (index, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            entry.operation.to_string(),
            entry.path.clone(),
            entry.checksum.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}
