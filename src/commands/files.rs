//! File and directory commands.
//!
//! `write_file`, `append_file`, and `delete_file` go through the operation
//! journal: the duplicate gate runs before the mutation, and a journal entry
//! is appended only after the mutation succeeds. Everything else here is a
//! pass-through wrapper with no idempotence tracking.

use crate::commands::{readable_size, CommandOutcome};
use crate::error::JournalError;
use crate::journal::{text_checksum, Operation, OperationJournal};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// File command service bound to one workspace and journal.
pub struct FileCommandService<'a> {
    journal: &'a OperationJournal,
    workspace_root: PathBuf,
}

impl<'a> FileCommandService<'a> {
    pub fn new(journal: &'a OperationJournal, workspace_root: impl Into<PathBuf>) -> Self {
        FileCommandService {
            journal,
            workspace_root: workspace_root.into(),
        }
    }

    /// Write `text` to `path`, truncating any existing content. Skipped when
    /// the journal already records this exact content for the path.
    pub fn write_file(&self, path: &str, text: &str) -> Result<CommandOutcome, JournalError> {
        let checksum = text_checksum(text);
        if self.journal.is_duplicate(Operation::Write, path, Some(&checksum))? {
            return Ok(CommandOutcome::Skipped(
                "File has already been updated.".to_string(),
            ));
        }

        let target = Path::new(path);
        if let Err(err) = create_parent_dirs(target).and_then(|()| fs::write(target, text)) {
            return Ok(CommandOutcome::Failed(format!(
                "Failed to write {}: {}",
                path, err
            )));
        }

        self.journal.record(Operation::Write, path, Some(&checksum))?;
        info!(path, "file written");
        Ok(CommandOutcome::Applied(
            "File written successfully.".to_string(),
        ))
    }

    /// Append `text` to `path`, creating the file if needed.
    ///
    /// Appends are never gated: repeating one grows the file, so no duplicate
    /// concept applies. The digest of the whole file content after the append
    /// is recorded so a later identical `write_file` is detected as duplicate.
    pub fn append_file(&self, path: &str, text: &str) -> Result<CommandOutcome, JournalError> {
        let target = Path::new(path);
        let appended = create_parent_dirs(target).and_then(|()| {
            use std::io::Write as _;
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(target)?;
            file.write_all(text.as_bytes())
        });
        if let Err(err) = appended {
            return Ok(CommandOutcome::Failed(format!(
                "Failed to append to {}: {}",
                path, err
            )));
        }

        match fs::read_to_string(target) {
            Ok(content) => {
                self.journal
                    .record(Operation::Append, path, Some(&text_checksum(&content)))?;
            }
            Err(err) => {
                return Ok(CommandOutcome::Failed(format!(
                    "Appended to {} but failed to re-read it for the journal: {}",
                    path, err
                )));
            }
        }
        info!(path, "text appended");
        Ok(CommandOutcome::Applied(
            "Text appended successfully.".to_string(),
        ))
    }

    /// Delete `path`. Skipped when the journal shows the path already absent.
    pub fn delete_file(&self, path: &str) -> Result<CommandOutcome, JournalError> {
        if self.journal.is_duplicate(Operation::Delete, path, None)? {
            return Ok(CommandOutcome::Skipped(
                "File has already been deleted.".to_string(),
            ));
        }

        if let Err(err) = fs::remove_file(path) {
            return Ok(CommandOutcome::Failed(format!(
                "Failed to delete {}: {}",
                path, err
            )));
        }

        self.journal.record(Operation::Delete, path, None)?;
        info!(path, "file deleted");
        Ok(CommandOutcome::Applied(
            "File deleted successfully.".to_string(),
        ))
    }

    /// Read a file as UTF-8, replacing invalid sequences.
    pub fn read_file(&self, path: &str) -> CommandOutcome {
        match fs::read(path) {
            Ok(bytes) => CommandOutcome::Applied(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => CommandOutcome::Failed(format!("Failed to read {}: {}", path, err)),
        }
    }

    /// Recursively list files under `directory`, skipping dotfiles. Paths are
    /// reported relative to the workspace root where possible.
    pub fn list_files(&self, directory: &str) -> Vec<String> {
        let mut found = Vec::new();
        for dir_entry in WalkDir::new(directory).into_iter().filter_map(Result::ok) {
            if !dir_entry.file_type().is_file() {
                continue;
            }
            if dir_entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = dir_entry.path();
            let reported = path.strip_prefix(&self.workspace_root).unwrap_or(path);
            found.push(reported.to_string_lossy().into_owned());
        }
        found
    }

    /// Copy a file, preserving permissions.
    pub fn copy_file(&self, source: &str, destination: &str) -> CommandOutcome {
        match fs::copy(source, destination) {
            Ok(_) => CommandOutcome::Applied(format!(
                "File '{}' copied to '{}'.",
                source, destination
            )),
            Err(err) => CommandOutcome::Failed(format!(
                "Failed to copy '{}' to '{}': {}",
                source, destination, err
            )),
        }
    }

    /// Rename (move) a file.
    pub fn rename_file(&self, old_path: &str, new_path: &str) -> CommandOutcome {
        match fs::rename(old_path, new_path) {
            Ok(()) => CommandOutcome::Applied(format!(
                "File renamed from '{}' to '{}'.",
                old_path, new_path
            )),
            Err(err) => CommandOutcome::Failed(format!(
                "Failed to rename '{}' to '{}': {}",
                old_path, new_path, err
            )),
        }
    }

    /// Create a directory and any missing parents. Reports an existing
    /// directory rather than failing on it.
    pub fn create_directory(&self, path: &str) -> CommandOutcome {
        if Path::new(path).is_dir() {
            return CommandOutcome::Skipped(format!("Directory '{}' already exists.", path));
        }
        match fs::create_dir_all(path) {
            Ok(()) => CommandOutcome::Applied(format!("Directory '{}' created.", path)),
            Err(err) => {
                CommandOutcome::Failed(format!("Failed to create directory '{}': {}", path, err))
            }
        }
    }

    /// Rename (move) a directory.
    pub fn rename_directory(&self, old_path: &str, new_path: &str) -> CommandOutcome {
        match fs::rename(old_path, new_path) {
            Ok(()) => CommandOutcome::Applied(format!(
                "Directory renamed from '{}' to '{}'.",
                old_path, new_path
            )),
            Err(err) => CommandOutcome::Failed(format!(
                "Failed to rename directory '{}' to '{}': {}",
                old_path, new_path, err
            )),
        }
    }

    /// Delete a directory and all of its contents.
    pub fn delete_directory(&self, path: &str) -> CommandOutcome {
        match fs::remove_dir_all(path) {
            Ok(()) => CommandOutcome::Applied(format!("Directory '{}' deleted.", path)),
            Err(err) => {
                CommandOutcome::Failed(format!("Failed to delete directory '{}': {}", path, err))
            }
        }
    }

    /// Metadata report for a file: size, timestamps, mode, ownership.
    pub fn file_info(&self, path: &str) -> CommandOutcome {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) => {
                return CommandOutcome::Failed(format!("Failed to stat '{}': {}", path, err))
            }
        };

        let mut report = format!("File info for '{}':\n", path);
        report.push_str(&format!("- Size: {} bytes\n", meta.len()));
        report.push_str(&format!(
            "- Last modified time: {}\n",
            format_timestamp(meta.modified().ok())
        ));
        report.push_str(&format!(
            "- Last access time: {}\n",
            format_timestamp(meta.accessed().ok())
        ));
        report.push_str(&format!(
            "- Creation time: {}\n",
            format_timestamp(meta.created().ok())
        ));

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            report.push_str(&format!("- Mode: {}\n", meta.mode()));
            report.push_str(&format!("- Permissions: {:03o}\n", meta.mode() & 0o777));
            report.push_str(&format!("- UID: {}\n", meta.uid()));
            report.push_str(&format!("- GID: {}\n", meta.gid()));
            report.push_str(&format!(
                "- Owner: {}\n",
                user_name(meta.uid()).unwrap_or_else(|| meta.uid().to_string())
            ));
            report.push_str(&format!(
                "- Group: {}\n",
                group_name(meta.gid()).unwrap_or_else(|| meta.gid().to_string())
            ));
        }

        CommandOutcome::Applied(report)
    }

    /// Size of a file, or total size and file count of a directory tree.
    pub fn file_size(&self, path: &str) -> CommandOutcome {
        let target = Path::new(path);
        if target.is_file() {
            return match fs::metadata(target) {
                Ok(meta) => CommandOutcome::Applied(format!(
                    "File size of '{}' is {} bytes ({}).",
                    path,
                    meta.len(),
                    readable_size(meta.len())
                )),
                Err(err) => {
                    CommandOutcome::Failed(format!("Failed to stat '{}': {}", path, err))
                }
            };
        }
        if target.is_dir() {
            let mut total_size = 0u64;
            let mut total_files = 0u64;
            for dir_entry in WalkDir::new(target).into_iter().filter_map(Result::ok) {
                if dir_entry.file_type().is_file() {
                    if let Ok(meta) = dir_entry.metadata() {
                        total_size += meta.len();
                        total_files += 1;
                    }
                }
            }
            return CommandOutcome::Applied(format!(
                "Total size of '{}' is {} bytes ({}) across {} files.",
                path,
                total_size,
                readable_size(total_size),
                total_files
            ));
        }
        CommandOutcome::Failed(format!("'{}' is not a file or directory.", path))
    }

    /// Change permissions of a file, or of a directory tree recursively.
    /// `mode` is octal text, e.g. `"755"`.
    #[cfg(not(unix))]
    pub fn change_permissions(&self, _path: &str, _mode: &str) -> CommandOutcome {
        CommandOutcome::Failed("Permission changes are only supported on Unix.".to_string())
    }

    /// Change permissions of a file, or of a directory tree recursively.
    /// `mode` is octal text, e.g. `"755"`.
    #[cfg(unix)]
    pub fn change_permissions(&self, path: &str, mode: &str) -> CommandOutcome {
        use std::os::unix::fs::PermissionsExt;

        let parsed = match u32::from_str_radix(mode, 8) {
            Ok(parsed) => parsed,
            Err(_) => {
                return CommandOutcome::Failed(format!("Invalid octal permissions: '{}'", mode))
            }
        };
        let target = Path::new(path);

        let apply = |p: &Path| fs::set_permissions(p, fs::Permissions::from_mode(parsed));
        let result = if target.is_file() {
            apply(target)
        } else if target.is_dir() {
            let mut result = Ok(());
            for dir_entry in WalkDir::new(target).into_iter().filter_map(Result::ok) {
                result = apply(dir_entry.path());
                if result.is_err() {
                    break;
                }
            }
            result
        } else {
            return CommandOutcome::Failed(format!("'{}' is not a file or directory.", path));
        };

        match result {
            Ok(()) => CommandOutcome::Applied(format!(
                "Changed permissions of '{}' to {} recursively.",
                path, mode
            )),
            Err(err) => CommandOutcome::Failed(format!(
                "Failed to change permissions of '{}': {}",
                path, err
            )),
        }
    }

    /// Change owner and group of a file or directory by name.
    #[cfg(not(unix))]
    pub fn change_owner(&self, _path: &str, _owner: &str, _group: &str) -> CommandOutcome {
        CommandOutcome::Failed("Ownership changes are only supported on Unix.".to_string())
    }

    /// Change owner and group of a file or directory by name.
    #[cfg(unix)]
    pub fn change_owner(&self, path: &str, owner: &str, group: &str) -> CommandOutcome {
        let uid = match uid_for(owner) {
            Some(uid) => uid,
            None => return CommandOutcome::Failed(format!("Unknown user: '{}'", owner)),
        };
        let gid = match gid_for(group) {
            Some(gid) => gid,
            None => return CommandOutcome::Failed(format!("Unknown group: '{}'", group)),
        };
        match std::os::unix::fs::chown(path, Some(uid), Some(gid)) {
            Ok(()) => CommandOutcome::Applied(format!(
                "Changed owner and group of '{}' to {}:{}.",
                path, owner, group
            )),
            Err(err) => CommandOutcome::Failed(format!(
                "Failed to change owner of '{}': {}",
                path, err
            )),
        }
    }
}

fn create_parent_dirs(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn format_timestamp(time: Option<std::time::SystemTime>) -> String {
    match time {
        Some(time) => chrono::DateTime::<chrono::Local>::from(time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "n/a".to_string(),
    }
}

#[cfg(unix)]
fn user_name(uid: u32) -> Option<String> {
    // getpwuid hands back libc-owned static storage; copy out immediately.
    unsafe {
        let pw = libc::getpwuid(uid);
        if pw.is_null() {
            return None;
        }
        Some(
            std::ffi::CStr::from_ptr((*pw).pw_name)
                .to_string_lossy()
                .into_owned(),
        )
    }
}

#[cfg(unix)]
fn group_name(gid: u32) -> Option<String> {
    unsafe {
        let gr = libc::getgrgid(gid);
        if gr.is_null() {
            return None;
        }
        Some(
            std::ffi::CStr::from_ptr((*gr).gr_name)
                .to_string_lossy()
                .into_owned(),
        )
    }
}

#[cfg(unix)]
fn uid_for(owner: &str) -> Option<u32> {
    let name = std::ffi::CString::new(owner).ok()?;
    unsafe {
        let pw = libc::getpwnam(name.as_ptr());
        if pw.is_null() {
            None
        } else {
            Some((*pw).pw_uid)
        }
    }
}

#[cfg(unix)]
fn gid_for(group: &str) -> Option<u32> {
    let name = std::ffi::CString::new(group).ok()?;
    unsafe {
        let gr = libc::getgrnam(name.as_ptr());
        if gr.is_null() {
            None
        } else {
            Some((*gr).gr_gid)
        }
    }
}
