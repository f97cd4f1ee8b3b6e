//! File ingestion into a chunked memory store.
//!
//! Large file contents are split into overlapping fixed-size windows and
//! forwarded, labeled, to a caller-supplied [`MemorySink`].

use crate::commands::CommandOutcome;
use std::fs;
use tracing::{debug, info};

/// Content-addressable chunked-memory collaborator fed by ingestion.
pub trait MemorySink {
    fn add(&mut self, text: String);
}

impl MemorySink for Vec<String> {
    fn add(&mut self, text: String) {
        self.push(text);
    }
}

/// Split `content` into windows of roughly `max_len` characters with
/// `overlap` characters shared between consecutive windows.
///
/// Windows are character-based, so multi-byte text never splits inside a
/// code point. The final window is dropped when the previous window's
/// overlap already covers it. Callers must keep `overlap < max_len`
/// (enforced at configuration load); the degenerate cases return no chunks.
pub fn split_text(content: &str, max_len: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let total = chars.len();
    if max_len == 0 || overlap >= max_len {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < total {
        let end = start + max_len;
        if end + overlap < total {
            chunks.push(chars[start..end + overlap - 1].iter().collect());
        } else {
            if total - start <= overlap {
                break;
            }
            chunks.push(chars[start..].iter().collect());
        }
        start += max_len - overlap;
    }
    chunks
}

/// Read `path`, window its contents, and forward labeled chunks to `sink`.
pub fn ingest_file(
    path: &str,
    sink: &mut dyn MemorySink,
    max_len: usize,
    overlap: usize,
) -> CommandOutcome {
    info!(path, "ingesting file");
    let content = match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            return CommandOutcome::Failed(format!("Failed to ingest '{}': {}", path, err))
        }
    };
    debug!(chars = content.chars().count(), "file length");

    let chunks = split_text(&content, max_len, overlap);
    let total = chunks.len();
    for (index, chunk) in chunks.into_iter().enumerate() {
        debug!(chunk = index + 1, total, "ingesting chunk");
        sink.add(format!(
            "Filename: {}\nContent part#{}/{}: {}",
            path,
            index + 1,
            total,
            chunk
        ));
    }

    CommandOutcome::Applied(format!("Ingested {} chunks from {}.", total, path))
}
