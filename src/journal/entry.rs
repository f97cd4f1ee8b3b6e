//! Journal entries and the line-oriented wire format.

use crate::error::JournalError;
use serde::{Deserialize, Serialize};

/// Decorative marker older toolkit versions prepended to journal lines.
/// Stripped from every line before parsing so historical logs stay readable.
pub const LEGACY_LINE_MARKER: &str = "File Operation Logger";

/// Kind of a journaled mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Write,
    Append,
    Delete,
}

impl Operation {
    /// Wire token for this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Write => "write",
            Operation::Append => "append",
            Operation::Delete => "delete",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "write" => Some(Operation::Write),
            "append" => Some(Operation::Append),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded mutation. The path is kept verbatim as supplied by the
/// caller, never normalized or canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub operation: Operation,
    pub path: String,
    /// Present for write/append, always absent for delete.
    pub checksum: Option<String>,
}

impl LogEntry {
    pub fn new(operation: Operation, path: impl Into<String>, checksum: Option<String>) -> Self {
        LogEntry {
            operation,
            path: path.into(),
            checksum,
        }
    }

    /// Render the wire line for this entry (no trailing newline).
    pub fn to_line(&self) -> String {
        match &self.checksum {
            Some(sum) => format!("{}: {} #{}", self.operation, self.path, sum),
            None => format!("{}: {}", self.operation, self.path),
        }
    }

    /// Parse one journal line; `line_no` is 1-based and used for error
    /// reporting. Returns `Ok(None)` for lines that are blank once the legacy
    /// marker is stripped.
    ///
    /// The checksum split uses the rightmost ` #` so paths containing `#`
    /// survive. Delete payloads are taken verbatim: a delete line never
    /// carries a checksum, whatever the path looks like.
    pub fn parse_line(raw: &str, line_no: usize) -> Result<Option<Self>, JournalError> {
        let line = raw.replace(LEGACY_LINE_MARKER, "");
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let malformed = || JournalError::MalformedLine {
            line: line_no,
            content: line.to_string(),
        };
        let (token, tail) = line.split_once(": ").ok_or_else(malformed)?;
        let operation = Operation::from_token(token.trim()).ok_or_else(malformed)?;

        let entry = match operation {
            Operation::Write | Operation::Append => match tail.rsplit_once(" #") {
                Some((path, sum)) => {
                    LogEntry::new(operation, path.trim(), Some(sum.trim().to_string()))
                }
                None => LogEntry::new(operation, tail.trim(), None),
            },
            Operation::Delete => LogEntry::new(operation, tail.trim(), None),
        };
        Ok(Some(entry))
    }
}
