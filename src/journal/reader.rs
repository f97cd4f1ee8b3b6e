//! Line-by-line journal reading.

use crate::error::JournalError;
use crate::journal::entry::LogEntry;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Iterator over journal entries in strict file order.
///
/// A missing journal file yields an empty sequence rather than an error: a
/// fresh workspace simply has no history yet. The sequence is restartable by
/// opening a new reader, which re-reads the file from the start.
pub struct LogReader {
    lines: Option<Lines<BufReader<File>>>,
    line_no: usize,
}

impl LogReader {
    /// Open the journal at `path`.
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        let lines = match File::open(path) {
            Ok(file) => Some(BufReader::new(file).lines()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(JournalError::Io(err)),
        };
        Ok(LogReader { lines, line_no: 0 })
    }
}

impl Iterator for LogReader {
    type Item = Result<LogEntry, JournalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let lines = self.lines.as_mut()?;
        loop {
            let raw = match lines.next()? {
                Ok(raw) => raw,
                Err(err) => return Some(Err(JournalError::Io(err))),
            };
            self.line_no += 1;
            match LogEntry::parse_line(&raw, self.line_no) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
