use opkit::journal::{
    reconstruct, text_checksum, DeletePolicy, LogEntry, LogReader, Operation, OperationJournal,
};
use tempfile::TempDir;

fn journal_in(dir: &TempDir) -> OperationJournal {
    OperationJournal::new(dir.path().join(".opkit/operations.log"))
}

#[test]
fn writer_reader_round_trip_preserves_entries() {
    let dir = TempDir::new().unwrap();
    let journal = journal_in(&dir);

    journal
        .record(Operation::Write, "src/main.rs", Some("5d41402abc4b2a76b9719d911017c592"))
        .unwrap();
    journal
        .record(Operation::Append, "notes/issue #42.md", Some("abc123"))
        .unwrap();
    journal.record(Operation::Delete, "tmp/#cache", None).unwrap();

    let entries = journal.entries().unwrap();
    assert_eq!(
        entries,
        vec![
            LogEntry::new(
                Operation::Write,
                "src/main.rs",
                Some("5d41402abc4b2a76b9719d911017c592".to_string())
            ),
            LogEntry::new(
                Operation::Append,
                "notes/issue #42.md",
                Some("abc123".to_string())
            ),
            LogEntry::new(Operation::Delete, "tmp/#cache", None),
        ]
    );
}

#[test]
fn on_disk_format_matches_the_documented_lines() {
    let dir = TempDir::new().unwrap();
    let journal = journal_in(&dir);
    journal
        .record(Operation::Write, "f.txt", Some(&text_checksum("hello")))
        .unwrap();
    journal.record(Operation::Delete, "f.txt", None).unwrap();

    let raw = std::fs::read_to_string(journal.log_path()).unwrap();
    assert_eq!(
        raw,
        "write: f.txt #5d41402abc4b2a76b9719d911017c592\ndelete: f.txt\n"
    );
}

#[test]
fn missing_log_reconstructs_to_empty_history() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("never-created.log");
    let state = reconstruct(LogReader::open(&log_path).unwrap(), DeletePolicy::Ignore).unwrap();
    assert!(state.is_empty());
}

#[test]
fn legacy_marker_lines_parse_like_unmarked_lines() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("operations.log");
    std::fs::write(
        &log_path,
        "File Operation Logger write: a.txt #aa\nwrite: b.txt #bb\n",
    )
    .unwrap();

    let entries: Result<Vec<_>, _> = LogReader::open(&log_path).unwrap().collect();
    let entries = entries.unwrap();
    assert_eq!(entries[0], LogEntry::new(Operation::Write, "a.txt", Some("aa".to_string())));
    assert_eq!(entries[1], LogEntry::new(Operation::Write, "b.txt", Some("bb".to_string())));
}

#[test]
fn malformed_line_aborts_the_whole_reconstruction() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("operations.log");
    std::fs::write(&log_path, "write: a.txt #aa\nnot a journal line\nwrite: b.txt #bb\n").unwrap();

    let result = reconstruct(LogReader::open(&log_path).unwrap(), DeletePolicy::Ignore);
    assert!(result.is_err());
}

#[test]
fn write_then_delete_leaves_path_untracked() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("operations.log");
    std::fs::write(
        &log_path,
        "write: a.txt #d41d8cd98f00b204e9800998ecf8427e\ndelete: a.txt\n",
    )
    .unwrap();

    let journal = OperationJournal::new(&log_path);
    let state = journal.state().unwrap();
    assert!(!state.contains_key("a.txt"));
    assert!(journal.is_duplicate(Operation::Delete, "a.txt", None).unwrap());
    assert!(!journal
        .is_duplicate(Operation::Write, "a.txt", Some("d41d8cd98f00b204e9800998ecf8427e"))
        .unwrap());
}

#[test]
fn strict_policy_rejects_untracked_delete_while_default_ignores_it() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("operations.log");
    std::fs::write(&log_path, "delete: never-written.txt\nwrite: a.txt #aa\n").unwrap();

    let permissive = OperationJournal::new(&log_path);
    let state = permissive.state().unwrap();
    assert_eq!(state.len(), 1);
    assert!(!permissive.is_duplicate(Operation::Write, "a.txt", Some("bb")).unwrap());

    let strict = OperationJournal::new(&log_path).with_delete_policy(DeletePolicy::Strict);
    assert!(strict.state().is_err());
    assert!(strict.is_duplicate(Operation::Write, "a.txt", Some("aa")).is_err());
}
