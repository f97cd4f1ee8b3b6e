use opkit::journal::{reconstruct, DeletePolicy, LogEntry, LogReader, Operation, OperationJournal};
use proptest::prelude::*;

/// Paths the writer can produce verbatim: no whitespace at the edges, no
/// newlines, `#` and `/` allowed anywhere.
fn path_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_][a-zA-Z0-9_/#.-]{0,24}"
}

fn checksum_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{32}"
}

fn entry_strategy() -> impl Strategy<Value = LogEntry> {
    prop_oneof![
        (path_strategy(), checksum_strategy())
            .prop_map(|(path, sum)| LogEntry::new(Operation::Write, path, Some(sum))),
        (path_strategy(), checksum_strategy())
            .prop_map(|(path, sum)| LogEntry::new(Operation::Append, path, Some(sum))),
        path_strategy().prop_map(|path| LogEntry::new(Operation::Delete, path, None)),
    ]
}

proptest! {
    #[test]
    fn recorded_entries_read_back_identically(entries in prop::collection::vec(entry_strategy(), 0..24)) {
        let dir = tempfile::tempdir().unwrap();
        let journal = OperationJournal::new(dir.path().join("operations.log"));
        for entry in &entries {
            journal.record(entry.operation, &entry.path, entry.checksum.as_deref()).unwrap();
        }
        let read_back = journal.entries().unwrap();
        prop_assert_eq!(read_back, entries);
    }

    #[test]
    fn reconstruction_is_deterministic(entries in prop::collection::vec(entry_strategy(), 0..24)) {
        let dir = tempfile::tempdir().unwrap();
        let journal = OperationJournal::new(dir.path().join("operations.log"));
        for entry in &entries {
            journal.record(entry.operation, &entry.path, entry.checksum.as_deref()).unwrap();
        }
        let first = reconstruct(
            LogReader::open(journal.log_path()).unwrap(),
            DeletePolicy::Ignore,
        ).unwrap();
        let second = reconstruct(
            LogReader::open(journal.log_path()).unwrap(),
            DeletePolicy::Ignore,
        ).unwrap();
        prop_assert_eq!(&first, &second);

        // In-memory fold of the same sequence agrees with the file fold.
        let third = reconstruct(entries.iter().cloned().map(Ok), DeletePolicy::Ignore).unwrap();
        prop_assert_eq!(first, third);
    }
}
