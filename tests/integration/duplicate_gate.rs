use opkit::commands::files::FileCommandService;
use opkit::journal::{text_checksum, OperationJournal};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    journal: OperationJournal,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let journal = OperationJournal::new(dir.path().join(".opkit/operations.log"));
        Workspace { dir, journal }
    }

    fn service(&self) -> FileCommandService<'_> {
        FileCommandService::new(&self.journal, self.dir.path())
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }
}

#[test]
fn second_identical_write_is_a_noop_on_disk_and_in_the_journal() {
    let ws = Workspace::new();
    let service = ws.service();
    let path = ws.path("f.txt");

    assert!(service.write_file(&path, "hello").unwrap().is_applied());
    let mtime_before = std::fs::metadata(&path).unwrap().modified().unwrap();
    let entries_before = ws.journal.entries().unwrap().len();

    let second = service.write_file(&path, "hello").unwrap();
    assert!(second.is_skipped());
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), mtime_before);
    assert_eq!(ws.journal.entries().unwrap().len(), entries_before);
}

#[test]
fn hello_write_logs_the_md5_digest() {
    let ws = Workspace::new();
    let service = ws.service();
    let path = ws.path("f.txt");

    assert_eq!(text_checksum("hello"), "5d41402abc4b2a76b9719d911017c592");
    assert!(service.write_file(&path, "hello").unwrap().is_applied());

    let entries = ws.journal.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].checksum.as_deref(),
        Some("5d41402abc4b2a76b9719d911017c592")
    );

    assert!(service.write_file(&path, "hello").unwrap().is_skipped());
}

#[test]
fn delete_after_delete_is_reported_as_duplicate() {
    let ws = Workspace::new();
    let service = ws.service();
    let path = ws.path("f.txt");

    service.write_file(&path, "x").unwrap();
    assert!(service.delete_file(&path).unwrap().is_applied());
    assert!(service.delete_file(&path).unwrap().is_skipped());
}

#[test]
fn identical_appends_both_execute_and_both_journal() {
    let ws = Workspace::new();
    let service = ws.service();
    let path = ws.path("log.txt");

    assert!(service.append_file(&path, "entry\n").unwrap().is_applied());
    assert!(service.append_file(&path, "entry\n").unwrap().is_applied());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "entry\nentry\n");
    assert_eq!(ws.journal.entries().unwrap().len(), 2);
}

#[test]
fn fold_is_deterministic_across_repeated_reconstruction() {
    let ws = Workspace::new();
    let service = ws.service();

    service.write_file(&ws.path("a.txt"), "one").unwrap();
    service.append_file(&ws.path("a.txt"), " more").unwrap();
    service.write_file(&ws.path("b.txt"), "two").unwrap();
    service.delete_file(&ws.path("b.txt")).unwrap();

    let first = ws.journal.state().unwrap();
    let second = ws.journal.state().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[test]
fn gate_observes_entries_appended_between_calls() {
    // No caching across calls: an entry recorded by "another process" after
    // construction is still seen by the next duplicate check.
    let ws = Workspace::new();
    let service = ws.service();
    let path = ws.path("f.txt");
    let checksum = text_checksum("payload");

    assert!(!ws
        .journal
        .is_duplicate(opkit::journal::Operation::Write, &path, Some(&checksum))
        .unwrap());

    let other = OperationJournal::new(ws.journal.log_path());
    other
        .record(opkit::journal::Operation::Write, &path, Some(&checksum))
        .unwrap();

    assert!(service.write_file(&path, "payload").unwrap().is_skipped());
}
