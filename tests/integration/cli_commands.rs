use opkit::tooling::cli::{CliContext, Commands, DirCommands, JournalCommands};
use tempfile::TempDir;

fn context(dir: &TempDir) -> CliContext {
    CliContext::new(dir.path().to_path_buf(), None).unwrap()
}

#[test]
fn write_read_delete_flow_through_the_cli() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let path = dir.path().join("f.txt").to_string_lossy().into_owned();

    let output = cli
        .execute(&Commands::Write {
            path: path.clone(),
            text: "hello".to_string(),
        })
        .unwrap();
    assert_eq!(output, "File written successfully.");

    let output = cli
        .execute(&Commands::Write {
            path: path.clone(),
            text: "hello".to_string(),
        })
        .unwrap();
    assert_eq!(output, "File has already been updated.");

    let output = cli
        .execute(&Commands::Read { path: path.clone() })
        .unwrap();
    assert_eq!(output, "hello");

    let output = cli.execute(&Commands::Delete { path: path.clone() }).unwrap();
    assert_eq!(output, "File deleted successfully.");
    let output = cli.execute(&Commands::Delete { path }).unwrap();
    assert_eq!(output, "File has already been deleted.");
}

#[test]
fn journal_state_json_contract_has_tracked_paths() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let path = dir.path().join("tracked.txt").to_string_lossy().into_owned();

    cli.execute(&Commands::Write {
        path: path.clone(),
        text: "content".to_string(),
    })
    .unwrap();

    let output = cli
        .execute(&Commands::Journal {
            command: JournalCommands::State {
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let checksum = parsed.get(path.as_str()).and_then(|v| v.as_str());
    assert!(checksum.is_some());
    assert_eq!(checksum.unwrap().len(), 32);
}

#[test]
fn journal_entries_json_contract_lists_operations_in_order() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let path = dir.path().join("f.txt").to_string_lossy().into_owned();

    cli.execute(&Commands::Write {
        path: path.clone(),
        text: "one".to_string(),
    })
    .unwrap();
    cli.execute(&Commands::Append {
        path: path.clone(),
        text: "two".to_string(),
    })
    .unwrap();
    cli.execute(&Commands::Delete { path }).unwrap();

    let output = cli
        .execute(&Commands::Journal {
            command: JournalCommands::Entries {
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let entries = parsed.as_array().expect("entries array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["operation"], "write");
    assert_eq!(entries[1]["operation"], "append");
    assert_eq!(entries[2]["operation"], "delete");
    assert!(entries[2]["checksum"].is_null());
}

#[test]
fn list_reports_workspace_relative_paths() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    std::fs::create_dir_all(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub/file.txt"), "x").unwrap();
    std::fs::write(dir.path().join(".hidden"), "x").unwrap();

    let output = cli
        .execute(&Commands::List {
            directory: dir.path().to_string_lossy().into_owned(),
            format: "json".to_string(),
        })
        .unwrap();
    let files: Vec<String> = serde_json::from_str(&output).unwrap();
    assert_eq!(files, vec!["sub/file.txt".to_string()]);
}

#[test]
fn dir_commands_round_trip() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let nested = dir.path().join("a/b").to_string_lossy().into_owned();

    let output = cli
        .execute(&Commands::Dir {
            command: DirCommands::Create {
                path: nested.clone(),
            },
        })
        .unwrap();
    assert!(output.contains("created"));

    let output = cli
        .execute(&Commands::Dir {
            command: DirCommands::Delete { path: nested },
        })
        .unwrap();
    assert!(output.contains("deleted"));
}

#[test]
fn init_writes_a_default_config_once() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);

    let output = cli.execute(&Commands::Init { force: false }).unwrap();
    assert!(output.contains("Wrote default configuration"));
    assert!(dir.path().join("opkit.toml").exists());

    let output = cli.execute(&Commands::Init { force: false }).unwrap();
    assert!(output.contains("already exists"));
}

#[test]
fn ingest_rejects_inverted_windowing() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let path = dir.path().join("doc.txt").to_string_lossy().into_owned();
    std::fs::write(dir.path().join("doc.txt"), "text").unwrap();

    let result = cli.execute(&Commands::Ingest {
        path,
        max_chunk_len: Some(10),
        overlap: Some(10),
    });
    assert!(result.is_err());
}

#[test]
fn unsupported_compress_format_is_an_error() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let result = cli.execute(&Commands::Compress {
        paths: vec![dir.path().join("x").to_string_lossy().into_owned()],
        format: "rar".to_string(),
        output: dir.path().join("out").to_string_lossy().into_owned(),
    });
    assert!(result.is_err());
}

#[test]
fn workspace_config_strict_reconstruction_is_honored() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("opkit.toml"),
        "[journal]\nstrict_reconstruction = true\n",
    )
    .unwrap();
    std::fs::create_dir_all(dir.path().join(".opkit")).unwrap();
    std::fs::write(
        dir.path().join(".opkit/operations.log"),
        "delete: ghost.txt\n",
    )
    .unwrap();

    let cli = context(&dir);
    let result = cli.execute(&Commands::Journal {
        command: JournalCommands::State {
            format: "json".to_string(),
        },
    });
    assert!(result.is_err());
}
