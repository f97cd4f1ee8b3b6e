use opkit::commands::git::GitCommandService;
use tempfile::TempDir;

/// Initialize a repository with a committer identity and one initial commit.
/// Returns the repo path and the initial branch name.
fn seeded_repo(dir: &TempDir) -> (String, String) {
    let repo_path = dir.path().join("repo").to_string_lossy().into_owned();
    assert!(GitCommandService::init_repository(&repo_path).is_applied());

    let repo = git2::Repository::open(&repo_path).unwrap();
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Opkit Test").unwrap();
    config.set_str("user.email", "opkit@example.com").unwrap();

    std::fs::write(dir.path().join("repo/a.txt"), "first\n").unwrap();
    assert!(GitCommandService::add(&repo_path, "a.txt").is_applied());
    assert!(GitCommandService::commit(&repo_path, "initial commit").is_applied());

    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    (repo_path, branch)
}

#[test]
fn init_add_commit_status_log_flow() {
    let dir = TempDir::new().unwrap();
    let (repo_path, branch) = seeded_repo(&dir);

    std::fs::write(dir.path().join("repo/b.txt"), "untracked\n").unwrap();
    let status = GitCommandService::status(&repo_path);
    assert!(status.is_applied());
    assert!(status.message().contains(&format!("Current branch: {}", branch)));
    assert!(status.message().contains("b.txt"));

    let log = GitCommandService::log(&repo_path, 25);
    assert!(log.is_applied());
    assert!(log.message().contains("Message: initial commit"));
    assert!(log.message().contains("Author: Opkit Test <opkit@example.com>"));
}

#[test]
fn checkout_creates_missing_branches_and_switches_back() {
    let dir = TempDir::new().unwrap();
    let (repo_path, branch) = seeded_repo(&dir);

    let outcome = GitCommandService::checkout_branch(&repo_path, "feature");
    assert!(outcome.is_applied());
    assert!(outcome.message().contains("Created a new branch 'feature'"));

    let outcome = GitCommandService::checkout_branch(&repo_path, &branch);
    assert!(outcome.is_applied());
    assert!(outcome.message().contains(&format!("Switched to the branch '{}'", branch)));
}

#[test]
fn merge_fast_forwards_when_current_branch_has_not_moved() {
    let dir = TempDir::new().unwrap();
    let (repo_path, branch) = seeded_repo(&dir);

    GitCommandService::checkout_branch(&repo_path, "feature");
    std::fs::write(dir.path().join("repo/feature.txt"), "feature work\n").unwrap();
    GitCommandService::add(&repo_path, "feature.txt");
    GitCommandService::commit(&repo_path, "feature commit");

    GitCommandService::checkout_branch(&repo_path, &branch);
    let outcome = GitCommandService::merge_branch(&repo_path, "feature");
    assert!(outcome.is_applied());
    assert!(outcome.message().contains("Fast-forwarded"));
    assert!(dir.path().join("repo/feature.txt").exists());
}

#[test]
fn merge_of_diverged_branches_creates_a_merge_commit() {
    let dir = TempDir::new().unwrap();
    let (repo_path, branch) = seeded_repo(&dir);

    GitCommandService::checkout_branch(&repo_path, "feature");
    std::fs::write(dir.path().join("repo/feature.txt"), "feature work\n").unwrap();
    GitCommandService::add(&repo_path, "feature.txt");
    GitCommandService::commit(&repo_path, "feature commit");

    GitCommandService::checkout_branch(&repo_path, &branch);
    std::fs::write(dir.path().join("repo/main.txt"), "main work\n").unwrap();
    GitCommandService::add(&repo_path, "main.txt");
    GitCommandService::commit(&repo_path, "main commit");

    let outcome = GitCommandService::merge_branch(&repo_path, "feature");
    assert!(outcome.is_applied(), "merge failed: {}", outcome.message());
    assert!(outcome
        .message()
        .contains(&format!("merged branch 'feature' into '{}'", branch)));
    assert!(dir.path().join("repo/feature.txt").exists());
    assert!(dir.path().join("repo/main.txt").exists());

    let log = GitCommandService::log(&repo_path, 5);
    assert!(log.message().contains("Merged branch 'feature'"));
}

#[test]
fn merge_of_unknown_branch_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let (repo_path, _) = seeded_repo(&dir);
    let outcome = GitCommandService::merge_branch(&repo_path, "missing");
    assert!(outcome.is_failed());
    assert!(outcome.message().contains("Branch 'missing' not found."));
}

#[test]
fn unstage_removes_a_file_from_the_index() {
    let dir = TempDir::new().unwrap();
    let (repo_path, _) = seeded_repo(&dir);

    std::fs::write(dir.path().join("repo/staged.txt"), "staged\n").unwrap();
    assert!(GitCommandService::add(&repo_path, "staged.txt").is_applied());
    assert!(GitCommandService::remove(&repo_path, "staged.txt").is_applied());

    let status = GitCommandService::status(&repo_path);
    assert!(status.message().contains("Untracked files:"));
    assert!(status.message().contains("staged.txt"));
}

#[test]
fn clone_and_pull_between_local_repositories() {
    let dir = TempDir::new().unwrap();
    let (origin_path, branch) = seeded_repo(&dir);

    let clone_path = dir.path().join("clone").to_string_lossy().into_owned();
    let outcome = GitCommandService::clone_repository(&origin_path, &clone_path);
    assert!(outcome.is_applied(), "clone failed: {}", outcome.message());
    assert!(dir.path().join("clone/a.txt").exists());

    // New upstream commit, then pull into the clone.
    std::fs::write(dir.path().join("repo/a.txt"), "first\nsecond\n").unwrap();
    GitCommandService::add(&origin_path, "a.txt");
    GitCommandService::commit(&origin_path, "second commit");

    let repo = git2::Repository::open(&clone_path).unwrap();
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Opkit Test").unwrap();
    config.set_str("user.email", "opkit@example.com").unwrap();

    let outcome = GitCommandService::pull(&clone_path, "origin", &branch);
    assert!(outcome.is_applied(), "pull failed: {}", outcome.message());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("clone/a.txt")).unwrap(),
        "first\nsecond\n"
    );
}
