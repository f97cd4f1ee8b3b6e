//! Version-control commands.
//!
//! Thin porcelain over `git2` against a local working tree, plus pull-request
//! creation against the GitHub REST API. Remotes are expected to carry any
//! credentials they need (embedded in the URL or ambient git configuration);
//! this layer does not manage authentication. None of these are journaled.

use crate::commands::CommandOutcome;
use anyhow::{bail, Context as _};
use git2::{BranchType, Repository, Status, StatusOptions};
use std::path::Path;
use tracing::info;

/// Git command service. Stateless; every call opens the repository fresh.
pub struct GitCommandService;

impl GitCommandService {
    /// Clone a repository to a local path.
    pub fn clone_repository(url: &str, clone_path: &str) -> CommandOutcome {
        outcome(
            Repository::clone(url, clone_path)
                .map(|_| format!("Cloned {} to {}", url, clone_path))
                .with_context(|| format!("failed to clone {}", url)),
        )
    }

    /// Initialize a new repository.
    pub fn init_repository(repo_path: &str) -> CommandOutcome {
        outcome(
            Repository::init(repo_path)
                .map(|_| format!("Initialized a new git repository at {}", repo_path))
                .with_context(|| format!("failed to init {}", repo_path)),
        )
    }

    /// Stage a file.
    pub fn add(repo_path: &str, file_path: &str) -> CommandOutcome {
        outcome(try_add(repo_path, file_path))
    }

    /// Unstage a file.
    pub fn remove(repo_path: &str, file_path: &str) -> CommandOutcome {
        outcome(try_remove(repo_path, file_path))
    }

    /// Commit the index.
    pub fn commit(repo_path: &str, message: &str) -> CommandOutcome {
        outcome(try_commit(repo_path, message))
    }

    /// Push HEAD to a remote branch.
    pub fn push(repo_path: &str, remote_name: &str, branch_name: &str) -> CommandOutcome {
        outcome(try_push(repo_path, remote_name, branch_name))
    }

    /// Fetch a remote branch and integrate it (fast-forward or merge commit).
    pub fn pull(repo_path: &str, remote_name: &str, branch_name: &str) -> CommandOutcome {
        outcome(try_pull(repo_path, remote_name, branch_name))
    }

    /// Switch to a branch, creating it from HEAD when missing.
    pub fn checkout_branch(repo_path: &str, branch_name: &str) -> CommandOutcome {
        outcome(try_checkout(repo_path, branch_name))
    }

    /// Merge a local branch into the current branch.
    pub fn merge_branch(repo_path: &str, branch_name: &str) -> CommandOutcome {
        outcome(try_merge(repo_path, branch_name))
    }

    /// Current branch, changed files, and untracked files.
    pub fn status(repo_path: &str) -> CommandOutcome {
        outcome(try_status(repo_path))
    }

    /// The last `max_count` commits on HEAD.
    pub fn log(repo_path: &str, max_count: usize) -> CommandOutcome {
        outcome(try_log(repo_path, max_count))
    }

    /// Open a pull request on GitHub for the repository's `origin` remote.
    pub fn create_pull_request(
        repo_path: &str,
        base_branch: &str,
        head_branch: &str,
        title: &str,
        body: &str,
        token: &str,
    ) -> CommandOutcome {
        outcome(try_create_pull_request(
            repo_path,
            base_branch,
            head_branch,
            title,
            body,
            token,
        ))
    }
}

fn outcome(result: anyhow::Result<String>) -> CommandOutcome {
    match result {
        Ok(message) => CommandOutcome::Applied(message),
        Err(err) => CommandOutcome::Failed(format!("{:#}", err)),
    }
}

fn open(repo_path: &str) -> anyhow::Result<Repository> {
    Repository::open(repo_path)
        .with_context(|| format!("failed to open repository at {}", repo_path))
}

fn try_add(repo_path: &str, file_path: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let mut index = repo.index()?;
    index
        .add_path(Path::new(file_path))
        .with_context(|| format!("failed to stage {}", file_path))?;
    index.write()?;
    Ok(format!("Added {} to the staging area", file_path))
}

fn try_remove(repo_path: &str, file_path: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let mut index = repo.index()?;
    index
        .remove_path(Path::new(file_path))
        .with_context(|| format!("failed to unstage {}", file_path))?;
    index.write()?;
    Ok(format!("Removed {} from the staging area", file_path))
}

fn try_commit(repo_path: &str, message: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let signature = repo.signature().context("no committer identity configured")?;
    let mut index = repo.index()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    // First commit on an unborn branch has no parent.
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
    info!(repo = repo_path, "commit created");
    Ok(format!("Committed changes with message: {}", message))
}

fn try_push(repo_path: &str, remote_name: &str, branch_name: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let mut remote = repo
        .find_remote(remote_name)
        .with_context(|| format!("remote '{}' not found", remote_name))?;
    remote
        .push(&[format!("HEAD:refs/heads/{}", branch_name)], None)
        .with_context(|| format!("failed to push to {}/{}", remote_name, branch_name))?;
    Ok(format!("Pushed changes to {}/{}", remote_name, branch_name))
}

fn try_pull(repo_path: &str, remote_name: &str, branch_name: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let mut remote = repo
        .find_remote(remote_name)
        .with_context(|| format!("remote '{}' not found", remote_name))?;
    remote
        .fetch(&[branch_name], None, None)
        .with_context(|| format!("failed to fetch {}/{}", remote_name, branch_name))?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        return Ok("Already up to date.".to_string());
    }
    if analysis.is_fast_forward() {
        let refname = format!("refs/heads/{}", branch_name);
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "fast-forward")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(format!(
            "Fast-forwarded to {}/{}",
            remote_name, branch_name
        ));
    }

    merge_annotated(
        &repo,
        &fetch_commit,
        &format!("Merged {}/{} into HEAD", remote_name, branch_name),
    )?;
    Ok(format!("Pulled changes from {}/{}", remote_name, branch_name))
}

fn try_checkout(repo_path: &str, branch_name: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let refname = format!("refs/heads/{}", branch_name);

    let created = match repo.find_branch(branch_name, BranchType::Local) {
        Ok(_) => false,
        Err(_) => {
            let head_commit = repo
                .head()
                .context("repository has no commits to branch from")?
                .peel_to_commit()?;
            repo.branch(branch_name, &head_commit, false)?;
            true
        }
    };

    repo.set_head(&refname)?;
    repo.checkout_head(Some(git2::build::CheckoutBuilder::default().safe()))?;
    if created {
        Ok(format!(
            "Created a new branch '{}' and switched to it.",
            branch_name
        ))
    } else {
        Ok(format!("Switched to the branch '{}'.", branch_name))
    }
}

fn try_merge(repo_path: &str, branch_name: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let branch = match repo.find_branch(branch_name, BranchType::Local) {
        Ok(branch) => branch,
        Err(_) => bail!("Branch '{}' not found.", branch_name),
    };
    let current = repo
        .head()?
        .shorthand()
        .unwrap_or("HEAD")
        .to_string();
    let annotated = repo.reference_to_annotated_commit(branch.get())?;
    let (analysis, _) = repo.merge_analysis(&[&annotated])?;

    if analysis.is_up_to_date() {
        return Ok("Already up to date.".to_string());
    }
    if analysis.is_fast_forward() {
        let refname = format!("refs/heads/{}", current);
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(annotated.id(), "fast-forward")?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(format!(
            "Fast-forwarded '{}' to '{}'.",
            current, branch_name
        ));
    }

    merge_annotated(
        &repo,
        &annotated,
        &format!("Merged branch '{}' into '{}'", branch_name, current),
    )?;
    Ok(format!(
        "Successfully merged branch '{}' into '{}'.",
        branch_name, current
    ))
}

/// Non-fast-forward merge of `theirs` into HEAD with a two-parent commit.
fn merge_annotated(
    repo: &Repository,
    theirs: &git2::AnnotatedCommit<'_>,
    message: &str,
) -> anyhow::Result<()> {
    repo.merge(&[theirs], None, None)?;
    let mut index = repo.index()?;
    if index.has_conflicts() {
        repo.cleanup_state()?;
        bail!("merge produced conflicts; aborted");
    }
    let tree_id = index.write_tree_to(repo)?;
    let tree = repo.find_tree(tree_id)?;
    let signature = repo.signature()?;
    let head_commit = repo.head()?.peel_to_commit()?;
    let their_commit = repo.find_commit(theirs.id())?;
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &[&head_commit, &their_commit],
    )?;
    repo.cleanup_state()?;
    repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
    Ok(())
}

fn try_status(repo_path: &str) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let branch = repo
        .head()
        .ok()
        .and_then(|head| head.shorthand().map(str::to_string))
        .unwrap_or_else(|| "(no branch)".to_string());

    let mut options = StatusOptions::new();
    options.include_untracked(true);
    let statuses = repo.statuses(Some(&mut options))?;

    let mut changed = Vec::new();
    let mut untracked = Vec::new();
    for entry in statuses.iter() {
        let path = entry.path().unwrap_or("(non-utf8 path)").to_string();
        if entry.status().contains(Status::WT_NEW) {
            untracked.push(path);
        } else {
            changed.push(path);
        }
    }

    let mut result = format!("Current branch: {}\n", branch);
    result.push_str("Changed files:\n");
    if changed.is_empty() {
        result.push_str("No changed files\n");
    } else {
        result.push_str(&changed.join("\n"));
        result.push('\n');
    }
    result.push_str("Untracked files:\n");
    if untracked.is_empty() {
        result.push_str("No untracked files");
    } else {
        result.push_str(&untracked.join("\n"));
    }
    Ok(result)
}

fn try_log(repo_path: &str, max_count: usize) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let mut walk = repo.revwalk()?;
    walk.push_head().context("repository has no commits")?;

    let mut result = String::new();
    for oid in walk.take(max_count) {
        let commit = repo.find_commit(oid?)?;
        let author = commit.author();
        let when = chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S %Z").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        result.push_str(&format!("Commit: {}\n", commit.id()));
        result.push_str(&format!(
            "Author: {} <{}>\n",
            author.name().unwrap_or(""),
            author.email().unwrap_or("")
        ));
        result.push_str(&format!("Date: {}\n", when));
        result.push_str(&format!(
            "Message: {}\n\n",
            commit.message().unwrap_or("").trim_end()
        ));
    }
    Ok(result.trim_end().to_string())
}

/// Extract `owner/repo` from a GitHub remote URL (https or ssh form).
fn github_slug(remote_url: &str) -> Option<String> {
    let stripped = remote_url.strip_suffix(".git").unwrap_or(remote_url);
    if let Some(rest) = stripped.strip_prefix("https://github.com/") {
        return Some(rest.to_string());
    }
    if let Some(rest) = stripped.strip_prefix("git@github.com:") {
        return Some(rest.to_string());
    }
    None
}

fn try_create_pull_request(
    repo_path: &str,
    base_branch: &str,
    head_branch: &str,
    title: &str,
    body: &str,
    token: &str,
) -> anyhow::Result<String> {
    let repo = open(repo_path)?;
    let remote = repo
        .find_remote("origin")
        .context("remote 'origin' not found")?;
    let remote_url = remote.url().unwrap_or_default();
    let slug = github_slug(remote_url)
        .with_context(|| format!("'{}' is not a GitHub remote", remote_url))?;

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(format!("https://api.github.com/repos/{}/pulls", slug))
        .header(reqwest::header::USER_AGENT, "opkit")
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "body": body,
            "head": head_branch,
            "base": base_branch,
        }))
        .send()
        .context("pull request API call failed")?;

    let status = response.status();
    let payload: serde_json::Value = response.json().unwrap_or_default();
    if !status.is_success() {
        let detail = payload
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no detail");
        bail!("pull request rejected ({}): {}", status, detail);
    }
    let html_url = payload
        .get("html_url")
        .and_then(|u| u.as_str())
        .unwrap_or("(no url returned)");
    Ok(format!("Pull request created: {}", html_url))
}
