#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for `sync`: commit, pull, push, and relink.
//!
//! The repository is real (git2 in a temp dir); network operations go
//! through a recording executor, except for one run against a local bare
//! remote with the real `git`.
#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{MockExecutor, TestHomeBuilder};
use homefiles::cli::SyncOpts;
use homefiles::commands::{run_tasks_to_completion, sync::sync_tasks};
use homefiles::exec::{Executor, SystemExecutor};
use homefiles::git::{self, Repository};
use homefiles::logging::TaskStatus;

fn opts() -> SyncOpts {
    SyncOpts {
        message: None,
        no_pull: false,
        no_push: false,
        no_link: false,
    }
}

fn statuses(log: &homefiles::logging::Logger) -> Vec<(String, TaskStatus)> {
    log.task_entries()
        .into_iter()
        .map(|e| (e.name, e.status))
        .collect()
}

#[test]
fn full_sync_commits_pulls_pushes_and_links() {
    let home = TestHomeBuilder::new()
        .with_git(Some("https://example.com/dots.git"))
        .with_file("default", ".bashrc", "bash")
        .build();
    let executor = Arc::new(MockExecutor::new());
    let (ctx, log) = home.context_with(&[], false, executor.clone());

    let tasks = sync_tasks(&opts(), "Sync from testhost".to_string());
    run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, &log).unwrap();

    let repo = Repository::open(&home.repo).unwrap();
    assert!(repo.status().unwrap().is_empty());
    let branch = repo.current_branch().unwrap().unwrap();

    assert_eq!(
        executor.calls(),
        [
            format!("git pull --rebase origin {branch}"),
            "git push origin HEAD".to_string(),
        ]
    );
    assert!(home.is_linked(".bashrc", "default"));
    assert_eq!(
        statuses(&log),
        [
            ("Commit changes".to_string(), TaskStatus::Ok),
            ("Pull repository".to_string(), TaskStatus::Ok),
            ("Push repository".to_string(), TaskStatus::Ok),
            ("Link bundles".to_string(), TaskStatus::Ok),
        ]
    );
}

#[test]
fn sync_without_remote_only_commits_and_links() {
    let home = TestHomeBuilder::new()
        .with_git(None)
        .with_file("default", ".bashrc", "bash")
        .build();
    let executor = Arc::new(MockExecutor::new());
    let (ctx, log) = home.context_with(&[], false, executor.clone());

    let tasks = sync_tasks(&opts(), "msg".to_string());
    run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, &log).unwrap();

    assert!(executor.calls().is_empty());
    let st = statuses(&log);
    assert_eq!(st[1].1, TaskStatus::NotApplicable);
    assert_eq!(st[2].1, TaskStatus::NotApplicable);
    assert!(home.is_linked(".bashrc", "default"));
}

/// Give `dir` a local identity so command-line git can commit there.
fn identify(dir: &Path) {
    let mut config = git2::Repository::open(dir).unwrap().config().unwrap();
    config.set_str("user.name", "Test").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();
    config.set_bool("commit.gpgsign", false).unwrap();
}

#[test]
fn conflicting_pull_is_rolled_back_before_linking() {
    if which::which("git").is_err() {
        return;
    }
    let home = TestHomeBuilder::new()
        .with_git(None)
        .with_file("default", ".bashrc", "base\n")
        .build();
    let cli = SystemExecutor;
    let root = home.home.parent().unwrap().to_path_buf();
    let remote = root.join("remote.git");
    git2::Repository::init_bare(&remote).unwrap();
    let remote_url = remote.to_string_lossy().to_string();

    let repo = Repository::open(&home.repo).unwrap();
    repo.set_remote("origin", &remote_url).unwrap();
    identify(&home.repo);
    repo.commit_all("base").unwrap();
    let branch = repo.current_branch().unwrap().unwrap();
    cli.run_in(&home.repo, "git", &["push", "origin", "HEAD"])
        .unwrap();

    // Another machine pushes a conflicting edit first.
    let other = root.join("other");
    let other_str = other.to_string_lossy().to_string();
    cli.run("git", &["clone", "--branch", &branch, &remote_url, &other_str])
        .unwrap();
    identify(&other);
    fs::write(other.join("default/.bashrc"), "remote\n").unwrap();
    Repository::open(&other).unwrap().commit_all("remote").unwrap();
    cli.run_in(&other, "git", &["push", "origin", "HEAD"]).unwrap();

    fs::write(home.bundle_path("default", ".bashrc"), "local\n").unwrap();
    let (ctx, log) = home.context_with(&[], false, Arc::new(SystemExecutor));

    let tasks = sync_tasks(&opts(), "local".to_string());
    let result = run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, &log);

    assert!(!git::rebase_in_progress(&home.repo));
    assert_eq!(
        fs::read_to_string(home.home_path(".bashrc")).unwrap(),
        "local\n"
    );
    let st = statuses(&log);
    assert_eq!(st[1].1, TaskStatus::Skipped);
    assert_eq!(st[2].1, TaskStatus::Failed, "non-fast-forward push");
    assert_eq!(st[3].1, TaskStatus::Ok);
    assert!(result.is_err());
}

#[test]
fn failed_push_fails_the_run() {
    let home = TestHomeBuilder::new()
        .with_git(Some("https://example.com/dots.git"))
        .with_file("default", ".bashrc", "bash")
        .build();
    let executor = Arc::new(MockExecutor::failing_on("push"));
    let (ctx, log) = home.context_with(&[], false, executor);

    let tasks = sync_tasks(&opts(), "msg".to_string());
    let err = run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, &log).unwrap_err();

    assert_eq!(err.to_string(), "1 task(s) failed");
    assert_eq!(statuses(&log)[2].1, TaskStatus::Failed);
    assert!(home.is_linked(".bashrc", "default"));
}

#[test]
fn skip_flags_trim_the_task_list() {
    let home = TestHomeBuilder::new()
        .with_git(Some("https://example.com/dots.git"))
        .with_file("default", ".bashrc", "bash")
        .build();
    let executor = Arc::new(MockExecutor::new());
    let (ctx, log) = home.context_with(&[], false, executor.clone());
    let opts = SyncOpts {
        no_pull: true,
        no_push: true,
        no_link: true,
        ..opts()
    };

    let tasks = sync_tasks(&opts, "msg".to_string());
    run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, &log).unwrap();

    assert!(executor.calls().is_empty());
    assert_eq!(statuses(&log).len(), 1);
    assert!(home.home_path(".bashrc").symlink_metadata().is_err());
}

#[test]
fn dry_run_sync_changes_nothing() {
    let home = TestHomeBuilder::new()
        .with_git(Some("https://example.com/dots.git"))
        .with_file("default", ".bashrc", "bash")
        .build();
    let executor = Arc::new(MockExecutor::new());
    let (ctx, log) = home.context_with(&[], true, executor.clone());

    let tasks = sync_tasks(&opts(), "msg".to_string());
    run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, &log).unwrap();

    assert!(executor.calls().is_empty());
    assert!(!Repository::open(&home.repo).unwrap().status().unwrap().is_empty());
    assert!(home.home_path(".bashrc").symlink_metadata().is_err());
}
