#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Integration tests for `clone`: fetch an existing repository into the
//! home directory and link it.
//!
//! Sources are local repositories built with git2; cloning runs the real
//! `git` and is skipped where it is not installed.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use homefiles::cli::{CloneOpts, GlobalOpts};
use homefiles::commands::clone;
use homefiles::error::GitError;
use homefiles::git::Repository;
use homefiles::logging::Logger;

struct Machine {
    _tmp: tempfile::TempDir,
    home: PathBuf,
    source: PathBuf,
}

/// An empty home next to a source repository holding `default/.bashrc`.
fn machine() -> Machine {
    let tmp = tempfile::tempdir().unwrap();
    let root = dunce::canonicalize(tmp.path()).unwrap();
    let home = root.join("home");
    let source = root.join("source");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(source.join("default")).unwrap();
    fs::write(source.join("default/.bashrc"), "bash").unwrap();
    Repository::init(&source)
        .unwrap()
        .commit_all("initial")
        .unwrap();
    Machine {
        _tmp: tmp,
        home,
        source,
    }
}

fn global(home: &Path, dry_run: bool) -> GlobalOpts {
    GlobalOpts {
        dry_run,
        repo: None,
        home: Some(home.to_path_buf()),
        bundles: Vec::new(),
        parallel: false,
    }
}

fn opts(source: &Path, no_link: bool) -> CloneOpts {
    CloneOpts {
        source: source.to_string_lossy().to_string(),
        no_link,
    }
}

fn has_git() -> bool {
    which::which("git").is_ok()
}

#[test]
fn clone_links_by_default() {
    if !has_git() {
        return;
    }
    let m = machine();
    let log = Arc::new(Logger::new("clone"));

    clone::run(&global(&m.home, false), &opts(&m.source, false), &log).unwrap();

    let cloned = m.home.join(".homefiles/default/.bashrc");
    assert_eq!(fs::read_to_string(&cloned).unwrap(), "bash");
    assert_eq!(fs::read_link(m.home.join(".bashrc")).unwrap(), cloned);
}

#[test]
fn no_link_only_clones() {
    if !has_git() {
        return;
    }
    let m = machine();
    let log = Arc::new(Logger::new("clone"));

    clone::run(&global(&m.home, false), &opts(&m.source, true), &log).unwrap();

    assert!(m.home.join(".homefiles/default/.bashrc").is_file());
    assert!(m.home.join(".bashrc").symlink_metadata().is_err());
}

#[test]
fn existing_destination_is_refused() {
    let m = machine();
    fs::create_dir_all(m.home.join(".homefiles")).unwrap();
    let log = Arc::new(Logger::new("clone"));

    let err = clone::run(&global(&m.home, false), &opts(&m.source, false), &log).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<GitError>(),
        Some(GitError::AlreadyExists(_))
    ));
    assert!(fs::read_dir(m.home.join(".homefiles")).unwrap().next().is_none());
}

#[test]
fn dry_run_clones_nothing() {
    let m = machine();
    let log = Arc::new(Logger::new("clone"));

    clone::run(&global(&m.home, true), &opts(&m.source, false), &log).unwrap();

    assert!(!m.home.join(".homefiles").exists());
}
