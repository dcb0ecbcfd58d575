//! Git backend for the homefiles repository.
//!
//! Local operations (init, status, commit, remotes) go through `git2`.
//! Network operations shell out to `git` via the [`Executor`] so that the
//! user's credential helpers and SSH configuration apply.
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::GitError;
use crate::exec::Executor;

/// Name and email used when git has no identity configured.
const FALLBACK_NAME: &str = "homefiles";
const FALLBACK_EMAIL: &str = "homefiles@localhost";

/// Kind of change reported by [`Repository::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Untracked or newly added.
    New,
    /// Content changed.
    Modified,
    /// Removed.
    Deleted,
    /// Renamed.
    Renamed,
    /// File type changed (e.g. file became a symlink).
    Typechange,
    /// Unresolved merge conflict.
    Conflicted,
}

impl FileStatus {
    fn from_git(status: git2::Status) -> Self {
        if status.is_conflicted() {
            Self::Conflicted
        } else if status.is_index_new() || status.is_wt_new() {
            Self::New
        } else if status.is_index_deleted() || status.is_wt_deleted() {
            Self::Deleted
        } else if status.is_index_renamed() || status.is_wt_renamed() {
            Self::Renamed
        } else if status.is_index_typechange() || status.is_wt_typechange() {
            Self::Typechange
        } else {
            Self::Modified
        }
    }

    /// Two-letter code used in human-readable status output.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::New => "??",
            Self::Modified => " M",
            Self::Deleted => " D",
            Self::Renamed => " R",
            Self::Typechange => " T",
            Self::Conflicted => "UU",
        }
    }
}

/// A changed path in the working tree or index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    /// Path relative to the repository root.
    pub path: String,
    /// Kind of change.
    pub status: FileStatus,
}

/// Handle to the homefiles repository.
pub struct Repository {
    inner: git2::Repository,
    path: PathBuf,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Whether `path` is the root of a git repository.
#[must_use]
pub fn is_repo(path: &Path) -> bool {
    git2::Repository::open(path).is_ok()
}

/// Whether the repository at `path` is stopped in the middle of a rebase.
#[must_use]
pub fn rebase_in_progress(path: &Path) -> bool {
    git2::Repository::open(path).is_ok_and(|repo| {
        matches!(
            repo.state(),
            git2::RepositoryState::Rebase
                | git2::RepositoryState::RebaseInteractive
                | git2::RepositoryState::RebaseMerge
                | git2::RepositoryState::ApplyMailboxOrRebase
        )
    })
}

impl Repository {
    /// Initialise a repository at `path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if libgit2 fails to initialise the repository.
    pub fn init(path: &Path) -> Result<Self, GitError> {
        let inner = git2::Repository::init(path)?;
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Open the repository rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] if `path` is not a repository root.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let inner = git2::Repository::open(path).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => GitError::NotARepository(path.display().to_string()),
            _ => GitError::Libgit(e),
        })?;
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Repository root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create remote `name`, or change its URL if it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if libgit2 rejects the remote name or URL.
    pub fn set_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        if self.has_remote(name) {
            self.inner.remote_set_url(name, url)?;
        } else {
            self.inner.remote(name, url)?;
        }
        Ok(())
    }

    /// Whether remote `name` is configured.
    #[must_use]
    pub fn has_remote(&self, name: &str) -> bool {
        self.inner.find_remote(name).is_ok()
    }

    /// URL of remote `name`, if configured.
    #[must_use]
    pub fn remote_url(&self, name: &str) -> Option<String> {
        self.inner
            .find_remote(name)
            .ok()
            .and_then(|r| r.url().map(String::from))
    }

    /// Name of the checked-out branch, including an unborn one.
    ///
    /// Returns `None` for a detached HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be read.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        match self.inner.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
            Ok(_) => Ok(None),
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                ) =>
            {
                let head = self.inner.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .map(String::from))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Changed and untracked paths, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if libgit2 cannot compute the status.
    pub fn status(&self) -> Result<Vec<FileChange>, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .renames_head_to_index(true);
        let statuses = self.inner.statuses(Some(&mut opts))?;
        let mut changes: Vec<FileChange> = statuses
            .iter()
            .filter_map(|entry| {
                entry.path().map(|path| FileChange {
                    path: path.to_string(),
                    status: FileStatus::from_git(entry.status()),
                })
            })
            .collect();
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(changes)
    }

    /// Stage every change, deletions included, and commit.
    ///
    /// Returns `None` when there is nothing to commit.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails.
    pub fn commit_all(&self, message: &str) -> Result<Option<git2::Oid>, GitError> {
        let mut index = self.inner.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = match self.inner.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                ) =>
            {
                None
            }
            Err(e) => return Err(e.into()),
        };

        let unchanged = match &parent {
            Some(commit) => commit.tree_id() == tree_id,
            None => index.is_empty(),
        };
        if unchanged {
            return Ok(None);
        }

        let tree = self.inner.find_tree(tree_id)?;
        let signature = self.signature()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self.inner.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(Some(oid))
    }

    fn signature(&self) -> Result<git2::Signature<'static>, GitError> {
        self.inner
            .signature()
            .or_else(|_| git2::Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))
            .map_err(GitError::from)
    }
}

/// Expand a clone source.
///
/// `user/repo` becomes a GitHub HTTPS URL. URLs, scp-style `host:path`
/// sources, and existing local paths are returned unchanged.
///
/// # Examples
///
/// ```
/// use homefiles::git::expand_source;
///
/// assert_eq!(expand_source("alice/dots"), "https://github.com/alice/dots.git");
/// assert_eq!(
///     expand_source("git@example.com:alice/dots.git"),
///     "git@example.com:alice/dots.git"
/// );
/// ```
#[must_use]
pub fn expand_source(source: &str) -> String {
    let is_shorthand = !source.contains("://")
        && !source.contains(':')
        && !source.starts_with(['.', '/', '~'])
        && source.split('/').count() == 2
        && source.split('/').all(|part| !part.is_empty())
        && !Path::new(source).exists();
    if is_shorthand {
        format!("https://github.com/{source}.git")
    } else {
        source.to_string()
    }
}

/// Run `git` with `args`, mapping failure to [`GitError::CommandFailed`].
///
/// Fails with [`GitError::GitNotFound`] before running anything when `git` is
/// not on `PATH`.
fn git(executor: &dyn Executor, dir: Option<&Path>, command: &str, args: &[&str]) -> Result<()> {
    if !executor.which("git") {
        return Err(GitError::GitNotFound.into());
    }
    let result = match dir {
        Some(dir) => executor.run_in(dir, "git", args),
        None => executor.run("git", args),
    };
    result.map_err(|e| GitError::CommandFailed {
        command: command.to_string(),
        reason: format!("{e:#}"),
    })?;
    Ok(())
}

/// Clone `source` (expanded with [`expand_source`]) into `dest`.
///
/// # Errors
///
/// Returns [`GitError::AlreadyExists`] if `dest` exists, or
/// [`GitError::CommandFailed`] if `git clone` fails.
pub fn clone(executor: &dyn Executor, source: &str, dest: &Path) -> Result<()> {
    if dest.symlink_metadata().is_ok() {
        return Err(GitError::AlreadyExists(dest.display().to_string()).into());
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    let url = expand_source(source);
    let dest_str = dest.to_string_lossy();
    git(executor, None, "clone", &["clone", &url, &dest_str])
}

/// `git pull --rebase <remote> <branch>` inside `repo`.
///
/// # Errors
///
/// Returns [`GitError::CommandFailed`] if the pull fails.
pub fn pull(executor: &dyn Executor, repo: &Path, remote: &str, branch: &str) -> Result<()> {
    git(
        executor,
        Some(repo),
        "pull",
        &["pull", "--rebase", remote, branch],
    )
}

/// `git rebase --abort` inside `repo`.
///
/// # Errors
///
/// Returns [`GitError::CommandFailed`] if the abort fails.
pub fn abort_rebase(executor: &dyn Executor, repo: &Path) -> Result<()> {
    git(executor, Some(repo), "rebase --abort", &["rebase", "--abort"])
}

/// `git push <remote> HEAD` inside `repo`.
///
/// # Errors
///
/// Returns [`GitError::CommandFailed`] if the push fails.
pub fn push(executor: &dyn Executor, repo: &Path, remote: &str) -> Result<()> {
    git(executor, Some(repo), "push", &["push", remote, "HEAD"])
}
