//! Domain-specific error types for homefiles.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`], [`TrackError`])
//! wrapped in [`anyhow::Error`]; command handlers add context with `?` and
//! callers that need to branch on the failure can `downcast_ref` to the typed
//! variant.
//!
//! # Error hierarchy
//!
//! ```text
//! HomefilesError
//! ├── Config(ConfigError)      — settings file, bundle selection
//! ├── Track(TrackError)        — track / untrack preconditions
//! ├── Git(GitError)            — repository backend
//! └── Resource(ResourceError)  — symlink check / apply / remove
//! ```

use thiserror::Error;

use crate::resources::error::ResourceError;

/// Top-level error type for homefiles.
#[derive(Error, Debug)]
pub enum HomefilesError {
    /// Configuration-related error.
    #[error("Configuration error")]
    Config(#[from] ConfigError),

    /// Track or untrack precondition failure.
    #[error("Tracking error")]
    Track(#[from] TrackError),

    /// Repository backend error.
    #[error("Git error")]
    Git(#[from] GitError),

    /// Resource operation error.
    #[error("Resource error")]
    Resource(#[from] ResourceError),
}

/// Errors that arise from loading settings and resolving bundles.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A bundle was requested that does not exist in the repository.
    #[error("Unknown bundle '{0}'")]
    UnknownBundle(String),

    /// A bundle name is not a single plain path component.
    #[error("Invalid bundle name '{0}'")]
    InvalidBundleName(String),

    /// The settings file could not be parsed.
    #[error("Invalid settings in {path}: {message}")]
    InvalidSyntax {
        /// Path of the settings file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading a settings file.
    #[error("IO error reading {path}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The home directory could not be determined.
    #[error("cannot determine home directory; set HOME or pass --home")]
    NoHome,
}

/// Errors that arise when tracking or untracking a path.
#[derive(Error, Debug)]
pub enum TrackError {
    /// The path is not inside the home directory.
    #[error("{0} is not inside the home directory")]
    NotInHome(String),

    /// The home directory itself cannot be tracked.
    #[error("refusing to track the home directory itself")]
    IsHome,

    /// The path lies inside the homefiles repository.
    #[error("{0} is inside the homefiles repository")]
    InsideRepo(String),

    /// The path does not exist.
    #[error("{0} does not exist")]
    NotFound(String),

    /// The path is already a link into the repository.
    #[error("{0} is already tracked")]
    AlreadyTracked(String),

    /// The path lies beneath a directory that is tracked as a whole.
    #[error("{path} is inside tracked directory {dir}")]
    InsideTrackedDir {
        /// Path that was requested.
        path: String,
        /// Tracked ancestor directory.
        dir: String,
    },

    /// The destination inside the bundle already exists.
    #[error("{0} already exists in the repository")]
    DestinationExists(String),

    /// The path is not a link into the repository.
    #[error("{0} is not tracked")]
    NotTracked(String),
}

/// Errors that arise from the repository backend.
#[derive(Error, Debug)]
pub enum GitError {
    /// Error reported by libgit2.
    #[error(transparent)]
    Libgit(#[from] git2::Error),

    /// The repository path is not a git repository.
    #[error("{0} is not a homefiles repository (run `homefiles init` or `homefiles clone`)")]
    NotARepository(String),

    /// The repository is stopped in the middle of a rebase.
    #[error("{0} has a rebase in progress; finish it or run `git rebase --abort`")]
    RebaseInProgress(String),

    /// The clone destination already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// No `git` executable on `PATH`.
    #[error("git is not installed or not on PATH")]
    GitNotFound,

    /// A `git` subprocess failed.
    #[error("git {command} failed: {reason}")]
    CommandFailed {
        /// Subcommand that failed (e.g. `"push"`).
        command: String,
        /// Failure description.
        reason: String,
    },
}
