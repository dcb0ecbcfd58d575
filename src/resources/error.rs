//! Typed error variants for resource operations.
//!
//! This module provides [`ResourceError`], a structured error type for
//! symlink check, apply, and remove operations. Callers convert to
//! [`anyhow::Error`] via `?`.

use thiserror::Error;

/// Errors that arise from resource checks and apply operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The file a link should point at does not exist.
    #[error("source does not exist: {path}")]
    SourceMissing {
        /// Missing source path.
        path: String,
    },

    /// A real file or directory occupies the link target.
    #[error("{path} exists and is not a symlink (use --force to back it up)")]
    TargetOccupied {
        /// Occupied target path.
        path: String,
    },

    /// A forced link needs a backup name that is already taken.
    #[error("backup {backup} already exists; move it away before linking {path}")]
    BackupExists {
        /// Target being replaced.
        path: String,
        /// Backup path that is in the way.
        backup: String,
    },
}
