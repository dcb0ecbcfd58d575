//! Idempotent resource primitives (check + apply pattern).
pub mod error;
pub mod helpers;
pub mod symlink;

use anyhow::Result;

/// Something on disk that should be in a particular state.
///
/// Tasks call [`current_state`](Self::current_state) first and only
/// [`apply`](Self::apply) when the state is `Missing` or `Incorrect`;
/// `apply` is still expected to be idempotent on its own.
pub trait Resource {
    /// Human-readable description, used in log lines.
    fn description(&self) -> String;

    /// Inspect the resource without changing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read (I/O or permissions).
    fn current_state(&self) -> Result<ResourceState>;

    /// Bring the resource into the desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be made.
    fn apply(&self) -> Result<ResourceChange>;

    /// Undo a previous [`apply`](Self::apply).
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be removed.
    fn remove(&self) -> Result<ResourceChange>;
}

/// State of a resource relative to what the plan wants.
///
/// # Examples
///
/// ```
/// use homefiles::resources::ResourceState;
///
/// let wrong = ResourceState::Incorrect { current: "points to /elsewhere".into() };
/// assert_ne!(wrong, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing at the target.
    Missing,
    /// Already as desired.
    Correct,
    /// Present but different; `apply` will replace it.
    Incorrect {
        /// What is there now.
        current: String,
    },
    /// Cannot be applied (e.g. a real file occupies the target).
    Invalid {
        /// Why not.
        reason: String,
    },
}

/// Outcome of [`Resource::apply`] or [`Resource::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created, replaced, or removed.
    Applied,
    /// Nothing to do.
    AlreadyCorrect,
    /// Left alone (e.g. the target is a real file and `--force` was not given).
    Skipped {
        /// Why it was left alone.
        reason: String,
    },
}
