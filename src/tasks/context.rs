use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::ConfigError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;

/// Shared context for task execution.
pub struct Context {
    /// Repository settings and active bundles.
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Home directory that bundles are linked into.
    pub home: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Whether to process resources in parallel using Rayon.
    pub parallel: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("repo", &self.config.repo)
            .field("bundles", &self.config.bundles)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("executor", &"<dyn Executor>")
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Context {
    /// Creates a new context for task execution.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: bool,
        home: PathBuf,
        executor: Arc<dyn Executor>,
        parallel: bool,
    ) -> Self {
        Self {
            config,
            platform,
            log,
            dry_run,
            home,
            executor,
            parallel,
        }
    }

    /// Root directory of the homefiles repository.
    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.config.repo
    }

    /// Where entry `rel` is linked in the home directory.
    #[must_use]
    pub fn home_path(&self, rel: &Path) -> PathBuf {
        self.home.join(rel)
    }

}

/// Resolve the home directory: the explicit override, else `HOME` (or
/// `USERPROFILE` on Windows).
///
/// # Errors
///
/// Returns [`ConfigError::NoHome`] if no override is given and neither
/// variable is set.
pub fn resolve_home(override_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }
    let var = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE").or_else(|_| std::env::var("HOME"))
    } else {
        std::env::var("HOME")
    };
    var.ok()
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::NoHome)
}
