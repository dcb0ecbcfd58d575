pub mod bundles;
pub mod clone;
pub mod completions;
pub mod init;
pub mod link;
pub mod status;
pub mod sync;
pub mod track;
pub mod version;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::platform::Platform;
use crate::tasks::{self, Context, Task, resolve_home};

/// Directory name of the repository under the home directory.
pub const DEFAULT_REPO_DIR: &str = ".homefiles";

/// Resolve the home directory, canonicalised when it exists.
///
/// # Errors
///
/// Returns an error if no home directory can be determined.
pub fn home_dir(global: &GlobalOpts) -> Result<PathBuf> {
    let home = resolve_home(global.home.as_deref())?;
    Ok(dunce::canonicalize(&home).unwrap_or(home))
}

/// Resolve the repository path: `--repo`/`HOMEFILES_REPO`, else
/// `<home>/.homefiles`. Canonicalised when it exists.
#[must_use]
pub fn repo_path(global: &GlobalOpts, home: &Path) -> PathBuf {
    let repo = global
        .repo
        .clone()
        .unwrap_or_else(|| home.join(DEFAULT_REPO_DIR));
    dunce::canonicalize(&repo).unwrap_or(repo)
}

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform.
    pub platform: Platform,
    /// Loaded settings and active bundles.
    pub config: Config,
    /// Home directory links are created in.
    pub home: PathBuf,
}

impl CommandSetup {
    /// Detect the platform, locate home and repository, and load settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined, the
    /// repository does not exist, the settings are invalid, or a requested
    /// bundle is unknown.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let platform = Platform::detect();
        let home = home_dir(global)?;
        let repo = repo_path(global, &home);
        log.debug(&format!("home: {}", home.display()));
        log.debug(&format!("repo: {}", repo.display()));

        let config = Config::load(&repo, &global.bundles, &platform)
            .with_context(|| format!("loading {}", repo.display()))?;
        log.debug(&format!(
            "{} bundle(s) available: {}",
            config.available.len(),
            config.available.join(", ")
        ));
        if config.bundles.is_empty() {
            log.warn("no active bundles");
        } else {
            log.info(&format!("bundles: {}", config.bundles.join(", ")));
        }

        Ok(Self {
            platform,
            config,
            home,
        })
    }

    /// Build the task context.
    #[must_use]
    pub fn context(self, global: &GlobalOpts, log: &Arc<Logger>) -> Context {
        Context::new(
            Arc::new(self.config),
            Arc::new(self.platform),
            Arc::clone(log) as Arc<dyn Log>,
            global.dry_run,
            self.home,
            Arc::new(SystemExecutor),
            global.parallel,
        )
    }
}

/// Execute every task in order, print the summary, and bail if any task failed.
///
/// # Errors
///
/// Returns an error if one or more tasks recorded a failure.
pub fn run_tasks_to_completion<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
    log: &Logger,
) -> Result<()> {
    for task in tasks {
        tasks::execute(task, ctx);
    }

    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}
