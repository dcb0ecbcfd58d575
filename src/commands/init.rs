//! Command: create a new repository.
use anyhow::{Context as _, Result};

use super::{home_dir, repo_path};
use crate::cli::{GlobalOpts, InitOpts};
use crate::config::{SETTINGS_FILE, SETTINGS_TEMPLATE};
use crate::git::{self, Repository};
use crate::logging::Logger;

/// Run the init command.
///
/// Re-running on an existing repository only adds a missing `origin`.
///
/// # Errors
///
/// Returns an error if the directory, repository, settings file, or remote
/// cannot be created.
pub fn run(global: &GlobalOpts, opts: &InitOpts, log: &Logger) -> Result<()> {
    let home = home_dir(global)?;
    let repo_dir = repo_path(global, &home);
    let settings = repo_dir.join(SETTINGS_FILE);
    let exists = git::is_repo(&repo_dir);

    if global.dry_run {
        if !exists {
            log.dry_run(&format!("would create repository {}", repo_dir.display()));
        }
        if !settings.exists() {
            log.dry_run(&format!("would write {}", settings.display()));
        }
        if let Some(origin) = &opts.origin {
            log.dry_run(&format!("would set origin to {origin}"));
        }
        return Ok(());
    }

    let repo = if exists {
        log.info(&format!("repository already exists: {}", repo_dir.display()));
        Repository::open(&repo_dir)?
    } else {
        std::fs::create_dir_all(&repo_dir)
            .with_context(|| format!("creating {}", repo_dir.display()))?;
        let repo = Repository::init(&repo_dir)?;
        log.info(&format!("initialized {}", repo_dir.display()));
        repo
    };

    if !settings.exists() {
        std::fs::write(&settings, SETTINGS_TEMPLATE)
            .with_context(|| format!("writing {}", settings.display()))?;
        log.info(&format!("wrote {}", settings.display()));
    }

    if let Some(origin) = &opts.origin {
        if repo.has_remote("origin") {
            log.info("origin already set");
        } else {
            repo.set_remote("origin", origin)?;
            log.info(&format!("origin: {origin}"));
        }
    }
    Ok(())
}
