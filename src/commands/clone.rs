//! Command: clone an existing repository.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, home_dir, repo_path, run_tasks_to_completion};
use crate::cli::{CloneOpts, GlobalOpts};
use crate::exec::SystemExecutor;
use crate::git;
use crate::logging::Logger;
use crate::tasks::Task;
use crate::tasks::link::LinkBundles;

/// Run the clone command.
///
/// # Errors
///
/// Returns an error if the repository path already exists, the clone fails,
/// or linking fails.
pub fn run(global: &GlobalOpts, opts: &CloneOpts, log: &Arc<Logger>) -> Result<()> {
    let home = home_dir(global)?;
    let repo_dir = repo_path(global, &home);
    let url = git::expand_source(&opts.source);

    if global.dry_run {
        log.dry_run(&format!("would clone {url} into {}", repo_dir.display()));
        return Ok(());
    }

    log.stage("Cloning repository");
    git::clone(&SystemExecutor, &opts.source, &repo_dir)?;
    log.info(&format!("cloned {url}"));

    if opts.no_link {
        return Ok(());
    }

    let setup = CommandSetup::init(global, log)?;
    let ctx = setup.context(global, log);
    let task = LinkBundles::new(false);
    run_tasks_to_completion([&task as &dyn Task], &ctx, log)
}
