//! Command: commit, pull, push, and relink.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{GlobalOpts, SyncOpts};
use crate::logging::Logger;
use crate::tasks::Task;
use crate::tasks::link::LinkBundles;
use crate::tasks::sync::{CommitChanges, PullRepository, PushRepository};

/// Build the sync task list in execution order.
#[must_use]
pub fn sync_tasks(opts: &SyncOpts, message: String) -> Vec<Box<dyn Task>> {
    let mut tasks: Vec<Box<dyn Task>> = vec![Box::new(CommitChanges::new(message))];
    if !opts.no_pull {
        tasks.push(Box::new(PullRepository));
    }
    if !opts.no_push {
        tasks.push(Box::new(PushRepository));
    }
    if !opts.no_link {
        tasks.push(Box::new(LinkBundles::new(false)));
    }
    tasks
}

/// Run the sync command.
///
/// # Errors
///
/// Returns an error if setup fails or any task records a failure.
pub fn run(global: &GlobalOpts, opts: &SyncOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let message = opts.message.clone().unwrap_or_else(|| {
        setup
            .config
            .settings
            .sync
            .render_message(setup.platform.host_label())
    });
    let ctx = setup.context(global, log);
    let tasks = sync_tasks(opts, message);
    run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, log)
}
