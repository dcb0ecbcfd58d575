//! Commands: link and unlink.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{GlobalOpts, LinkOpts, UnlinkOpts};
use crate::logging::Logger;
use crate::tasks::Task;
use crate::tasks::link::LinkBundles;
use crate::tasks::unlink::UnlinkBundles;

/// Run the link command.
///
/// # Errors
///
/// Returns an error if setup fails or linking records a failure.
pub fn run_link(global: &GlobalOpts, opts: &LinkOpts, log: &Arc<Logger>) -> Result<()> {
    let ctx = CommandSetup::init(global, log)?.context(global, log);
    let task = LinkBundles::new(opts.force);
    run_tasks_to_completion([&task as &dyn Task], &ctx, log)
}

/// Run the unlink command.
///
/// # Errors
///
/// Returns an error if setup fails or unlinking records a failure.
pub fn run_unlink(global: &GlobalOpts, opts: &UnlinkOpts, log: &Arc<Logger>) -> Result<()> {
    let ctx = CommandSetup::init(global, log)?.context(global, log);
    let task = UnlinkBundles::new(opts.restore);
    run_tasks_to_completion([&task as &dyn Task], &ctx, log)
}
