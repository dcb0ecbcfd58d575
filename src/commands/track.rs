//! Commands: track and untrack.
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, TrackOpts, UntrackOpts};
use crate::logging::Logger;
use crate::tracking;

/// Run the track command.
///
/// # Errors
///
/// Returns an error if the path cannot be tracked.
pub fn run_track(global: &GlobalOpts, opts: &TrackOpts, log: &Arc<Logger>) -> Result<()> {
    let ctx = CommandSetup::init(global, log)?.context(global, log);
    tracking::track(&ctx, &opts.path, &opts.bundle_name)
}

/// Run the untrack command.
///
/// # Errors
///
/// Returns an error if the path is not tracked or cannot be restored.
pub fn run_untrack(global: &GlobalOpts, opts: &UntrackOpts, log: &Arc<Logger>) -> Result<()> {
    let ctx = CommandSetup::init(global, log)?.context(global, log);
    tracking::untrack(&ctx, &opts.path)
}
