//! Rayon-based parallel resource processing.

use std::sync::Mutex;

use anyhow::Result;

use super::apply::{process_single, remove_single};
use super::{ProcessOpts, TaskResult, TaskStats};
use crate::resources::Resource;
use crate::tasks::Context;

/// Check and apply resources in parallel.
pub(super) fn process_resources_parallel<R: Resource + Send>(
    ctx: &Context,
    resources: Vec<R>,
    opts: &ProcessOpts,
) -> Result<TaskResult> {
    let stats = collect_parallel_stats(resources, |resource| {
        let current = resource.current_state()?;
        process_single(ctx, &resource, current, opts)
    })?;
    Ok(stats.finish(ctx))
}

/// Remove resources in parallel.
pub(super) fn process_remove_parallel<R: Resource + Send>(
    ctx: &Context,
    resources: Vec<R>,
    verb: &str,
) -> Result<TaskResult> {
    let stats = collect_parallel_stats(resources, |resource| {
        let current = resource.current_state()?;
        remove_single(ctx, &resource, &current, verb)
    })?;
    Ok(stats.finish(ctx))
}

/// Run `work` on each item concurrently and sum the returned deltas.
///
/// The per-item work runs without the stats lock held; the lock is taken
/// only for the counter update.
fn collect_parallel_stats<T: Send>(
    items: Vec<T>,
    work: impl Fn(T) -> Result<TaskStats> + Sync + Send,
) -> Result<TaskStats> {
    use rayon::prelude::*;
    let stats = Mutex::new(TaskStats::new());
    items.into_par_iter().try_for_each(|item| -> Result<()> {
        let delta = work(item)?;
        *stats
            .lock()
            .map_err(|e| anyhow::anyhow!("stats mutex poisoned: {e}"))? += delta;
        Ok(())
    })?;
    Ok(stats
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner))
}
