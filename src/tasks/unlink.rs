//! Task that removes bundle links from the home directory.
use anyhow::Result;

use super::link::{plan_links, plan_resources};
use super::{Context, Task, TaskResult, process_resources_remove};

/// Remove the home-directory links of the active bundles.
///
/// Only symlinks that point at the planned source are touched.
#[derive(Debug, Default)]
pub struct UnlinkBundles {
    /// Replace each removed link with a copy of its source.
    pub restore: bool,
}

impl UnlinkBundles {
    /// Create the task.
    #[must_use]
    pub const fn new(restore: bool) -> Self {
        Self { restore }
    }
}

impl Task for UnlinkBundles {
    fn name(&self) -> &str {
        "Unlink bundles"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.bundles.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let plan = plan_links(ctx)?;
        let resources = plan_resources(ctx, plan)
            .into_iter()
            .map(|r| r.with_restore(self.restore));
        let verb = if self.restore { "restore" } else { "unlink" };
        process_resources_remove(ctx, resources, verb)
    }
}
