//! Repository synchronisation tasks: commit, pull, push.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::git::{self, Repository};

/// Whether the repository has the configured sync remote.
fn has_sync_remote(ctx: &Context) -> bool {
    Repository::open(ctx.repo())
        .is_ok_and(|repo| repo.has_remote(&ctx.config.settings.sync.remote))
}

/// Stage and commit every change in the repository.
#[derive(Debug)]
pub struct CommitChanges {
    /// Commit message.
    pub message: String,
}

impl CommitChanges {
    /// Create the task with the given commit message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Task for CommitChanges {
    fn name(&self) -> &str {
        "Commit changes"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        git::is_repo(ctx.repo())
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let repo = Repository::open(ctx.repo())?;
        let changes = repo.status()?;
        if changes.is_empty() {
            return Ok(TaskResult::Skipped("nothing to commit".to_string()));
        }
        for change in &changes {
            ctx.log
                .debug(&format!("{} {}", change.status.code(), change.path));
        }
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would commit {} change(s): {}",
                changes.len(),
                self.message
            ));
            return Ok(TaskResult::DryRun);
        }
        match repo.commit_all(&self.message)? {
            Some(oid) => {
                ctx.log.info(&format!(
                    "committed {} change(s) as {:.7}",
                    changes.len(),
                    oid.to_string()
                ));
                Ok(TaskResult::Ok)
            }
            None => Ok(TaskResult::Skipped("nothing to commit".to_string())),
        }
    }
}

/// Rebase local commits onto the remote branch.
///
/// A failed pull is tolerated: any rebase it left behind is aborted and the
/// task reports itself skipped with a warning so the remaining sync steps
/// run against the local commits.
#[derive(Debug, Default)]
pub struct PullRepository;

impl Task for PullRepository {
    fn name(&self) -> &str {
        "Pull repository"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        has_sync_remote(ctx)
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let remote = &ctx.config.settings.sync.remote;
        let repo = Repository::open(ctx.repo())?;
        let Some(branch) = repo.current_branch()? else {
            return Ok(TaskResult::Skipped("HEAD is detached".to_string()));
        };
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would pull --rebase {remote} {branch}"));
            return Ok(TaskResult::DryRun);
        }
        match git::pull(&*ctx.executor, ctx.repo(), remote, &branch) {
            Ok(()) => {
                ctx.log.info(&format!("pulled {remote}/{branch}"));
                Ok(TaskResult::Ok)
            }
            Err(e) => {
                ctx.log.warn(&format!("pull failed: {e:#}"));
                if git::rebase_in_progress(ctx.repo()) {
                    git::abort_rebase(&*ctx.executor, ctx.repo())
                        .context("aborting the rebase left by the failed pull")?;
                    ctx.log.info("aborted the interrupted rebase");
                }
                Ok(TaskResult::Skipped(format!("pull from {remote} failed")))
            }
        }
    }
}

/// Push `HEAD` to the sync remote.
#[derive(Debug, Default)]
pub struct PushRepository;

impl Task for PushRepository {
    fn name(&self) -> &str {
        "Push repository"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        has_sync_remote(ctx)
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let remote = &ctx.config.settings.sync.remote;
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would push HEAD to {remote}"));
            return Ok(TaskResult::DryRun);
        }
        git::push(&*ctx.executor, ctx.repo(), remote)?;
        ctx.log.info(&format!("pushed to {remote}"));
        Ok(TaskResult::Ok)
    }
}
