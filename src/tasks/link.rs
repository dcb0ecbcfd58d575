//! Task that links the active bundles into the home directory.
use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::bundles::{self, LinkPlan};
use crate::error::GitError;
use crate::git;
use crate::resources::symlink::SymlinkResource;

/// Compute the link plan for the active bundles, logging overrides at debug
/// level and conflicts as warnings.
///
/// # Errors
///
/// Returns an error if a bundle directory cannot be read.
pub fn plan_links(ctx: &Context) -> Result<LinkPlan> {
    let plan = bundles::plan(ctx.repo(), &ctx.config.bundles, &ctx.config.ignore)?;
    for o in &plan.overrides {
        ctx.log.debug(&format!(
            "{}: {} overrides {}",
            o.rel.display(),
            o.by,
            o.replaced
        ));
    }
    for c in &plan.conflicts {
        ctx.log.warn(&format!(
            "not linking {}/{}: {} is linked as a directory from {}",
            c.bundle,
            c.rel.display(),
            c.parent.display(),
            c.parent_bundle
        ));
    }
    Ok(plan)
}

/// Build one symlink resource per planned entry.
pub(super) fn plan_resources(ctx: &Context, plan: LinkPlan) -> Vec<SymlinkResource> {
    plan.entries
        .into_iter()
        .map(|entry| SymlinkResource::new(entry.source, ctx.home_path(&entry.rel)))
        .collect()
}

/// Symlink every entry of the active bundles into the home directory.
#[derive(Debug, Default)]
pub struct LinkBundles {
    /// Back up and replace real files that occupy link targets.
    pub force: bool,
}

impl LinkBundles {
    /// Create the task.
    #[must_use]
    pub const fn new(force: bool) -> Self {
        Self { force }
    }
}

impl Task for LinkBundles {
    fn name(&self) -> &str {
        "Link bundles"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.bundles.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if git::rebase_in_progress(ctx.repo()) {
            return Err(GitError::RebaseInProgress(ctx.repo().display().to_string()).into());
        }
        ctx.log
            .debug(&format!("active bundles: {}", ctx.config.bundles.join(", ")));
        let plan = plan_links(ctx)?;
        let resources: Vec<SymlinkResource> = plan_resources(ctx, plan)
            .into_iter()
            .map(|r| r.with_force(self.force))
            .collect();
        process_resources(ctx, resources, &ProcessOpts::apply_all("link"))
    }
}

#[cfg(test)]
#[cfg(unix)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::fs_context;
    use std::fs;

    fn setup() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let repo = tmp.path().join("repo");
        let home = tmp.path().join("home");
        fs::create_dir_all(repo.join("default/.config/git")).unwrap();
        fs::create_dir_all(&home).unwrap();
        fs::write(repo.join("default/.bashrc"), "bash").unwrap();
        fs::write(repo.join("default/.config/git/config"), "git").unwrap();
        (tmp, repo, home)
    }

    #[test]
    fn links_every_planned_entry() {
        let (_tmp, repo, home) = setup();
        let (ctx, log) = fs_context(&repo, &home, &["default"]);

        let result = LinkBundles::new(false).run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::Ok));
        assert_eq!(
            fs::read_link(home.join(".bashrc")).unwrap(),
            repo.join("default/.bashrc")
        );
        assert_eq!(
            fs::read_link(home.join(".config/git/config")).unwrap(),
            repo.join("default/.config/git/config")
        );
        assert!(!log.has_failures());
    }

    #[test]
    fn refuses_to_link_mid_rebase() {
        let (_tmp, repo, home) = setup();
        crate::git::Repository::init(&repo).unwrap();
        fs::create_dir_all(repo.join(".git/rebase-merge")).unwrap();
        let (ctx, _log) = fs_context(&repo, &home, &["default"]);

        let err = LinkBundles::new(false).run(&ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GitError>(),
            Some(GitError::RebaseInProgress(_))
        ));
        assert!(home.join(".bashrc").symlink_metadata().is_err());
    }

    #[test]
    fn second_run_changes_nothing() {
        let (_tmp, repo, home) = setup();
        let (ctx, _log) = fs_context(&repo, &home, &["default"]);
        LinkBundles::new(false).run(&ctx).unwrap();
        LinkBundles::new(false).run(&ctx).unwrap();
        assert!(home.join(".bashrc").symlink_metadata().unwrap().is_symlink());
    }

    #[test]
    fn dry_run_creates_nothing() {
        let (_tmp, repo, home) = setup();
        let (mut ctx, _log) = fs_context(&repo, &home, &["default"]);
        ctx.dry_run = true;

        let result = LinkBundles::new(false).run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::DryRun));
        assert!(home.join(".bashrc").symlink_metadata().is_err());
        assert!(!home.join(".config").exists());
    }

    #[test]
    fn occupied_target_is_left_alone_without_force() {
        let (_tmp, repo, home) = setup();
        fs::write(home.join(".bashrc"), "local").unwrap();
        let (ctx, _log) = fs_context(&repo, &home, &["default"]);

        LinkBundles::new(false).run(&ctx).unwrap();
        assert_eq!(fs::read_to_string(home.join(".bashrc")).unwrap(), "local");
        assert!(home.join(".config/git/config").symlink_metadata().unwrap().is_symlink());
    }

    #[test]
    fn force_backs_up_occupied_target() {
        let (_tmp, repo, home) = setup();
        fs::write(home.join(".bashrc"), "local").unwrap();
        let (ctx, _log) = fs_context(&repo, &home, &["default"]);

        LinkBundles::new(true).run(&ctx).unwrap();
        assert!(home.join(".bashrc").symlink_metadata().unwrap().is_symlink());
        assert_eq!(
            fs::read_to_string(home.join(".bashrc.homefiles-backup")).unwrap(),
            "local"
        );
    }

    #[test]
    fn later_bundle_wins() {
        let (_tmp, repo, home) = setup();
        fs::create_dir_all(repo.join("os-linux")).unwrap();
        fs::write(repo.join("os-linux/.bashrc"), "linux").unwrap();
        let (ctx, _log) = fs_context(&repo, &home, &["default", "os-linux"]);

        LinkBundles::new(false).run(&ctx).unwrap();
        assert_eq!(
            fs::read_link(home.join(".bashrc")).unwrap(),
            repo.join("os-linux/.bashrc")
        );
    }

    #[test]
    fn parallel_run_links_everything() {
        let (_tmp, repo, home) = setup();
        let (mut ctx, _log) = fs_context(&repo, &home, &["default"]);
        ctx.parallel = true;

        LinkBundles::new(false).run(&ctx).unwrap();
        assert!(home.join(".bashrc").symlink_metadata().unwrap().is_symlink());
        assert!(home.join(".config/git/config").symlink_metadata().unwrap().is_symlink());
    }

    #[test]
    fn not_applicable_without_bundles() {
        let (_tmp, repo, home) = setup();
        let (ctx, _log) = fs_context(&repo, &home, &[]);
        assert!(!LinkBundles::new(false).should_run(&ctx));
    }
}
