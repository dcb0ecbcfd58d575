//! Command: report link and repository status.
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::CommandSetup;
use crate::bundles::EntryKind;
use crate::cli::{GlobalOpts, StatusOpts};
use crate::git::{FileChange, Repository};
use crate::logging::Logger;
use crate::resources::symlink::{LinkState, SymlinkResource};
use crate::tasks::Context;
use crate::tasks::link::plan_links;

/// State of one planned link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    /// Path relative to the home directory.
    pub path: PathBuf,
    /// Bundle providing the entry.
    pub bundle: String,
    /// File or directory entry.
    pub kind: EntryKind,
    /// What is currently at the target.
    pub state: LinkState,
}

/// Everything `status` reports.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Repository root.
    pub repo: PathBuf,
    /// Checked-out branch, if any.
    pub branch: Option<String>,
    /// URL of the sync remote, if configured.
    pub remote: Option<String>,
    /// Active bundles in precedence order.
    pub bundles: Vec<String>,
    /// One entry per planned link, sorted by path.
    pub links: Vec<LinkStatus>,
    /// Uncommitted changes in the repository.
    pub changes: Vec<FileChange>,
}

impl StatusReport {
    /// Number of links in `state`.
    #[must_use]
    pub fn count(&self, state: LinkState) -> usize {
        self.links.iter().filter(|l| l.state == state).count()
    }
}

/// Inspect every planned link and the repository.
///
/// # Errors
///
/// Returns an error if a bundle or link target cannot be read, or the
/// repository status cannot be determined.
pub fn collect(ctx: &Context) -> Result<StatusReport> {
    let plan = plan_links(ctx)?;
    let mut links = Vec::with_capacity(plan.entries.len());
    for entry in plan.entries {
        let target = ctx.home_path(&entry.rel);
        let state = SymlinkResource::new(entry.source, target).link_state()?;
        links.push(LinkStatus {
            path: entry.rel,
            bundle: entry.bundle,
            kind: entry.kind,
            state,
        });
    }

    let (branch, remote, changes) = match Repository::open(ctx.repo()) {
        Ok(repo) => (
            repo.current_branch()?,
            repo.remote_url(&ctx.config.settings.sync.remote),
            repo.status()?,
        ),
        Err(_) => (None, None, Vec::new()),
    };

    Ok(StatusReport {
        repo: ctx.repo().to_path_buf(),
        branch,
        remote,
        bundles: ctx.config.bundles.clone(),
        links,
        changes,
    })
}

/// Human-readable rendering of a report.
#[must_use]
pub fn render_text(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "repo: {}", report.repo.display());
    let _ = writeln!(
        out,
        "branch: {}",
        report.branch.as_deref().unwrap_or("(detached)")
    );
    if let Some(remote) = &report.remote {
        let _ = writeln!(out, "remote: {remote}");
    }
    let _ = writeln!(out, "bundles: {}", report.bundles.join(", "));

    let _ = writeln!(out, "links:");
    for link in &report.links {
        let suffix = if link.kind == EntryKind::Dir { "/" } else { "" };
        let _ = writeln!(
            out,
            "  {:<8} {}{suffix} ({})",
            link.state,
            link.path.display(),
            link.bundle
        );
    }
    let _ = writeln!(
        out,
        "{} linked, {} missing, {} conflict, {} differs, {} broken",
        report.count(LinkState::Linked),
        report.count(LinkState::Missing),
        report.count(LinkState::Conflict),
        report.count(LinkState::Differs),
        report.count(LinkState::Broken)
    );

    if report.changes.is_empty() {
        let _ = writeln!(out, "repository clean");
    } else {
        let _ = writeln!(out, "changes:");
        for change in &report.changes {
            let _ = writeln!(out, "  {} {}", change.status.code(), change.path);
        }
    }
    out
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if setup fails or the status cannot be collected.
pub fn run(global: &GlobalOpts, opts: &StatusOpts, log: &Arc<Logger>) -> Result<()> {
    let ctx = CommandSetup::init(global, log)?.context(global, log);
    let report = collect(&ctx)?;
    let text = if opts.json {
        let mut json = serde_json::to_string_pretty(&report).context("serializing status")?;
        json.push('\n');
        json
    } else {
        render_text(&report)
    };
    std::io::stdout()
        .lock()
        .write_all(text.as_bytes())
        .context("writing to stdout")
}
