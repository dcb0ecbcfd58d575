//! Moving home-directory files into bundles and back.
//!
//! `track` moves a file or directory from `$HOME` into
//! `<repo>/<bundle>/<rel>` and links it back; `untrack` reverses that.
//! Directories are marked with [`TRACKED_DIR_MARKER`] so the bundle walker
//! links them as a single entry.
use anyhow::{Context as _, Result};
use std::path::{Component, Path, PathBuf};

use crate::bundles::TRACKED_DIR_MARKER;
use crate::config::validate_bundle_name;
use crate::error::{HomefilesError, TrackError};
use crate::resources::Resource;
use crate::resources::error::ResourceError;
use crate::resources::helpers::fs::{entry_exists, move_path, prune_empty_dirs};
use crate::resources::symlink::{SymlinkResource, remove_symlink};
use crate::tasks::Context;

/// A validated `track` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    /// Absolute path in the home directory.
    pub path: PathBuf,
    /// Path relative to the home directory.
    pub rel: PathBuf,
    /// Destination inside the bundle.
    pub dest: PathBuf,
    /// Whether the tracked item is a directory.
    pub is_dir: bool,
}

/// A validated `untrack` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntrackRequest {
    /// Absolute path of the link in the home directory.
    pub path: PathBuf,
    /// Repository item the link points at.
    pub source: PathBuf,
    /// Bundle directory holding the item.
    pub bundle_dir: PathBuf,
    /// Whether the repository item is a directory.
    pub is_dir: bool,
}

/// Make `path` absolute against the current directory and resolve `.`/`..`
/// lexically. Symlinks are not followed.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot determine current directory")?
            .join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve symlinks in the directories above `path`. The final component is
/// kept as given so a link there is inspected rather than followed. A path
/// that resolves to `home` as a whole becomes `home`.
fn resolve_parents(path: &Path, home: &Path) -> PathBuf {
    if dunce::canonicalize(path).is_ok_and(|p| p == home) {
        return home.to_path_buf();
    }
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    dunce::canonicalize(parent).map_or_else(|_| path.to_path_buf(), |p| p.join(name))
}

/// The absolute target of the symlink at `link`, if it is one.
fn link_target(link: &Path) -> Option<PathBuf> {
    let target = std::fs::read_link(link).ok()?;
    if target.is_absolute() {
        Some(normalize(&target))
    } else {
        link.parent().map(|parent| normalize(&parent.join(target)))
    }
}

/// Check every precondition of tracking `path` (already absolute) into
/// `bundle`.
///
/// # Errors
///
/// Returns [`HomefilesError::Config`] for an invalid bundle name and
/// [`HomefilesError::Track`] when the path cannot be tracked.
pub fn validate_track(
    ctx: &Context,
    path: &Path,
    bundle: &str,
) -> Result<TrackRequest, HomefilesError> {
    validate_bundle_name(bundle)?;
    let shown = path.display().to_string();

    let rel = path
        .strip_prefix(&ctx.home)
        .map_err(|_| TrackError::NotInHome(shown.clone()))?;
    if rel.as_os_str().is_empty() {
        return Err(TrackError::IsHome.into());
    }
    if path.starts_with(ctx.repo()) {
        return Err(TrackError::InsideRepo(shown).into());
    }
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Err(TrackError::NotFound(shown).into());
    };
    if meta.is_symlink() && link_target(path).is_some_and(|t| t.starts_with(ctx.repo())) {
        return Err(TrackError::AlreadyTracked(shown).into());
    }
    for ancestor in path.ancestors().skip(1) {
        if ancestor == ctx.home || !ancestor.starts_with(&ctx.home) {
            break;
        }
        if link_target(ancestor).is_some_and(|t| t.starts_with(ctx.repo())) {
            return Err(TrackError::InsideTrackedDir {
                path: shown,
                dir: ancestor.display().to_string(),
            }
            .into());
        }
    }

    let dest = ctx.config.bundle_dir(bundle).join(rel);
    if entry_exists(&dest) {
        return Err(TrackError::DestinationExists(dest.display().to_string()).into());
    }

    Ok(TrackRequest {
        path: path.to_path_buf(),
        rel: rel.to_path_buf(),
        dest,
        is_dir: meta.is_dir(),
    })
}

/// Check every precondition of untracking `path` (already absolute).
///
/// # Errors
///
/// Returns [`HomefilesError::Track`] if `path` is not a link into a bundle,
/// or [`HomefilesError::Resource`] if the repository item is gone.
pub fn validate_untrack(ctx: &Context, path: &Path) -> Result<UntrackRequest, HomefilesError> {
    let shown = path.display().to_string();
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Err(TrackError::NotFound(shown).into());
    };
    if !meta.is_symlink() {
        return Err(TrackError::NotTracked(shown).into());
    }
    let Some(source) = link_target(path) else {
        return Err(TrackError::NotTracked(shown).into());
    };
    let Ok(in_repo) = source.strip_prefix(ctx.repo()) else {
        return Err(TrackError::NotTracked(shown).into());
    };
    let mut components = in_repo.components();
    let (Some(bundle), Some(_)) = (components.next(), components.next()) else {
        return Err(TrackError::NotTracked(shown).into());
    };
    let bundle_dir = ctx.repo().join(bundle);
    if !entry_exists(&source) {
        return Err(ResourceError::SourceMissing {
            path: source.display().to_string(),
        }
        .into());
    }
    Ok(UntrackRequest {
        path: path.to_path_buf(),
        is_dir: source.is_dir(),
        source,
        bundle_dir,
    })
}

/// Move `path` into `bundle` and symlink it back.
///
/// # Errors
///
/// Returns an error if a precondition fails or the move or link fails. A
/// failed link moves the item back to where it was.
pub fn track(ctx: &Context, path: &Path, bundle: &str) -> Result<()> {
    let path = resolve_parents(&absolutize(path)?, &ctx.home);
    let req = validate_track(ctx, &path, bundle)?;

    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would move {} to {} and link it back",
            req.path.display(),
            req.dest.display()
        ));
        return Ok(());
    }

    move_path(&req.path, &req.dest)
        .with_context(|| format!("moving {} into bundle {bundle}", req.path.display()))?;
    if req.is_dir {
        std::fs::write(req.dest.join(TRACKED_DIR_MARKER), b"")
            .with_context(|| format!("marking {} as a tracked directory", req.dest.display()))?;
    }

    let link = SymlinkResource::new(req.dest.clone(), req.path.clone());
    if let Err(e) = link.apply() {
        ctx.log
            .warn(&format!("linking failed, moving {} back", req.path.display()));
        if req.is_dir {
            let _ = std::fs::remove_file(req.dest.join(TRACKED_DIR_MARKER));
        }
        move_path(&req.dest, &req.path)
            .with_context(|| format!("restoring {}", req.path.display()))?;
        return Err(e);
    }

    ctx.log.info(&format!(
        "tracked {} in bundle {bundle}",
        req.rel.display()
    ));
    if !ctx.config.bundles.iter().any(|b| b == bundle)
        && !ctx.config.auto_selects(bundle, &ctx.platform)
    {
        ctx.log
            .warn(&format!("bundle {bundle} is not active on this machine"));
    }
    Ok(())
}

/// Replace the link at `path` with the repository item it points at.
///
/// # Errors
///
/// Returns an error if `path` is not a link into a bundle or the move fails.
pub fn untrack(ctx: &Context, path: &Path) -> Result<()> {
    let path = resolve_parents(&absolutize(path)?, &ctx.home);
    let req = validate_untrack(ctx, &path)?;

    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would move {} back to {}",
            req.source.display(),
            req.path.display()
        ));
        return Ok(());
    }

    remove_symlink(&req.path)?;
    if let Err(e) = move_path(&req.source, &req.path) {
        ctx.log
            .warn(&format!("moving back failed, relinking {}", req.path.display()));
        SymlinkResource::new(req.source.clone(), req.path.clone())
            .apply()
            .with_context(|| format!("relinking {}", req.path.display()))?;
        return Err(e.context(format!(
            "moving {} back to {}",
            req.source.display(),
            req.path.display()
        )));
    }
    if req.is_dir {
        let marker = req.path.join(TRACKED_DIR_MARKER);
        if entry_exists(&marker) {
            std::fs::remove_file(&marker)
                .with_context(|| format!("removing {}", marker.display()))?;
        }
    }
    if let Some(parent) = req.source.parent() {
        prune_empty_dirs(parent, &req.bundle_dir)?;
    }

    ctx.log.info(&format!("untracked {}", req.path.display()));
    Ok(())
}
