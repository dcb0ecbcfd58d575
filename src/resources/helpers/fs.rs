//! File-system helpers shared by resources and tracking.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Whether anything (including a dangling symlink) exists at `path`.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Recursively copy a directory tree.
///
/// With `follow_links`, symlinks inside `src` are followed and their content
/// copied. Without it, symlinks are recreated as symlinks (Unix only; on other
/// platforms they are followed).
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path, follow_links: bool) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let is_link = entry.file_type().is_ok_and(|t| t.is_symlink());
        if is_link && !follow_links && cfg!(unix) {
            copy_link(&src_path, &dst_path)?;
        } else if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path, follow_links)?;
        } else {
            std::fs::copy(&src_path, &dst_path).with_context(|| {
                format!("copying {} to {}", src_path.display(), dst_path.display())
            })?;
        }
    }
    Ok(())
}

/// Recreate the symlink at `src` as `dst`.
fn copy_link(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        let target =
            std::fs::read_link(src).with_context(|| format!("reading link {}", src.display()))?;
        std::os::unix::fs::symlink(&target, dst)
            .with_context(|| format!("creating link {}", dst.display()))?;
    }
    #[cfg(not(unix))]
    {
        std::fs::copy(src, dst)
            .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    }
    Ok(())
}

/// Move `from` to `to`, creating parent directories of `to`.
///
/// Tries a rename first and falls back to copy + delete when the rename
/// fails (e.g. across filesystems). Symlinks are moved as links. When the
/// fallback fails with the original still whole, the copy at `to` is
/// discarded.
///
/// # Errors
///
/// Returns an error if the copy or the removal of the original fails.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    ensure_parent_dir(to)?;
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let meta = std::fs::symlink_metadata(from)
        .with_context(|| format!("reading metadata: {}", from.display()))?;
    let is_dir = meta.is_dir();
    let copied = if meta.is_symlink() {
        copy_link(from, to)
    } else if is_dir {
        copy_dir_recursive(from, to, false)
    } else {
        std::fs::copy(from, to)
            .map(|_| ())
            .with_context(|| format!("copying {} to {}", from.display(), to.display()))
    };
    if let Err(e) = copied {
        discard(to);
        return Err(e);
    }

    if is_dir {
        // A partly removed original leaves the copy as the only complete one.
        std::fs::remove_dir_all(from).with_context(|| format!("removing {}", from.display()))?;
    } else if let Err(e) = std::fs::remove_file(from) {
        discard(to);
        return Err(e).with_context(|| format!("removing {}", from.display()));
    }
    Ok(())
}

/// Best-effort removal of whatever is at `path`.
fn discard(path: &Path) {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => {
            let _ = std::fs::remove_dir_all(path);
        }
        Ok(_) => {
            let _ = std::fs::remove_file(path);
        }
        Err(_) => {}
    }
}

/// Remove empty directories from `start` upwards, stopping before `stop`.
///
/// `stop` itself is never removed, and nothing outside `stop` is touched.
///
/// # Errors
///
/// Returns an error if an empty directory cannot be removed.
pub fn prune_empty_dirs(start: &Path, stop: &Path) -> Result<()> {
    let mut current = start;
    while current != stop && current.starts_with(stop) {
        let is_empty = std::fs::read_dir(current).is_ok_and(|mut entries| entries.next().is_none());
        if !is_empty {
            break;
        }
        std::fs::remove_dir(current)
            .with_context(|| format!("removing empty directory {}", current.display()))?;
        let Some(parent) = current.parent() else {
            break;
        };
        current = parent;
    }
    Ok(())
}
