//! Symlink resource.
use anyhow::{Context as _, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::helpers::fs::{copy_dir_recursive, ensure_parent_dir, entry_exists};
use super::{Resource, ResourceChange, ResourceState};

/// Suffix appended to a real file moved aside by a forced link.
pub const BACKUP_SUFFIX: &str = ".homefiles-backup";

/// What currently occupies a link target, as reported by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    /// Symlink to the expected source.
    Linked,
    /// Nothing at the target.
    Missing,
    /// A real file or directory is in the way.
    Conflict,
    /// Symlink to some other existing path.
    Differs,
    /// Symlink to some other path that does not exist.
    Broken,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Linked => "linked",
            Self::Missing => "missing",
            Self::Conflict => "conflict",
            Self::Differs => "differs",
            Self::Broken => "broken",
        };
        f.pad(s)
    }
}

/// A symlink resource that can be checked and applied.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
    /// Replace real files at the target, backing them up unless identical.
    pub force: bool,
    /// On removal, leave a copy of the source in place of the link.
    pub restore_on_remove: bool,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self {
            source,
            target,
            force: false,
            restore_on_remove: false,
        }
    }

    /// Set [`force`](Self::force).
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set [`restore_on_remove`](Self::restore_on_remove).
    #[must_use]
    pub const fn with_restore(mut self, restore: bool) -> Self {
        self.restore_on_remove = restore;
        self
    }

    /// Path a forced link moves an existing target to.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .target
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(BACKUP_SUFFIX);
        self.target.with_file_name(name)
    }

    /// Classify what is at the target for status reporting.
    ///
    /// # Errors
    ///
    /// Returns an error if the target's metadata or link cannot be read.
    pub fn link_state(&self) -> Result<LinkState> {
        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LinkState::Missing),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.target.display()));
            }
        };
        if !meta.is_symlink() {
            return Ok(LinkState::Conflict);
        }
        let existing = std::fs::read_link(&self.target)
            .with_context(|| format!("reading link {}", self.target.display()))?;
        if paths_equal(&existing, &self.source) {
            Ok(LinkState::Linked)
        } else if self.target.exists() {
            Ok(LinkState::Differs)
        } else {
            Ok(LinkState::Broken)
        }
    }

    /// Move the real file or directory at the target out of the way.
    fn clear_real_target(&self, meta: &std::fs::Metadata) -> Result<()> {
        if meta.is_file() && self.source.is_file() && same_content(&self.source, &self.target)? {
            std::fs::remove_file(&self.target)
                .with_context(|| format!("remove identical: {}", self.target.display()))?;
            return Ok(());
        }
        let backup = self.backup_path();
        if entry_exists(&backup) {
            return Err(ResourceError::BackupExists {
                path: self.target.display().to_string(),
                backup: backup.display().to_string(),
            }
            .into());
        }
        std::fs::rename(&self.target, &backup).with_context(|| {
            format!(
                "back up {} to {}",
                self.target.display(),
                backup.display()
            )
        })
    }
}

impl Resource for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !entry_exists(&self.source) {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceState::Missing);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.target.display()));
            }
        };

        if meta.is_symlink() {
            let existing = std::fs::read_link(&self.target)
                .with_context(|| format!("reading link {}", self.target.display()))?;
            return Ok(if paths_equal(&existing, &self.source) {
                ResourceState::Correct
            } else {
                ResourceState::Incorrect {
                    current: format!("points to {}", existing.display()),
                }
            });
        }

        let what = if meta.is_dir() { "directory" } else { "file" };
        if self.force {
            Ok(ResourceState::Incorrect {
                current: format!("existing {what}"),
            })
        } else {
            Ok(ResourceState::Invalid {
                reason: format!("target exists and is not a symlink ({what})"),
            })
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !entry_exists(&self.source) {
            return Err(ResourceError::SourceMissing {
                path: self.source.display().to_string(),
            }
            .into());
        }
        ensure_parent_dir(&self.target)?;

        match std::fs::symlink_metadata(&self.target) {
            Ok(meta) if meta.is_symlink() => {
                if std::fs::read_link(&self.target).is_ok_and(|p| paths_equal(&p, &self.source)) {
                    return Ok(ResourceChange::AlreadyCorrect);
                }
                remove_symlink(&self.target)
                    .with_context(|| format!("remove existing: {}", self.target.display()))?;
            }
            Ok(meta) => {
                if !self.force {
                    return Ok(ResourceChange::Skipped {
                        reason: ResourceError::TargetOccupied {
                            path: self.target.display().to_string(),
                        }
                        .to_string(),
                    });
                }
                self.clear_real_target(&meta)?;
            }
            Err(_) => {}
        }

        create_symlink(&self.source, &self.target)
            .with_context(|| format!("create link: {}", self.target.display()))?;

        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        if self.restore_on_remove {
            // Leave the user with a real copy instead of nothing.
            copy_into_place(&self.source, &self.target).with_context(|| {
                format!(
                    "materialize {} -> {}",
                    self.target.display(),
                    self.source.display()
                )
            })?;
        } else {
            remove_symlink(&self.target)
                .with_context(|| format!("remove link: {}", self.target.display()))?;
        }
        Ok(ResourceChange::Applied)
    }
}

/// Whether two regular files have the same SHA-256 digest.
fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let digest = |p: &Path| -> Result<_> {
        let bytes = std::fs::read(p).with_context(|| format!("reading {}", p.display()))?;
        Ok(Sha256::digest(&bytes))
    };
    Ok(digest(a)? == digest(b)?)
}

/// Copy `source` into `target`, replacing the symlink that currently lives at
/// `target`.  Files are staged to a sibling temp path first so that the window
/// where `target` is absent is as small as possible.  Directory symlinks
/// inside the source are followed.
fn copy_into_place(source: &Path, target: &Path) -> Result<()> {
    copy_into_place_with(source, target, |from, to| std::fs::rename(from, to))
}

/// [`copy_into_place`] with the final rename supplied by the caller. If the
/// rename fails the link to `source` is put back.
fn copy_into_place_with(
    source: &Path,
    target: &Path,
    rename: impl FnOnce(&Path, &Path) -> std::io::Result<()>,
) -> Result<()> {
    let tmp = staging_path(target);
    if source.is_dir() {
        copy_dir_recursive(source, &tmp, true)
            .with_context(|| format!("recursive copy {} to {}", source.display(), tmp.display()))?;
    } else {
        std::fs::copy(source, &tmp)
            .with_context(|| format!("copy {} to {}", source.display(), tmp.display()))?;
    }

    let cleanup = || {
        if tmp.is_dir() {
            let _ = std::fs::remove_dir_all(&tmp);
        } else {
            let _ = std::fs::remove_file(&tmp);
        }
    };

    if let Err(e) = remove_symlink(target) {
        cleanup();
        return Err(e).with_context(|| format!("remove symlink: {}", target.display()));
    }
    if let Err(e) = rename(&tmp, target) {
        cleanup();
        create_symlink(source, target)
            .with_context(|| format!("relinking {} after failed restore", target.display()))?;
        return Err(e).with_context(|| format!("rename {} to {}", tmp.display(), target.display()));
    }
    Ok(())
}

/// Sibling path used while materializing `target`.
fn staging_path(target: &Path) -> PathBuf {
    let stem = target.file_name().map_or_else(
        || "homefiles_tmp".to_string(),
        |n| format!("{}.homefiles_tmp", n.to_string_lossy()),
    );
    target.with_file_name(stem)
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        let result = if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.with_context(|| {
            format!(
                "creating symlink {} -> {} (requires developer mode or admin)",
                link.display(),
                target.display()
            )
        })?;
    }

    Ok(())
}

/// Remove a symlink, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir`, and
/// `symlink_metadata().is_dir()` is `false` for them, so the raw
/// `FILE_ATTRIBUTE_DIRECTORY` flag is checked instead.
pub(crate) fn remove_symlink(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    if is_dir_like(&meta) {
        std::fs::remove_dir(path).with_context(|| format!("removing link: {}", path.display()))?;
    } else {
        std::fs::remove_file(path).with_context(|| format!("removing file: {}", path.display()))?;
    }
    Ok(())
}

fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

#[cfg(test)]
#[cfg(unix)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    struct Fixture {
        _dir: tempfile::TempDir,
        source: PathBuf,
        target: PathBuf,
    }

    fn fixture(content: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/default/.bashrc");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, content).unwrap();
        let target = dir.path().join("home/.bashrc");
        Fixture {
            _dir: dir,
            source,
            target,
        }
    }

    #[test]
    fn paths_equal_works() {
        assert!(paths_equal(Path::new("/tmp/test"), Path::new("/tmp/test")));
        assert!(!paths_equal(Path::new("/tmp/test"), Path::new("/tmp/other")));
    }

    #[test]
    fn description_mentions_both_paths() {
        let r = SymlinkResource::new(PathBuf::from("/source"), PathBuf::from("/target"));
        assert_eq!(r.description(), "/target -> /source");
    }

    #[test]
    fn backup_path_appends_suffix() {
        let r = SymlinkResource::new(PathBuf::from("/s"), PathBuf::from("/home/u/.bashrc"));
        assert_eq!(r.backup_path(), PathBuf::from("/home/u/.bashrc.homefiles-backup"));
    }

    #[test]
    fn invalid_when_source_missing() {
        let f = fixture("x");
        std::fs::remove_file(&f.source).unwrap();
        let r = SymlinkResource::new(f.source.clone(), f.target.clone());
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        assert!(r.apply().is_err());
    }

    #[test]
    fn missing_then_applied_then_correct() {
        let f = fixture("x");
        let r = SymlinkResource::new(f.source.clone(), f.target.clone());
        assert_eq!(r.current_state().unwrap(), ResourceState::Missing);
        assert_eq!(r.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(r.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(std::fs::read_link(&f.target).unwrap(), f.source);
        assert_eq!(r.apply().unwrap(), ResourceChange::AlreadyCorrect);
        assert_eq!(r.link_state().unwrap(), LinkState::Linked);
    }

    #[test]
    fn incorrect_link_is_replaced() {
        let f = fixture("x");
        let other = f.source.with_file_name("other");
        std::fs::write(&other, "o").unwrap();
        std::fs::create_dir_all(f.target.parent().unwrap()).unwrap();
        symlink(&other, &f.target).unwrap();

        let r = SymlinkResource::new(f.source.clone(), f.target.clone());
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        assert_eq!(r.link_state().unwrap(), LinkState::Differs);
        r.apply().unwrap();
        assert_eq!(std::fs::read_link(&f.target).unwrap(), f.source);
    }

    #[test]
    fn dangling_foreign_link_is_broken() {
        let f = fixture("x");
        std::fs::create_dir_all(f.target.parent().unwrap()).unwrap();
        symlink("/nonexistent/elsewhere", &f.target).unwrap();
        let r = SymlinkResource::new(f.source.clone(), f.target.clone());
        assert_eq!(r.link_state().unwrap(), LinkState::Broken);
    }

    #[test]
    fn real_file_is_invalid_without_force() {
        let f = fixture("x");
        std::fs::create_dir_all(f.target.parent().unwrap()).unwrap();
        std::fs::write(&f.target, "mine").unwrap();

        let r = SymlinkResource::new(f.source.clone(), f.target.clone());
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        assert_eq!(r.link_state().unwrap(), LinkState::Conflict);
        assert!(matches!(
            r.apply().unwrap(),
            ResourceChange::Skipped { .. }
        ));
        assert_eq!(std::fs::read_to_string(&f.target).unwrap(), "mine");
    }

    #[test]
    fn force_replaces_identical_file_without_backup() {
        let f = fixture("same");
        std::fs::create_dir_all(f.target.parent().unwrap()).unwrap();
        std::fs::write(&f.target, "same").unwrap();

        let r = SymlinkResource::new(f.source.clone(), f.target.clone()).with_force(true);
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        r.apply().unwrap();
        assert_eq!(std::fs::read_link(&f.target).unwrap(), f.source);
        assert!(!entry_exists(&r.backup_path()));
    }

    #[test]
    fn force_backs_up_different_file() {
        let f = fixture("repo version");
        std::fs::create_dir_all(f.target.parent().unwrap()).unwrap();
        std::fs::write(&f.target, "local version").unwrap();

        let r = SymlinkResource::new(f.source.clone(), f.target.clone()).with_force(true);
        r.apply().unwrap();
        assert_eq!(std::fs::read_link(&f.target).unwrap(), f.source);
        assert_eq!(
            std::fs::read_to_string(r.backup_path()).unwrap(),
            "local version"
        );
    }

    #[test]
    fn force_backs_up_directory() {
        let f = fixture("x");
        std::fs::create_dir_all(&f.target).unwrap();
        std::fs::write(f.target.join("inner"), "i").unwrap();

        let r = SymlinkResource::new(f.source.clone(), f.target.clone()).with_force(true);
        r.apply().unwrap();
        assert!(f.target.symlink_metadata().unwrap().is_symlink());
        assert!(r.backup_path().join("inner").exists());
    }

    #[test]
    fn force_fails_when_backup_exists() {
        let f = fixture("repo");
        std::fs::create_dir_all(f.target.parent().unwrap()).unwrap();
        std::fs::write(&f.target, "local").unwrap();
        let r = SymlinkResource::new(f.source.clone(), f.target.clone()).with_force(true);
        std::fs::write(r.backup_path(), "older backup").unwrap();

        let err = r.apply().unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<ResourceError>(),
                Some(ResourceError::BackupExists { .. })
            ),
            "got {err:#}"
        );
        assert_eq!(std::fs::read_to_string(&f.target).unwrap(), "local");
    }

    #[test]
    fn remove_deletes_link() {
        let f = fixture("x");
        let r = SymlinkResource::new(f.source.clone(), f.target.clone());
        r.apply().unwrap();
        r.remove().unwrap();
        assert!(!entry_exists(&f.target));
        assert!(f.source.exists());
    }

    #[test]
    fn remove_with_restore_materializes_file() {
        let f = fixture("hello homefiles");
        let r = SymlinkResource::new(f.source.clone(), f.target.clone()).with_restore(true);
        r.apply().unwrap();
        r.remove().unwrap();
        let meta = std::fs::symlink_metadata(&f.target).unwrap();
        assert!(meta.is_file());
        assert_eq!(
            std::fs::read_to_string(&f.target).unwrap(),
            "hello homefiles"
        );
    }

    #[test]
    fn remove_with_restore_materializes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/default/.vim");
        std::fs::create_dir_all(source.join("colors")).unwrap();
        std::fs::write(source.join("colors/x.vim"), "x").unwrap();
        let target = dir.path().join("home/.vim");

        let r = SymlinkResource::new(source, target.clone()).with_restore(true);
        r.apply().unwrap();
        r.remove().unwrap();
        let meta = std::fs::symlink_metadata(&target).unwrap();
        assert!(meta.is_dir());
        assert_eq!(std::fs::read_to_string(target.join("colors/x.vim")).unwrap(), "x");
    }

    #[test]
    fn failed_restore_rename_puts_link_back() {
        let f = fixture("hello homefiles");
        SymlinkResource::new(f.source.clone(), f.target.clone())
            .apply()
            .unwrap();

        let err = copy_into_place_with(&f.source, &f.target, |_, _| {
            Err(std::io::Error::other("rename refused"))
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("rename refused"));
        assert_eq!(std::fs::read_link(&f.target).unwrap(), f.source);
        assert!(!entry_exists(&staging_path(&f.target)));
    }

    #[test]
    fn link_state_missing() {
        let f = fixture("x");
        let r = SymlinkResource::new(f.source.clone(), f.target.clone());
        assert_eq!(r.link_state().unwrap(), LinkState::Missing);
        assert_eq!(LinkState::Missing.to_string(), "missing");
    }
}
