//! Bundle discovery and link planning.
//!
//! A bundle is a top-level, non-hidden directory of the repository whose
//! contents mirror the home directory. [`plan`] merges the active bundles
//! into one [`LinkPlan`] describing every symlink to create.
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::ignore::IgnoreRules;

/// Marker file that makes a directory link as a single unit.
pub const TRACKED_DIR_MARKER: &str = ".trackeddir";

/// Whether an entry links a single file or a whole directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file or symlink.
    File,
    /// Directory carrying the [`TRACKED_DIR_MARKER`].
    Dir,
}

/// One linkable item inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    /// Bundle the entry comes from.
    pub bundle: String,
    /// Path relative to both the bundle and the home directory.
    pub rel: PathBuf,
    /// Absolute path inside the repository.
    pub source: PathBuf,
    /// File or directory entry.
    pub kind: EntryKind,
}

/// An entry from `replaced` that a later bundle `by` took over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    /// Relative path.
    pub rel: PathBuf,
    /// Bundle whose entry was discarded.
    pub replaced: String,
    /// Bundle whose entry won.
    pub by: String,
}

/// An entry dropped because it lies beneath another entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Relative path of the dropped entry.
    pub rel: PathBuf,
    /// Bundle of the dropped entry.
    pub bundle: String,
    /// Relative path of the enclosing entry.
    pub parent: PathBuf,
    /// Bundle of the enclosing entry.
    pub parent_bundle: String,
}

/// Merged result of all active bundles, sorted by relative path.
#[derive(Debug, Clone, Default)]
pub struct LinkPlan {
    /// Entries to link.
    pub entries: Vec<BundleEntry>,
    /// Paths provided by more than one bundle.
    pub overrides: Vec<Override>,
    /// Entries dropped because an enclosing path is linked as a whole.
    pub conflicts: Vec<Conflict>,
}

impl LinkPlan {
    /// Number of entries per bundle, in the order of `bundles`.
    #[must_use]
    pub fn counts(&self, bundles: &[String]) -> Vec<(String, usize)> {
        bundles
            .iter()
            .map(|b| {
                let n = self.entries.iter().filter(|e| &e.bundle == b).count();
                (b.clone(), n)
            })
            .collect()
    }
}

/// List the bundles in `repo`: top-level non-hidden directories, sorted.
///
/// Names that are not valid UTF-8 are skipped.
///
/// # Errors
///
/// Returns an error if `repo` cannot be read.
pub fn discover(repo: &Path) -> Result<Vec<String>> {
    let mut bundles = Vec::new();
    for entry in
        std::fs::read_dir(repo).with_context(|| format!("reading directory {}", repo.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", repo.display()))?;
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            bundles.push(name);
        }
    }
    bundles.sort();
    Ok(bundles)
}

/// Walk bundle `bundle` of `repo` depth-first in sorted order.
///
/// Files and symlinks become [`EntryKind::File`] entries. A directory that
/// contains [`TRACKED_DIR_MARKER`] becomes one [`EntryKind::Dir`] entry and is
/// not descended; other directories are descended.
///
/// # Errors
///
/// Returns an error if a directory in the bundle cannot be read.
pub fn collect(repo: &Path, bundle: &str, ignore: &IgnoreRules) -> Result<Vec<BundleEntry>> {
    let root = repo.join(bundle);
    let mut entries = Vec::new();
    walk(&root, &root, bundle, ignore, &mut entries)?;
    Ok(entries)
}

fn walk(
    root: &Path,
    dir: &Path,
    bundle: &str,
    ignore: &IgnoreRules,
    out: &mut Vec<BundleEntry>,
) -> Result<()> {
    let mut children: Vec<std::fs::DirEntry> = std::fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("reading entry in {}", dir.display()))?;
    children.sort_by_key(std::fs::DirEntry::file_name);

    for child in children {
        if ignore.is_ignored_os(&child.file_name()) {
            continue;
        }
        let path = child.path();
        let file_type = child
            .file_type()
            .with_context(|| format!("reading file type of {}", path.display()))?;
        let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

        let kind = if file_type.is_dir() {
            if path.join(TRACKED_DIR_MARKER).exists() {
                EntryKind::Dir
            } else {
                walk(root, &path, bundle, ignore, out)?;
                continue;
            }
        } else {
            EntryKind::File
        };

        out.push(BundleEntry {
            bundle: bundle.to_string(),
            rel,
            source: path,
            kind,
        });
    }
    Ok(())
}

/// Merge `bundles` (in precedence order) into a [`LinkPlan`].
///
/// Each relative path appears at most once; a later bundle replaces an
/// earlier one and the replacement is recorded in [`LinkPlan::overrides`].
/// Entries lying beneath another entry are dropped and recorded in
/// [`LinkPlan::conflicts`], since linking them would write through the
/// enclosing link.
///
/// # Errors
///
/// Returns an error if any bundle cannot be walked.
pub fn plan(repo: &Path, bundles: &[String], ignore: &IgnoreRules) -> Result<LinkPlan> {
    let mut merged: BTreeMap<PathBuf, BundleEntry> = BTreeMap::new();
    let mut overrides = Vec::new();

    for bundle in bundles {
        for entry in collect(repo, bundle, ignore)? {
            if let Some(previous) = merged.insert(entry.rel.clone(), entry.clone()) {
                overrides.push(Override {
                    rel: entry.rel,
                    replaced: previous.bundle,
                    by: bundle.clone(),
                });
            }
        }
    }

    let occupied: BTreeSet<PathBuf> = merged.keys().cloned().collect();
    let mut entries = Vec::with_capacity(merged.len());
    let mut conflicts = Vec::new();

    for (rel, entry) in &merged {
        let enclosing = rel
            .ancestors()
            .skip(1)
            .find(|a| !a.as_os_str().is_empty() && occupied.contains(*a));
        match enclosing.and_then(|a| merged.get(a)) {
            Some(parent) => conflicts.push(Conflict {
                rel: rel.clone(),
                bundle: entry.bundle.clone(),
                parent: parent.rel.clone(),
                parent_bundle: parent.bundle.clone(),
            }),
            None => entries.push(entry.clone()),
        }
    }

    Ok(LinkPlan {
        entries,
        overrides,
        conflicts,
    })
}
