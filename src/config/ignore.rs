//! Name-based ignore rules applied while walking bundles.
use std::ffi::OsStr;

use crate::bundles::TRACKED_DIR_MARKER;

/// Names that are never linked into the home directory.
pub const BUILTIN_IGNORES: &[&str] = &[
    ".git",
    ".gitignore",
    ".gitkeep",
    ".gitmodules",
    TRACKED_DIR_MARKER,
];

/// A single ignore pattern, matched against one path component.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    /// `*suffix`
    Suffix(String),
    /// `prefix*`
    Prefix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        if let Some(suffix) = raw.strip_prefix('*') {
            Self::Suffix(suffix.to_string())
        } else if let Some(prefix) = raw.strip_suffix('*') {
            Self::Prefix(prefix.to_string())
        } else {
            Self::Exact(raw.to_string())
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            Self::Suffix(suffix) => name.ends_with(suffix.as_str()),
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

/// Compiled ignore rules: the built-in names plus configured patterns.
///
/// # Examples
///
/// ```
/// use homefiles::config::ignore::IgnoreRules;
///
/// let rules = IgnoreRules::new(&["*.swp".to_string(), ".DS_Store".to_string()]);
/// assert!(rules.is_ignored(".git"));
/// assert!(rules.is_ignored(".vimrc.swp"));
/// assert!(rules.is_ignored(".DS_Store"));
/// assert!(!rules.is_ignored(".vimrc"));
/// ```
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl IgnoreRules {
    /// Build rules from configured patterns. Empty patterns are dropped.
    #[must_use]
    pub fn new(configured: &[String]) -> Self {
        let patterns = BUILTIN_IGNORES
            .iter()
            .map(|name| Pattern::Exact((*name).to_string()))
            .chain(
                configured
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .map(Pattern::parse),
            )
            .collect();
        Self { patterns }
    }

    /// Whether a single path component should be skipped.
    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// [`is_ignored`](Self::is_ignored) for a raw file name; names that are
    /// not valid UTF-8 are never ignored.
    #[must_use]
    pub fn is_ignored_os(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| self.is_ignored(n))
    }
}
