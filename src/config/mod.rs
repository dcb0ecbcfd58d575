//! Repository settings and active-bundle resolution.
pub mod ignore;
pub mod toml_loader;

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bundles;
use crate::error::{ConfigError, GitError};
use crate::platform::Platform;
use ignore::IgnoreRules;

/// Name of the settings file at the repository root.
pub const SETTINGS_FILE: &str = "homefiles.toml";

/// Settings file written by `homefiles init`.
pub const SETTINGS_TEMPLATE: &str = r#"# homefiles settings

[bundles]
# Bundles that are always active, in order. Later bundles override earlier
# ones. The os-<os> and host-<hostname> bundles are appended automatically
# when they exist.
default = ["default"]

[ignore]
# Names skipped while linking. "*suffix" and "prefix*" are supported.
patterns = [".DS_Store", "*.swp"]

[sync]
remote = "origin"
# {host} is replaced with the hostname.
message = "Sync from {host}"
"#;

/// Contents of `homefiles.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `[bundles]`
    pub bundles: BundleSettings,
    /// `[ignore]`
    pub ignore: IgnoreSettings,
    /// `[sync]`
    pub sync: SyncSettings,
}

/// `[bundles]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BundleSettings {
    /// Always-active bundles, in order.
    pub default: Vec<String>,
}

impl Default for BundleSettings {
    fn default() -> Self {
        Self {
            default: vec!["default".to_string()],
        }
    }
}

/// `[ignore]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IgnoreSettings {
    /// Extra names to skip, matched per path component.
    pub patterns: Vec<String>,
}

/// `[sync]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Remote used by `sync` for pull and push.
    pub remote: String,
    /// Default commit message; `{host}` is substituted.
    pub message: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            message: "Sync from {host}".to_string(),
        }
    }
}

impl SyncSettings {
    /// Commit message with `{host}` replaced by `host`.
    #[must_use]
    pub fn render_message(&self, host: &str) -> String {
        self.message.replace("{host}", host)
    }
}

impl Settings {
    /// Load `homefiles.toml` from `repo`, falling back to defaults when the
    /// file is absent.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(repo: &Path) -> Result<Self, ConfigError> {
        toml_loader::load_config(&repo.join(SETTINGS_FILE))
    }
}

/// Everything a command needs to know about the repository.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository root.
    pub repo: PathBuf,
    /// Parsed settings.
    pub settings: Settings,
    /// All bundles present in the repository, sorted.
    pub available: Vec<String>,
    /// Active bundles in precedence order (later wins).
    pub bundles: Vec<String>,
    /// Compiled ignore rules.
    pub ignore: IgnoreRules,
}

impl Config {
    /// Load settings from `repo` and resolve the active bundles.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo` is not a directory, the settings file is
    /// invalid, or an explicitly requested bundle does not exist.
    pub fn load(repo: &Path, requested: &[String], platform: &Platform) -> Result<Self> {
        if !repo.is_dir() {
            return Err(GitError::NotARepository(repo.display().to_string()).into());
        }
        let settings = Settings::load(repo)?;
        let available = bundles::discover(repo)
            .with_context(|| format!("listing bundles in {}", repo.display()))?;
        let active = resolve_bundles(&available, &settings, requested, platform)?;
        let ignore = IgnoreRules::new(&settings.ignore.patterns);
        Ok(Self {
            repo: repo.to_path_buf(),
            settings,
            available,
            bundles: active,
            ignore,
        })
    }

    /// Directory of bundle `name`.
    #[must_use]
    pub fn bundle_dir(&self, name: &str) -> PathBuf {
        self.repo.join(name)
    }

    /// Whether the automatic selection on `platform` names bundle `name`,
    /// whether or not the bundle exists yet.
    #[must_use]
    pub fn auto_selects(&self, name: &str, platform: &Platform) -> bool {
        automatic_bundles(&self.settings, platform).any(|b| b == name)
    }
}

/// Default bundles from settings, then `os-<os>`, then `host-<hostname>`.
fn automatic_bundles(settings: &Settings, platform: &Platform) -> impl Iterator<Item = String> {
    settings
        .bundles
        .default
        .clone()
        .into_iter()
        .chain(std::iter::once(platform.os_bundle()))
        .chain(platform.host_bundle())
}

/// Resolve the ordered list of active bundles.
///
/// Explicitly requested bundles are used as given and must all exist.
/// Otherwise the defaults from settings are followed by `os-<os>` and
/// `host-<hostname>`, keeping only bundles that exist, without duplicates.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBundleName`] or [`ConfigError::UnknownBundle`]
/// for a bad explicit request.
pub fn resolve_bundles(
    available: &[String],
    settings: &Settings,
    requested: &[String],
    platform: &Platform,
) -> Result<Vec<String>, ConfigError> {
    let mut active: Vec<String> = Vec::new();

    if requested.is_empty() {
        for name in automatic_bundles(settings, platform) {
            if available.contains(&name) && !active.contains(&name) {
                active.push(name);
            }
        }
        return Ok(active);
    }

    for name in requested {
        validate_bundle_name(name)?;
        if !available.contains(name) {
            return Err(ConfigError::UnknownBundle(name.clone()));
        }
        if !active.contains(name) {
            active.push(name.clone());
        }
    }
    Ok(active)
}

/// Check that `name` is usable as a bundle directory name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBundleName`] for empty names, hidden names,
/// and anything containing a path separator.
pub fn validate_bundle_name(name: &str) -> Result<(), ConfigError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || Path::new(name).components().count() != 1;
    if invalid {
        return Err(ConfigError::InvalidBundleName(name.to_string()));
    }
    Ok(())
}
