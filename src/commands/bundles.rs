//! Command: list bundles.
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::bundles;
use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::logging::Logger;

/// One line per available bundle: marker, name, entry count.
///
/// Active bundles are marked with `*` and listed with their precedence.
///
/// # Errors
///
/// Returns an error if a bundle directory cannot be read.
pub fn render(config: &Config) -> Result<String> {
    let mut out = String::new();
    for name in &config.available {
        let entries = bundles::collect(&config.repo, name, &config.ignore)?.len();
        let position = config.bundles.iter().position(|b| b == name);
        let marker = if position.is_some() { "*" } else { " " };
        let _ = write!(out, "{marker} {name:<20} {entries:>4} entries");
        if let Some(i) = position {
            let _ = write!(out, " (priority {})", i + 1);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Run the bundles command.
///
/// # Errors
///
/// Returns an error if setup fails or a bundle cannot be read.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    if setup.config.available.is_empty() {
        log.warn("repository has no bundles");
        return Ok(());
    }
    let text = render(&setup.config)?;
    std::io::stdout()
        .lock()
        .write_all(text.as_bytes())
        .context("writing to stdout")
}
