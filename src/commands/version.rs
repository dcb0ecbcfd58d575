//! Command: print version information.
use std::io::Write as _;

/// Version string: the build-time `HOMEFILES_VERSION` override, else the
/// package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("HOMEFILES_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// License declared in the package manifest.
#[must_use]
pub const fn license() -> &'static str {
    env!("CARGO_PKG_LICENSE")
}

/// Version line printed by `homefiles version`.
#[must_use]
pub fn line() -> String {
    format!("homefiles {} ({})", version(), license())
}

/// Print the version line to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> std::io::Result<()> {
    writeln!(std::io::stdout().lock(), "{}", line())
}
