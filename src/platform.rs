//! Platform detection used to select automatic bundles.
use std::fmt;

/// Detected operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux and other Unix-like systems without a dedicated variant.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
    /// Anything else.
    Other,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// Lower-cased short hostname, if it could be determined.
    pub hostname: Option<String>,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            hostname: Self::detect_hostname(),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub fn new(os: Os, hostname: Option<&str>) -> Self {
        Self {
            os,
            hostname: hostname.and_then(normalize_hostname),
        }
    }

    /// Name of the bundle selected automatically for this OS (e.g. `os-linux`).
    #[must_use]
    pub fn os_bundle(&self) -> String {
        format!("os-{}", self.os)
    }

    /// Name of the bundle selected automatically for this host (e.g. `host-laptop`).
    #[must_use]
    pub fn host_bundle(&self) -> Option<String> {
        self.hostname.as_ref().map(|h| format!("host-{h}"))
    }

    /// Hostname for commit messages, `"unknown"` when undetectable.
    #[must_use]
    pub fn host_label(&self) -> &str {
        self.hostname.as_deref().unwrap_or("unknown")
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(unix) {
            // Other Unix-like systems share the Linux bundle
            Os::Linux
        } else {
            Os::Other
        }
    }

    fn detect_hostname() -> Option<String> {
        std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .ok()
            .and_then(|h| normalize_hostname(&h))
            .or_else(|| {
                std::fs::read_to_string("/etc/hostname")
                    .ok()
                    .and_then(|h| normalize_hostname(&h))
            })
    }
}

/// Trim, drop the domain part, and lower-case a hostname.
fn normalize_hostname(raw: &str) -> Option<String> {
    let short = raw.trim().split('.').next().unwrap_or_default();
    if short.is_empty() {
        None
    } else {
        Some(short.to_lowercase())
    }
}
