fn main() {
    // A release build may stamp its own version (e.g. `0.1.2+git.abc123`).
    // Without it the binary reports the package version from Cargo.toml.
    if let Ok(version) = std::env::var("HOMEFILES_VERSION") {
        let version = version.trim();
        if !version.is_empty() {
            println!("cargo:rustc-env=HOMEFILES_VERSION={version}");
        }
    }

    println!("cargo:rerun-if-env-changed=HOMEFILES_VERSION");
}
