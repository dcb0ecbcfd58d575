// Shared helpers for integration tests.
//
// Provides a temporary home directory with a repository inside it and a
// fluent builder, so each integration test can set up an isolated
// environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use homefiles::config::Config;
use homefiles::exec::{ExecResult, Executor};
use homefiles::logging::{Log, Logger};
use homefiles::platform::{Os, Platform};
use homefiles::tasks::Context;

/// Hostname every test platform reports.
pub const TEST_HOST: &str = "testhost";

/// Linux platform on host [`TEST_HOST`].
pub fn test_platform() -> Platform {
    Platform::new(Os::Linux, Some(TEST_HOST))
}

/// Executor that records commands instead of running them.
#[derive(Debug, Default)]
pub struct MockExecutor {
    calls: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl MockExecutor {
    /// Executor whose commands all succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor whose commands fail when the joined command line contains
    /// `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(needle.to_string()),
        }
    }

    /// Commands issued so far as `"program arg1 arg2"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, program: &str, args: &[&str]) -> ExecResult {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let fail = self.fail_on.as_deref().is_some_and(|n| line.contains(n));
        self.calls.lock().expect("calls lock").push(line);
        ExecResult {
            stdout: String::new(),
            stderr: if fail { "rejected".to_string() } else { String::new() },
            success: !fail,
            code: Some(i32::from(fail)),
        }
    }
}

impl Executor for MockExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let result = self.record(program, args);
        if !result.success {
            anyhow::bail!("{program} failed (exit 1): {}", result.stderr);
        }
        Ok(result)
    }

    fn run_in(&self, _: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.run(program, args)
    }

    fn which(&self, _: &str) -> bool {
        true
    }
}

/// An isolated home directory with a repository at `<home>/.homefiles`.
///
/// Everything is deleted when the underlying [`tempfile::TempDir`] drops.
pub struct TestHome {
    _tmp: tempfile::TempDir,
    /// Home directory.
    pub home: PathBuf,
    /// Repository root.
    pub repo: PathBuf,
}

impl TestHome {
    /// Path `rel` inside the home directory.
    pub fn home_path(&self, rel: &str) -> PathBuf {
        self.home.join(rel)
    }

    /// Path `rel` inside `bundle`.
    pub fn bundle_path(&self, bundle: &str, rel: &str) -> PathBuf {
        self.repo.join(bundle).join(rel)
    }

    /// Load settings and resolve bundles as the CLI would.
    pub fn config(&self, requested: &[&str]) -> Config {
        let requested: Vec<String> = requested.iter().map(ToString::to_string).collect();
        Config::load(&self.repo, &requested, &test_platform()).expect("load config")
    }

    /// Build a task context over this home with the given executor.
    pub fn context_with(
        &self,
        requested: &[&str],
        dry_run: bool,
        executor: Arc<dyn Executor>,
    ) -> (Context, Arc<Logger>) {
        let log = Arc::new(Logger::new("test"));
        let ctx = Context::new(
            Arc::new(self.config(requested)),
            Arc::new(test_platform()),
            Arc::clone(&log) as Arc<dyn Log>,
            dry_run,
            self.home.clone(),
            executor,
            false,
        );
        (ctx, log)
    }

    /// Build a task context with a [`MockExecutor`].
    pub fn context(&self, requested: &[&str], dry_run: bool) -> (Context, Arc<Logger>) {
        self.context_with(requested, dry_run, Arc::new(MockExecutor::new()))
    }

    /// Whether `rel` in the home directory is a symlink to `bundle/rel`.
    pub fn is_linked(&self, rel: &str, bundle: &str) -> bool {
        std::fs::read_link(self.home_path(rel))
            .is_ok_and(|target| target == self.bundle_path(bundle, rel))
    }
}

/// Fluent builder for [`TestHome`].
pub struct TestHomeBuilder {
    home: TestHome,
}

impl TestHomeBuilder {
    /// Begin with an empty home and an empty repository.
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = dunce::canonicalize(tmp.path()).expect("canonicalize temp dir");
        let home = root.join("home");
        let repo = home.join(".homefiles");
        std::fs::create_dir_all(&repo).expect("create repo dir");
        Self {
            home: TestHome {
                _tmp: tmp,
                home,
                repo,
            },
        }
    }

    /// Write `content` to `<bundle>/<rel>` in the repository.
    pub fn with_file(self, bundle: &str, rel: &str, content: &str) -> Self {
        let path = self.home.bundle_path(bundle, rel);
        write_file(&path, content);
        self
    }

    /// Create `<bundle>/<rel>` as a tracked directory holding `files`.
    pub fn with_tracked_dir(self, bundle: &str, rel: &str, files: &[&str]) -> Self {
        let dir = self.home.bundle_path(bundle, rel);
        write_file(&dir.join(".trackeddir"), "");
        for file in files {
            write_file(&dir.join(file), file);
        }
        self
    }

    /// Write `content` to `rel` in the home directory.
    pub fn with_home_file(self, rel: &str, content: &str) -> Self {
        write_file(&self.home.home_path(rel), content);
        self
    }

    /// Write `homefiles.toml`.
    pub fn with_settings(self, toml: &str) -> Self {
        write_file(&self.home.repo.join("homefiles.toml"), toml);
        self
    }

    /// Initialise a git repository, optionally with an `origin` remote.
    pub fn with_git(self, origin: Option<&str>) -> Self {
        let repo = homefiles::git::Repository::init(&self.home.repo).expect("git init");
        if let Some(url) = origin {
            repo.set_remote("origin", url).expect("set origin");
        }
        self
    }

    /// Finish building.
    pub fn build(self) -> TestHome {
        self.home
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}
