use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "homefiles",
    about = "Keep home directory files in git and symlink them into place",
    version = crate::commands::version::version()
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Repository path (default: ~/.homefiles)
    #[arg(long, global = true, env = "HOMEFILES_REPO")]
    pub repo: Option<PathBuf>,

    /// Home directory to link into (default: $HOME)
    #[arg(long, global = true, env = "HOMEFILES_HOME")]
    pub home: Option<PathBuf>,

    /// Use only these bundles instead of the automatic selection
    #[arg(short, long = "bundle", global = true, value_delimiter = ',')]
    pub bundles: Vec<String>,

    /// Disable parallel linking (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new homefiles repository
    Init(InitOpts),
    /// Clone an existing homefiles repository and link it
    Clone(CloneOpts),
    /// Move a file or directory into a bundle and link it back
    Track(TrackOpts),
    /// Move a tracked item back out of the repository
    Untrack(UntrackOpts),
    /// Symlink the active bundles into the home directory
    Link(LinkOpts),
    /// Remove the links of the active bundles
    Unlink(UnlinkOpts),
    /// Show link and repository status
    Status(StatusOpts),
    /// Commit, pull, push, and relink
    Sync(SyncOpts),
    /// List bundles and which are active
    Bundles,
    /// Print shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Subcommand name, used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Clone(_) => "clone",
            Self::Track(_) => "track",
            Self::Untrack(_) => "untrack",
            Self::Link(_) => "link",
            Self::Unlink(_) => "unlink",
            Self::Status(_) => "status",
            Self::Sync(_) => "sync",
            Self::Bundles => "bundles",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// Options for the `init` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InitOpts {
    /// URL of the `origin` remote
    #[arg(long)]
    pub origin: Option<String>,
}

/// Options for the `clone` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CloneOpts {
    /// Repository URL, local path, or GitHub `user/repo` shorthand
    pub source: String,

    /// Do not link after cloning
    #[arg(long)]
    pub no_link: bool,
}

/// Options for the `track` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct TrackOpts {
    /// File or directory inside the home directory
    pub path: PathBuf,

    /// Bundle to track into
    #[arg(long, default_value = "default")]
    pub bundle_name: String,
}

/// Options for the `untrack` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UntrackOpts {
    /// Link inside the home directory
    pub path: PathBuf,
}

/// Options for the `link` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct LinkOpts {
    /// Back up and replace real files in the way
    #[arg(short, long)]
    pub force: bool,
}

/// Options for the `unlink` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UnlinkOpts {
    /// Leave a copy of each file in place of its link
    #[arg(long)]
    pub restore: bool,
}

/// Options for the `status` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct StatusOpts {
    /// Print a JSON document instead of text
    #[arg(long)]
    pub json: bool,
}

/// Options for the `sync` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SyncOpts {
    /// Commit message (default: from settings)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Skip pulling from the remote
    #[arg(long)]
    pub no_pull: bool,

    /// Skip pushing to the remote
    #[arg(long)]
    pub no_push: bool,

    /// Skip relinking after the update
    #[arg(long)]
    pub no_link: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_link_force() {
        let cli = Cli::parse_from(["homefiles", "link", "--force"]);
        assert!(matches!(cli.command, Command::Link(LinkOpts { force: true })));
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["homefiles", "-d", "link"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["homefiles", "status", "--dry-run", "-v"]);
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn bundles_are_repeatable_and_comma_delimited() {
        let cli = Cli::parse_from(["homefiles", "-b", "default,work", "--bundle", "laptop", "link"]);
        assert_eq!(cli.global.bundles, vec!["default", "work", "laptop"]);
    }

    #[test]
    fn parse_repo_override() {
        let cli = Cli::parse_from(["homefiles", "--repo", "/tmp/dots", "status"]);
        assert_eq!(cli.global.repo, Some(PathBuf::from("/tmp/dots")));
    }

    #[test]
    fn track_defaults_to_default_bundle() {
        let cli = Cli::parse_from(["homefiles", "track", "~/.bashrc"]);
        let Command::Track(opts) = cli.command else {
            panic!("expected track");
        };
        assert_eq!(opts.bundle_name, "default");
        assert_eq!(opts.path, PathBuf::from("~/.bashrc"));
    }

    #[test]
    fn parse_sync_flags() {
        let cli = Cli::parse_from(["homefiles", "sync", "-m", "msg", "--no-push", "--no-link"]);
        let Command::Sync(opts) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(opts.message.as_deref(), Some("msg"));
        assert!(!opts.no_pull);
        assert!(opts.no_push);
        assert!(opts.no_link);
    }

    #[test]
    fn parse_clone_no_link() {
        let cli = Cli::parse_from(["homefiles", "clone", "alice/dots", "--no-link"]);
        let Command::Clone(opts) = cli.command else {
            panic!("expected clone");
        };
        assert_eq!(opts.source, "alice/dots");
        assert!(opts.no_link);
    }

    #[test]
    fn parse_completions_shell() {
        let cli = Cli::parse_from(["homefiles", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Command::Completions(CompletionsOpts {
                shell: clap_complete::Shell::Bash
            })
        ));
    }

    #[test]
    fn parallel_is_enabled_by_default() {
        let cli = Cli::parse_from(["homefiles", "link"]);
        assert!(cli.global.parallel, "parallel should be true by default");
    }

    #[test]
    fn no_parallel_disables_parallel() {
        let cli = Cli::parse_from(["homefiles", "--no-parallel", "link"]);
        assert!(!cli.global.parallel);
    }

    #[test]
    fn command_names_match_subcommands() {
        let cli = Cli::parse_from(["homefiles", "bundles"]);
        assert_eq!(cli.command.name(), "bundles");
        let cmd = Cli::command();
        for sub in cmd.get_subcommands() {
            assert!(
                ["init", "clone", "track", "untrack", "link", "unlink", "status", "sync",
                 "bundles", "completions", "version", "help"]
                    .contains(&sub.get_name()),
                "{}",
                sub.get_name()
            );
        }
    }
}
