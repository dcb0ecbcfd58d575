//! Command: print shell completions.
use std::io::Write;

use clap::CommandFactory;

use crate::cli::{Cli, CompletionsOpts};

/// Write completions for `opts.shell` to `out`.
pub fn generate(opts: &CompletionsOpts, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    clap_complete::generate(opts.shell, &mut cmd, "homefiles", out);
}

/// Run the completions command.
pub fn run(opts: &CompletionsOpts) {
    generate(opts, &mut std::io::stdout());
}
