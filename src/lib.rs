//! Home directory files in git.
//!
//! `homefiles` keeps dotfiles in a git repository (by default
//! `~/.homefiles`) organised into bundles, and symlinks the active bundles
//! into the home directory. Bundles named `os-<os>` and `host-<hostname>`
//! are selected automatically on matching machines.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: settings file, bundle selection, ignore rules
//! - **[`bundles`]**: bundle discovery and the merged link plan
//! - **[`resources`]**: idempotent `check + apply` primitives (symlinks)
//! - **[`git`]**: repository backend
//! - **[`tracking`]**: moving files into bundles and back
//! - **[`tasks`]**: named units of work wired to resources
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod bundles;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod git;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod tasks;
pub mod tracking;
