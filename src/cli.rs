//! Command-line interface definitions for recap.
//!
//! This module contains all CLI argument parsing structures using clap's
//! derive macros. Running `recap` with no subcommand is equivalent to
//! `recap analyze`.
//!
//! Note: Field-level documentation is provided via clap attributes, so we
//! allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for recap.
#[derive(Parser)]
#[command(
    name = "recap",
    version = crate::VERSION,
    about = "Local file activity analyzer with backend-aware diffs",
    long_about = "Reports recently modified files grouped by hour, with change \
                  statistics from git, the dotfile manager, or the latest backup snapshot",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Subcommand to execute; bare invocation runs an analysis
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub analyze: AnalyzeArgs,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Arguments shared by the bare invocation and the analyze subcommand.
#[derive(Args, Default)]
pub struct AnalyzeArgs {
    /// Directory to analyze (defaults to the home directory)
    #[arg(value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Only consider files modified within this window (e.g. 90m, 24h, 2days)
    #[arg(short, long, env = "RECAP_SINCE")]
    pub since: Option<String>,

    /// One line per file instead of the bucketed table
    #[arg(long)]
    pub short: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze recent file activity
    Analyze(AnalyzeArgs),

    /// Get and set configuration options
    Config {
        /// Configuration key (section.key)
        key: Option<String>,

        /// Value to set
        value: Option<String>,

        /// Remove the key, restoring its default
        #[arg(long)]
        unset: bool,

        /// List all configuration values
        #[arg(short, long)]
        list: bool,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}
