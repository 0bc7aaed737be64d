#![warn(missing_docs)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters and size calculations cannot overflow
#![allow(clippy::float_arithmetic)] // Required for file size formatting

//! # Recap - Local File Activity Analyzer
//!
//! Recap inspects a directory tree for recently modified files and reports
//! what changed, grouped by the hour of modification. Every file is assigned
//! exactly one tracking backend and the change statistics come from that
//! backend's own tooling:
//!
//! - **Git**: files inside a git working tree are queried with
//!   `git status` / `git diff`
//! - **Dotfile**: files managed by a git-compatible dotfile manager
//!   (yadm by default) are queried through its status/diff subcommands
//! - **Snapshot**: everything else is compared against the most recent
//!   backup snapshot, mounted on demand through the backup tool's FUSE mount
//! - **New / Untracked**: files absent from the snapshot, or files with no
//!   usable baseline at all
//!
//! The engine is strictly read-only: it never mutates repository state,
//! performs no network I/O, and produces a single in-memory [`report::Report`]
//! that the console renderer consumes.
//!
//! ## Architecture
//!
//! - [`discover`]: external fast-file-search invocation and stat enrichment
//! - [`classify`]: tracking backend selection (git marker walk, dotfile index)
//! - [`analyze`]: per-backend status/diff analyzers and the parallel pipeline
//! - [`mount`]: snapshot mount lifecycle (spawn, readiness poll, unmount)
//! - [`report`]: time-bucketed aggregation and the run-warning taxonomy
//! - [`config`]: TOML configuration
//! - [`output`]: verbosity control and report rendering

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing and management.
pub mod config;

/// Core data model: file records, tracking kinds, status and diff statistics.
pub mod record;

/// Discovery of recently modified files via an external search tool.
pub mod discover;

/// Tracking backend classification.
pub mod classify;

/// Per-backend status/diff analyzers and the analysis pipeline.
pub mod analyze;

/// Snapshot mount session lifecycle.
pub mod mount;

/// Unified diff text statistics.
pub mod diff;

/// Report aggregation and run warnings.
pub mod report;

/// Output formatting and verbosity control.
pub mod output;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the recap binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/recap/config.toml";

/// Marker directory that identifies a git working tree root.
pub const GIT_MARKER: &str = ".git";

/// Central context for a single analysis run.
///
/// Holds the home directory boundary, the configuration path, and the loaded
/// configuration. All components treat it as immutable for the duration of a
/// run; the only process-wide mutable resources (mount session, backend
/// caches) live in the components themselves.
///
/// # Examples
///
/// ```no_run
/// use recap::RecapContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Create context with default paths
/// let ctx = RecapContext::new()?;
///
/// // Create context with explicit paths (for testing)
/// let ctx = RecapContext::new_explicit(
///     "/tmp/test_home".into(),
///     "/tmp/test_config.toml".into(),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RecapContext {
    /// Home directory, the upper boundary for repository discovery.
    pub home: PathBuf,

    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl RecapContext {
    /// Creates a new `RecapContext` by loading the configuration from the
    /// default path.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the
    /// configuration file cannot be read or created.
    pub fn new() -> Result<Self> {
        // Environment overrides take precedence (used heavily by tests)
        let home = if let Ok(path) = std::env::var("RECAP_HOME") {
            PathBuf::from(path)
        } else {
            dirs::home_dir().context("Could not find home directory")?
        };

        let config_path = if let Ok(path) = std::env::var("RECAP_CONFIG_PATH") {
            PathBuf::from(path)
        } else {
            home.join(DEFAULT_CONFIG_PATH)
        };

        let config = config::Config::load(&config_path)?;

        // Configure thread pool based on config
        if let Err(e) = utils::thread_pool::configure_from_config(&config) {
            tracing::debug!("Thread pool already configured: {e}");
        }

        Ok(Self {
            home,
            config_path,
            config,
        })
    }

    /// Creates a new `RecapContext` with explicit paths for testing.
    /// This avoids the need for environment variable manipulation.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(home: PathBuf, config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            config::Config::load(&config_path)?
        } else {
            let config = config::Config::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            config.save(&config_path)?;
            config
        };

        Ok(Self {
            home,
            config_path,
            config,
        })
    }

    /// Per-invocation timeout applied to every external tool call.
    #[must_use]
    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config.performance.command_timeout)
    }
}
