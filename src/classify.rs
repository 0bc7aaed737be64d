//! Tracking backend classification.
//!
//! Each discovered file is assigned exactly one backend: files inside a git
//! working tree win first, then files the dotfile manager lists as tracked,
//! and everything else stays unassigned for the snapshot analyzer to
//! resolve. Repository root lookups walk ancestors up to (never above) the
//! home directory and are memoized per starting directory, since the rayon
//! workers classify many files sharing the same parents.

use crate::record::DiscoveredFile;
use crate::report::RunWarning;
use crate::utils::proc;
use crate::{GIT_MARKER, RecapContext};
use dashmap::DashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Backend selected for one file. The classifier picks the variant; the
/// analyzers never reclassify between the tracked kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Inside the git working tree rooted at `repo_root`
    Git {
        /// Root directory containing the repository marker
        repo_root: PathBuf,
    },
    /// Listed by the dotfile manager
    Dotfile,
    /// No tracked backend; resolved against the snapshot later
    Unassigned,
}

/// Tracked-file listing of the dotfile manager, loaded once per run.
#[derive(Debug, Default)]
pub struct DotfileIndex {
    files: HashSet<PathBuf>,
}

impl DotfileIndex {
    /// Loads the tracked-file list from the configured manager.
    ///
    /// A missing or failing manager degrades to an empty index; membership
    /// tests then simply never match.
    #[must_use]
    pub fn load(ctx: &RecapContext, warnings: &mut Vec<RunWarning>) -> Self {
        let program = &ctx.config.dotfiles.program;
        if proc::find_tool(program).is_none() {
            warn!(program = %program, "Dotfile manager not found");
            warnings.push(RunWarning::ToolMissing {
                tool: program.clone(),
                capability: "dotfile classification".to_string(),
            });
            return Self::default();
        }

        match proc::run_with_timeout(
            program,
            &["ls-files"],
            Some(&ctx.home),
            ctx.command_timeout(),
        ) {
            Ok(output) if output.success() => {
                let index = Self::from_lines(&ctx.home, &output.stdout);
                debug!(tracked = index.files.len(), "Loaded dotfile index");
                index
            }
            Ok(output) => {
                warnings.push(RunWarning::BackendError {
                    path: program.clone(),
                    message: output.stderr.trim().to_string(),
                });
                Self::default()
            }
            Err(e) => {
                warnings.push(RunWarning::BackendError {
                    path: program.clone(),
                    message: e.to_string(),
                });
                Self::default()
            }
        }
    }

    /// Builds an index from `ls-files` output (paths relative to `home`).
    #[must_use]
    pub fn from_lines(home: &Path, listing: &str) -> Self {
        let files = listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| home.join(l))
            .collect();
        Self { files }
    }

    /// True when the manager tracks this absolute path.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the manager tracks nothing (or was unavailable).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Assigns a backend to each discovered file.
#[derive(Debug)]
pub struct Classifier {
    home: PathBuf,
    dotfiles: DotfileIndex,
    // Keyed by the file's parent directory; read-mostly across workers
    repo_roots: DashMap<PathBuf, Option<PathBuf>>,
}

impl Classifier {
    /// Creates a classifier, loading the dotfile index once.
    #[must_use]
    pub fn new(ctx: &RecapContext, warnings: &mut Vec<RunWarning>) -> Self {
        Self {
            home: ctx.home.clone(),
            dotfiles: DotfileIndex::load(ctx, warnings),
            repo_roots: DashMap::new(),
        }
    }

    /// Classifier over an explicit index, for tests.
    #[must_use]
    pub fn with_index(home: PathBuf, dotfiles: DotfileIndex) -> Self {
        Self {
            home,
            dotfiles,
            repo_roots: DashMap::new(),
        }
    }

    /// Picks the backend for one file. Git takes precedence over Dotfile.
    #[must_use]
    pub fn classify(&self, file: &DiscoveredFile) -> Backend {
        if let Some(dir) = file.absolute_path.parent()
            && let Some(repo_root) = self.repo_root(dir)
        {
            return Backend::Git { repo_root };
        }

        if self.dotfiles.contains(&file.absolute_path) {
            return Backend::Dotfile;
        }

        Backend::Unassigned
    }

    /// Walks from `dir` upward looking for the repository marker, stopping
    /// at the home directory (inclusive). Memoized per starting directory.
    fn repo_root(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.repo_roots.get(dir) {
            return cached.clone();
        }

        let mut current = dir;
        let found = loop {
            if current.join(GIT_MARKER).is_dir() {
                break Some(current.to_path_buf());
            }
            if current == self.home {
                break None;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break None,
            }
        };

        self.repo_roots.insert(dir.to_path_buf(), found.clone());
        found
    }
}
