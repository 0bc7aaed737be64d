//! Git working tree analyzer.
//!
//! Queries `git status --porcelain` for the file's path relative to its
//! repository root (resolved and cached by the classifier), then counts a
//! `git diff HEAD` for anything the repository tracks. Tool failures
//! degrade the single file to an error status; the batch continues.

use crate::RecapContext;
use crate::record::{DiffStat, DiscoveredFile, FileStatus};
use crate::report::RunWarning;
use std::path::Path;
use tracing::debug;

/// Computes status and diff statistics for one git-tracked file.
#[must_use]
pub fn analyze(
    ctx: &RecapContext,
    repo_root: &Path,
    file: &DiscoveredFile,
) -> (FileStatus, DiffStat, Option<RunWarning>) {
    let rel = file
        .absolute_path
        .strip_prefix(repo_root)
        .unwrap_or(&file.absolute_path)
        .display()
        .to_string();

    match super::run_porcelain("git", repo_root, &rel, ctx.command_timeout()) {
        Ok((status, diff)) => {
            debug!(path = %rel, code = %status.raw_code, "git status");
            (status, diff, None)
        }
        Err(e) => (
            FileStatus::error(),
            DiffStat::default(),
            Some(RunWarning::BackendError {
                path: file.relative_path.clone(),
                message: e.to_string(),
            }),
        ),
    }
}
