//! Dotfile manager analyzer.
//!
//! Mirrors the git analyzer against the configured git-compatible dotfile
//! manager, whose working tree is the home directory. Same degradation
//! contract: a failing query marks only the affected file.

use crate::RecapContext;
use crate::record::{DiffStat, DiscoveredFile, FileStatus};
use crate::report::RunWarning;
use tracing::debug;

/// Computes status and diff statistics for one dotfile-managed file.
#[must_use]
pub fn analyze(
    ctx: &RecapContext,
    file: &DiscoveredFile,
) -> (FileStatus, DiffStat, Option<RunWarning>) {
    let rel = file
        .absolute_path
        .strip_prefix(&ctx.home)
        .unwrap_or(&file.absolute_path)
        .display()
        .to_string();

    let program = &ctx.config.dotfiles.program;
    match super::run_porcelain(program, &ctx.home, &rel, ctx.command_timeout()) {
        Ok((status, diff)) => {
            debug!(path = %rel, code = %status.raw_code, "dotfile status");
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
