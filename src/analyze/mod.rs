//! Backend analyzers and the analysis pipeline.
//!
//! The classifier picks a [`Backend`] variant per file; each variant's
//! analyzer produces the same `(tracking, status, diff)` shape from its own
//! external tooling. [`analyze_directory`] wires the whole engine together:
//! discover, classify, mount on demand, analyze in parallel, aggregate.
//!
//! Per-file failures degrade that file to an error status and never abort
//! the batch; run-level failure is reserved for discovery itself.

/// Git working tree analyzer
pub mod git;

/// Dotfile manager analyzer
pub mod dotfile;

/// Snapshot baseline analyzer
pub mod snapshot;

use crate::classify::{Backend, Classifier};
use crate::mount::MountSession;
use crate::record::{DiffStat, DiscoveredFile, FileRecord, FileState, FileStatus, TrackingKind};
use crate::report::{Report, RunWarning, build_report};
use crate::utils::{proc, thread_pool};
use crate::{RecapContext, discover};
use anyhow::Result;
use rayon::prelude::*;
use snapshot::SnapshotAnalyzer;
use std::path::Path;
use std::time::Duration;
use tracing::{Level, debug, span};

/// Analyzes `root` for files modified within `window` and builds the report.
///
/// This is the engine's single entry point: callers own argument parsing
/// and presentation, this function owns everything in between.
///
/// # Errors
///
/// Returns an error only when discovery itself fails outright; every other
/// failure degrades to a warning on the report.
pub fn analyze_directory(ctx: &RecapContext, root: &Path, window: Duration) -> Result<Report> {
    let span = span!(Level::DEBUG, "analyze", root = %root.display());
    let _guard = span.enter();

    let mut warnings = Vec::new();
    let files = discover::discover(ctx, root, window, &mut warnings)?;
    if files.is_empty() {
        return Ok(build_report(Vec::new(), warnings));
    }

    let classifier = Classifier::new(ctx, &mut warnings);
    let backends: Vec<Backend> = thread_pool::run_in_pool(|| {
        files.par_iter().map(|f| classifier.classify(f)).collect()
    });

    // The mount is the only stateful resource; its transitions happen here,
    // before the parallel phase, under a single owner.
    let mut session = MountSession::new(ctx);
    if backends.contains(&Backend::Unassigned) {
        session.ensure_ready(&mut warnings);
    }
    let snapshot = SnapshotAnalyzer::new(ctx, &session, &mut warnings);

    let results: Vec<(FileRecord, Option<RunWarning>)> = thread_pool::run_in_pool(|| {
        files
            .into_par_iter()
            .zip(backends)
            .map(|(file, backend)| analyze_one(ctx, &snapshot, file, backend))
            .collect()
    });

    let mut records = Vec::with_capacity(results.len());
    for (record, warning) in results {
        if let Some(w) = warning {
            warnings.push(w);
        }
        records.push(record);
    }

    if let Some(w) = session.finish() {
        warnings.push(w);
    }

    debug!(files = records.len(), warnings = warnings.len(), "Analysis complete");
    Ok(build_report(records, warnings))
}

/// Runs the backend analyzer matching the classification.
fn analyze_one(
    ctx: &RecapContext,
    snapshot: &SnapshotAnalyzer,
    file: DiscoveredFile,
    backend: Backend,
) -> (FileRecord, Option<RunWarning>) {
    match backend {
        Backend::Git { repo_root } => {
            let (status, diff, warning) = git::analyze(ctx, &repo_root, &file);
            (file.into_record(TrackingKind::Git, status, diff), warning)
        }
        Backend::Dotfile => {
            let (status, diff, warning) = dotfile::analyze(ctx, &file);
            (file.into_record(TrackingKind::Dotfile, status, diff), warning)
        }
        Backend::Unassigned => {
            let (tracking, status, diff, warning) = snapshot.analyze(&file);
            (file.into_record(tracking, status, diff), warning)
        }
    }
}

/// Shared status+diff query for the git-compatible backends.
///
/// Runs `<program> status --porcelain -- <rel>` in `worktree`; an empty
/// listing means clean. Only files with a dirty worktree side are diffed
/// against `HEAD` (a clean worktree must report a zero diff, and untracked
/// files have no head to diff against); the unified output is counted.
pub(crate) fn run_porcelain(
    program: &str,
    worktree: &Path,
    rel_path: &str,
    timeout: Duration,
) -> Result<(FileStatus, DiffStat)> {
    let output = proc::run_with_timeout(
        program,
        &["status", "--porcelain", "--", rel_path],
        Some(worktree),
        timeout,
    )?;
    if !output.success() {
        anyhow::bail!("status exited with {:?}: {}", output.code, output.stderr.trim());
    }

    let status = parse_porcelain(&output.stdout);
    if status.worktree_state == FileState::Clean
        || status.worktree_state == FileState::Untracked
    {
        return Ok((status, DiffStat::default()));
    }

    let output = proc::run_with_timeout(
        program,
        &["diff", "HEAD", "--", rel_path],
        Some(worktree),
        timeout,
    )?;
    if !output.success() {
        anyhow::bail!("diff exited with {:?}: {}", output.code, output.stderr.trim());
    }

    Ok((status, crate::diff::parse_unified(&output.stdout)))
}

/// Decodes the first line of porcelain status output; empty output is clean.
pub(crate) fn parse_porcelain(stdout: &str) -> FileStatus {
    stdout
        .lines()
        .next()
        .map_or_else(FileStatus::clean, |line| {
            FileStatus::from_code(line.get(..2).unwrap_or(line))
        })
}
