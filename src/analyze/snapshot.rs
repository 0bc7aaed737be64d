//! Snapshot baseline analyzer.
//!
//! Files outside git and the dotfile manager are compared against their
//! counterpart in the mounted backup snapshot. The backup tool's FUSE
//! layout exposes the newest archive under `snapshots/latest/` with the
//! full original path inside, so the baseline for `/home/user/notes.txt`
//! lives at `<mount>/snapshots/latest/home/user/notes.txt`.
//!
//! A file absent from the snapshot is reclassified `New`; a file with no
//! mounted baseline at all stays `Untracked` with a zero diff.

use crate::RecapContext;
use crate::mount::{MountSession, MountState};
use crate::record::{DiffStat, DiscoveredFile, FileStatus, TrackingKind};
use crate::report::RunWarning;
use crate::utils::proc;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Relative location of the newest archive inside the mount
const LATEST_SNAPSHOT: &str = "snapshots/latest";

/// Analyzer over a (possibly absent) mounted snapshot baseline.
pub struct SnapshotAnalyzer {
    home: PathBuf,
    baseline_root: Option<PathBuf>,
    diff_tool: Option<PathBuf>,
    command_timeout: Duration,
}

impl SnapshotAnalyzer {
    /// Prepares the analyzer against the session's mount state.
    ///
    /// Emits a single capability warning when the snapshot is mounted but
    /// the external diff utility is missing; comparisons then degrade to
    /// unchanged/zero for the whole run.
    #[must_use]
    pub fn new(
        ctx: &RecapContext,
        session: &MountSession,
        warnings: &mut Vec<RunWarning>,
    ) -> Self {
        let mounted = session.state() == MountState::Mounted;
        let baseline_root =
            mounted.then(|| baseline_root(session.mount_point(), &ctx.home));

        let diff_tool = proc::find_tool("diff");
        if mounted && diff_tool.is_none() {
            warn!("diff utility not found, snapshot comparison degraded");
            warnings.push(RunWarning::ToolMissing {
                tool: "diff".to_string(),
                capability: "snapshot comparison".to_string(),
            });
        }

        Self {
            home: ctx.home.clone(),
            baseline_root,
            diff_tool,
            command_timeout: ctx.command_timeout(),
        }
    }

    /// Resolves one file against the snapshot baseline.
    #[must_use]
    pub fn analyze(
        &self,
        file: &DiscoveredFile,
    ) -> (TrackingKind, FileStatus, DiffStat, Option<RunWarning>) {
        let Some(root) = &self.baseline_root else {
            return (
                TrackingKind::Untracked,
                FileStatus::untracked(),
                DiffStat::default(),
                None,
            );
        };

        let Ok(rel) = file.absolute_path.strip_prefix(&self.home) else {
            // Outside the home tree there is no snapshot counterpart
            return (
                TrackingKind::Untracked,
                FileStatus::untracked(),
                DiffStat::default(),
                None,
            );
        };
        let baseline = root.join(rel);

        if !baseline.exists() {
            return self.analyze_new(file);
        }

        let Some(diff_tool) = &self.diff_tool else {
            return (
                TrackingKind::Snapshot,
                FileStatus::clean(),
                DiffStat::default(),
                None,
            );
        };

        let baseline_arg = baseline.display().to_string();
        let live_arg = file.absolute_path.display().to_string();
        let diff_arg = diff_tool.display().to_string();
        match proc::run_with_timeout(
            &diff_arg,
            &["-u", &baseline_arg, &live_arg],
            None,
            self.command_timeout,
        ) {
            // Exit 0: identical; exit 1: differences found
            Ok(output) if output.code == Some(0) => (
                TrackingKind::Snapshot,
                FileStatus::clean(),
                DiffStat::default(),
                None,
            ),
            Ok(output) if output.code == Some(1) => {
                let stat = crate::diff::parse_unified(&output.stdout);
                debug!(path = %file.relative_path, ?stat, "snapshot diff");
                (TrackingKind::Snapshot, FileStatus::modified(), stat, None)
            }
            Ok(output) => (
                TrackingKind::Snapshot,
                FileStatus::error(),
                DiffStat::default(),
                Some(RunWarning::BackendError {
                    path: file.relative_path.clone(),
                    message: output.stderr.trim().to_string(),
                }),
            ),
            Err(e) => (
                TrackingKind::Snapshot,
                FileStatus::error(),
                DiffStat::default(),
                Some(RunWarning::BackendError {
                    path: file.relative_path.clone(),
                    message: e.to_string(),
                }),
            ),
        }
    }

    /// A file with no snapshot counterpart: everything in it is new.
    fn analyze_new(
        &self,
        file: &DiscoveredFile,
    ) -> (TrackingKind, FileStatus, DiffStat, Option<RunWarning>) {
        match std::fs::read_to_string(&file.absolute_path) {
            Ok(content) => {
                let additions = crate::diff::count_lines(&content);
                (
                    TrackingKind::New,
                    FileStatus::added(),
                    DiffStat::new(additions, 0, 1),
                    None,
                )
            }
            Err(e) => (
                TrackingKind::New,
                FileStatus::error(),
                DiffStat::default(),
                Some(RunWarning::BackendError {
                    path: file.relative_path.clone(),
                    message: e.to_string(),
                }),
            ),
        }
    }
}

/// Baseline root for a home directory: the mount's latest snapshot joined
/// with the home path minus its root component.
fn baseline_root(mount_point: &Path, home: &Path) -> PathBuf {
    let stripped: PathBuf = home
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    mount_point.join(LATEST_SNAPSHOT).join(stripped)
}
