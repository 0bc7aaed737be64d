//! Report aggregation.
//!
//! [`build_report`] is a pure function over the analyzed records: it groups
//! them into hourly buckets, computes per-bucket and overall summaries, and
//! attaches the warnings collected during the run. It performs no I/O and
//! does not mutate the records.

use crate::record::{FileRecord, TrackingKind};
use chrono::{DateTime, Duration, Local, Timelike};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Format of the bucket grouping key
const BUCKET_KEY_FORMAT: &str = "%Y-%m-%d %H";

/// A degraded condition observed during a run.
///
/// Warnings never abort the analysis; they ride along on the [`Report`] so
/// user-facing tooling can surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// A required external utility is absent; the dependent capability was
    /// skipped for the whole run
    ToolMissing {
        /// Name of the missing executable
        tool: String,
        /// Capability that was skipped
        capability: String,
    },
    /// A per-file status/diff query failed; only that file degraded
    BackendError {
        /// Path of the affected file
        path: String,
        /// Backend error detail
        message: String,
    },
    /// The snapshot mount did not become ready within the timeout
    MountTimeout {
        /// Configured timeout in seconds
        seconds: u64,
    },
    /// Cleanup could not unmount the snapshot
    UnmountFailure {
        /// Mount point needing manual intervention
        mount_point: PathBuf,
    },
}

impl RunWarning {
    /// User-facing message with remediation guidance where applicable.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ToolMissing { tool, capability } => {
                format!("'{tool}' not found, {capability} skipped for this run")
            }
            Self::BackendError { path, message } => {
                format!("status query failed for {path}: {message}")
            }
            Self::MountTimeout { seconds } => format!(
                "snapshot mount not ready after {seconds}s, untracked files reported without diffs"
            ),
            Self::UnmountFailure { mount_point } => format!(
                "could not unmount snapshot, detach it manually: fusermount -u {}",
                mount_point.display()
            ),
        }
    }
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Counts and totals over a set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of records
    pub total_files: usize,
    /// Number of distinct hour buckets the records span
    pub active_hours: usize,
    /// Records whose worktree state is not clean
    pub changed_files: usize,
    /// Record count per tracking kind
    pub by_tracking: BTreeMap<TrackingKind, usize>,
    /// Total added lines
    pub additions: u64,
    /// Total removed lines
    pub deletions: u64,
}

impl Summary {
    fn accumulate(&mut self, record: &FileRecord) {
        self.total_files += 1;
        if record.is_changed() {
            self.changed_files += 1;
        }
        *self.by_tracking.entry(record.tracking).or_insert(0) += 1;
        self.additions += u64::from(record.diff.additions);
        self.deletions += u64::from(record.diff.deletions);
    }

    /// Record count for one tracking kind.
    #[must_use]
    pub fn tracked_count(&self, kind: TrackingKind) -> usize {
        self.by_tracking.get(&kind).copied().unwrap_or(0)
    }
}

/// One hour of activity.
#[derive(Debug, Clone)]
pub struct HourlyBucket {
    /// Grouping key (`YYYY-MM-DD HH`)
    pub key: String,
    /// Start of the hour
    pub start: DateTime<Local>,
    /// Human-readable label spanning the bucket's wall-clock hour
    pub label: String,
    /// Records in discovery order
    pub records: Vec<FileRecord>,
    /// Summary scoped to this bucket
    pub summary: Summary,
}

/// The full analysis result handed to the renderer.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Summary over every record
    pub overall: Summary,
    /// Buckets in ascending time order
    pub buckets: Vec<HourlyBucket>,
    /// Degraded conditions observed during the run
    pub warnings: Vec<RunWarning>,
}

impl Report {
    /// True when discovery produced nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overall.total_files == 0
    }
}

/// Truncates a timestamp to the start of its hour.
fn truncate_to_hour(at: DateTime<Local>) -> DateTime<Local> {
    at.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Label spanning the bucket's start and end wall-clock hour.
fn bucket_label(start: DateTime<Local>) -> String {
    let end = start + Duration::hours(1);
    format!(
        "{} - {}",
        start.format("%Y-%m-%d %H:00"),
        end.format("%H:00")
    )
}

/// Groups records into ascending hourly buckets and computes summaries.
#[must_use]
pub fn build_report(records: Vec<FileRecord>, warnings: Vec<RunWarning>) -> Report {
    let mut grouped: BTreeMap<String, Vec<FileRecord>> = BTreeMap::new();
    for record in records {
        let key = record.modified_at.format(BUCKET_KEY_FORMAT).to_string();
        grouped.entry(key).or_default().push(record);
    }

    let mut overall = Summary::default();
    let mut buckets = Vec::with_capacity(grouped.len());

    for (key, records) in grouped {
        let mut summary = Summary::default();
        for record in &records {
            summary.accumulate(record);
            overall.accumulate(record);
        }
        summary.active_hours = 1;

        let start = truncate_to_hour(records[0].modified_at);
        buckets.push(HourlyBucket {
            key,
            start,
            label: bucket_label(start),
            records,
            summary,
        });
    }

    overall.active_hours = buckets.len();

    Report {
        overall,
        buckets,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DiffStat, DiscoveredFile, FileStatus};
    use chrono::TimeZone;

    fn record_at(
        path: &str,
        at: DateTime<Local>,
        tracking: TrackingKind,
        status: FileStatus,
        diff: DiffStat,
    ) -> FileRecord {
        DiscoveredFile {
            relative_path: path.to_string(),
            absolute_path: PathBuf::from("/home/user").join(path),
            modified_at: at,
            size_bytes: 64,
        }
        .into_record(tracking, status, diff)
    }

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 7, 7, h, m, 0).unwrap()
    }

    #[test]
    fn test_empty_discovery_yields_zero_report() {
        let report = build_report(Vec::new(), Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.overall.total_files, 0);
        assert_eq!(report.overall.active_hours, 0);
        assert_eq!(report.overall.additions, 0);
        assert!(report.buckets.is_empty());
    }

    #[test]
    fn test_same_hour_lands_in_same_bucket() {
        let records = vec![
            record_at(
                "a.txt",
                at(14, 5),
                TrackingKind::Git,
                FileStatus::modified(),
                DiffStat::new(1, 0, 1),
            ),
            record_at(
                "b.txt",
                at(14, 59),
                TrackingKind::Git,
                FileStatus::modified(),
                DiffStat::new(2, 0, 1),
            ),
        ];
        let report = build_report(records, Vec::new());
        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].key, "2025-07-07 14");
        assert_eq!(report.buckets[0].summary.total_files, 2);
    }

    #[test]
    fn test_adjacent_hours_bucket_in_order() {
        // Insert out of time order to exercise the sort
        let records = vec![
            record_at(
                "late.txt",
                at(15, 0),
                TrackingKind::Git,
                FileStatus::modified(),
                DiffStat::new(1, 0, 1),
            ),
            record_at(
                "early.txt",
                at(14, 59),
                TrackingKind::Git,
                FileStatus::modified(),
                DiffStat::new(1, 0, 1),
            ),
        ];
        let report = build_report(records, Vec::new());
        assert_eq!(report.buckets.len(), 2);
        assert_eq!(report.buckets[0].key, "2025-07-07 14");
        assert_eq!(report.buckets[1].key, "2025-07-07 15");
        assert_eq!(report.overall.active_hours, 2);
    }

    #[test]
    fn test_modified_git_file_scenario() {
        // Git-tracked file modified 14:23 with +5/-2/1 hunk
        let records = vec![record_at(
            "src/a.rb",
            at(14, 23),
            TrackingKind::Git,
            FileStatus::modified(),
            DiffStat::new(5, 2, 1),
        )];
        let report = build_report(records, Vec::new());

        let bucket = &report.buckets[0];
        assert_eq!(bucket.key, "2025-07-07 14");
        assert_eq!(bucket.label, "2025-07-07 14:00 - 15:00");
        assert_eq!(bucket.summary.additions, 5);
        assert_eq!(bucket.summary.deletions, 2);
        assert_eq!(report.overall.additions, 5);
        assert_eq!(report.overall.deletions, 2);
        assert_eq!(report.overall.changed_files, 1);
        assert_eq!(report.overall.tracked_count(TrackingKind::Git), 1);
    }

    #[test]
    fn test_clean_file_counts_as_unchanged() {
        let records = vec![record_at(
            "same.txt",
            at(9, 0),
            TrackingKind::Snapshot,
            FileStatus::clean(),
            DiffStat::default(),
        )];
        let report = build_report(records, Vec::new());
        assert_eq!(report.overall.changed_files, 0);
        assert_eq!(report.overall.total_files, 1);
    }

    #[test]
    fn test_bucket_preserves_discovery_order() {
        let records = vec![
            record_at(
                "second.txt",
                at(10, 30),
                TrackingKind::Untracked,
                FileStatus::untracked(),
                DiffStat::default(),
            ),
            record_at(
                "first.txt",
                at(10, 10),
                TrackingKind::Untracked,
                FileStatus::untracked(),
                DiffStat::default(),
            ),
        ];
        let report = build_report(records, Vec::new());
        // No secondary sort inside a bucket
        assert_eq!(report.buckets[0].records[0].relative_path, "second.txt");
        assert_eq!(report.buckets[0].records[1].relative_path, "first.txt");
    }

    #[test]
    fn test_warnings_ride_along() {
        let warnings = vec![RunWarning::MountTimeout { seconds: 5 }];
        let report = build_report(Vec::new(), warnings);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].user_message().contains("5s"));
    }

    #[test]
    fn test_unmount_warning_names_mount_point() {
        let warning = RunWarning::UnmountFailure {
            mount_point: PathBuf::from("/mnt/backup"),
        };
        assert!(warning.user_message().contains("/mnt/backup"));
        assert!(warning.user_message().contains("fusermount"));
    }
}
