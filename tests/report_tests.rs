use chrono::{DateTime, Local, TimeZone};
use recap::record::{DiffStat, DiscoveredFile, FileState, FileStatus, TrackingKind};
use recap::report::{RunWarning, build_report};
use std::path::PathBuf;

fn record(
    path: &str,
    at: DateTime<Local>,
    tracking: TrackingKind,
    status: FileStatus,
    diff: DiffStat,
) -> recap::record::FileRecord {
    DiscoveredFile {
        relative_path: path.to_string(),
        absolute_path: PathBuf::from("/home/user").join(path),
        modified_at: at,
        size_bytes: 256,
    }
    .into_record(tracking, status, diff)
}

fn at(day: u32, h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 7, day, h, m, 0).unwrap()
}

#[test]
fn empty_discovery_yields_all_zero_report() {
    let report = build_report(Vec::new(), Vec::new());

    assert!(report.is_empty());
    assert_eq!(report.overall.total_files, 0);
    assert_eq!(report.overall.active_hours, 0);
    assert_eq!(report.overall.changed_files, 0);
    assert_eq!(report.overall.additions, 0);
    assert_eq!(report.overall.deletions, 0);
    assert!(report.buckets.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn minutes_within_an_hour_share_a_bucket() {
    let report = build_report(
        vec![
            record(
                "a.txt",
                at(7, 14, 3),
                TrackingKind::Git,
                FileStatus::modified(),
                DiffStat::new(1, 1, 1),
            ),
            record(
                "b.txt",
                at(7, 14, 58),
                TrackingKind::Git,
                FileStatus::modified(),
                DiffStat::new(2, 0, 1),
            ),
        ],
        Vec::new(),
    );

    assert_eq!(report.buckets.len(), 1);
    assert_eq!(report.buckets[0].key, "2025-07-07 14");
    assert_eq!(report.buckets[0].summary.total_files, 2);
    assert_eq!(report.overall.active_hours, 1);
}

#[test]
fn adjacent_hours_order_ascending() {
    let report = build_report(
        vec![
            record(
                "later.txt",
                at(7, 15, 0),
                TrackingKind::Untracked,
                FileStatus::untracked(),
                DiffStat::default(),
            ),
            record(
                "earlier.txt",
                at(7, 14, 59),
                TrackingKind::Untracked,
                FileStatus::untracked(),
                DiffStat::default(),
            ),
        ],
        Vec::new(),
    );

    let keys: Vec<&str> = report.buckets.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, ["2025-07-07 14", "2025-07-07 15"]);
    assert_eq!(report.overall.active_hours, 2);
}

#[test]
fn git_modification_contributes_to_bucket_and_overall() {
    // Git-tracked src/a.rb modified at 14:23 with +5/-2 in one hunk
    let report = build_report(
        vec![record(
            "src/a.rb",
            at(7, 14, 23),
            TrackingKind::Git,
            FileStatus::modified(),
            DiffStat::new(5, 2, 1),
        )],
        Vec::new(),
    );

    let bucket = &report.buckets[0];
    assert_eq!(bucket.key, "2025-07-07 14");
    assert_eq!(bucket.summary.additions, 5);
    assert_eq!(bucket.summary.deletions, 2);
    assert_eq!(bucket.summary.changed_files, 1);
    assert_eq!(report.overall.additions, 5);
    assert_eq!(report.overall.deletions, 2);
    assert_eq!(report.overall.tracked_count(TrackingKind::Git), 1);
}

#[test]
fn clean_records_obey_zero_diff_invariant() {
    let report = build_report(
        vec![
            record(
                "same.txt",
                at(8, 9, 15),
                TrackingKind::Snapshot,
                FileStatus::clean(),
                DiffStat::default(),
            ),
            record(
                "changed.txt",
                at(8, 9, 30),
                TrackingKind::Dotfile,
                FileStatus::modified(),
                DiffStat::new(3, 1, 1),
            ),
        ],
        Vec::new(),
    );

    for bucket in &report.buckets {
        for r in &bucket.records {
            if r.status.worktree_state == FileState::Clean {
                assert_eq!(r.diff.additions, 0);
                assert_eq!(r.diff.deletions, 0);
            }
        }
    }
    assert_eq!(report.overall.changed_files, 1);
    assert_eq!(report.overall.total_files, 2);
}

#[test]
fn per_kind_counts_cover_all_records() {
    let kinds = [
        TrackingKind::Git,
        TrackingKind::Dotfile,
        TrackingKind::Snapshot,
        TrackingKind::New,
        TrackingKind::Untracked,
    ];
    let records = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            record(
                &format!("f{i}.txt"),
                at(9, 10, i as u32),
                *kind,
                FileStatus::untracked(),
                DiffStat::default(),
            )
        })
        .collect();

    let report = build_report(records, Vec::new());
    for kind in kinds {
        assert_eq!(report.overall.tracked_count(kind), 1);
    }
    assert_eq!(report.overall.total_files, 5);
}

#[test]
fn warnings_are_carried_through() {
    let report = build_report(
        Vec::new(),
        vec![
            RunWarning::ToolMissing {
                tool: "fd".to_string(),
                capability: "file discovery".to_string(),
            },
            RunWarning::MountTimeout { seconds: 5 },
        ],
    );

    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[0].user_message().contains("fd"));
    assert!(report.warnings[1].user_message().contains("5s"));
}
