mod common;

use common::TestHome;
use recap::mount::{MountSession, MountState};
use recap::report::RunWarning;
use serial_test::serial;
use std::time::{Duration, Instant};

#[test]
fn populated_mount_point_counts_as_mounted() -> anyhow::Result<()> {
    let home = TestHome::new()?;
    std::fs::create_dir_all(home.path().join("mnt/snapshots/latest"))?;

    let mut session = MountSession::new(&home.ctx);
    let mut warnings = Vec::new();

    assert_eq!(session.ensure_ready(&mut warnings), MountState::Mounted);
    assert!(warnings.is_empty());

    // Idempotent: repeated calls return immediately in the same state
    assert_eq!(session.ensure_ready(&mut warnings), MountState::Mounted);
    assert!(warnings.is_empty());
    Ok(())
}

#[test]
fn missing_mount_tool_fails_without_raising() -> anyhow::Result<()> {
    let home = TestHome::new()?;

    let mut session = MountSession::new(&home.ctx);
    let mut warnings = Vec::new();

    assert_eq!(session.ensure_ready(&mut warnings), MountState::Failed);
    assert!(matches!(&warnings[0], RunWarning::ToolMissing { .. }));

    // Failed is terminal: no retry within a run
    assert_eq!(session.ensure_ready(&mut warnings), MountState::Failed);
    assert_eq!(warnings.len(), 1);
    Ok(())
}

#[test]
#[serial]
fn unpopulated_mount_point_times_out() -> anyhow::Result<()> {
    let home = TestHome::new()?;
    let mut ctx = home.ctx.clone();
    // "sleep" spawns fine but never populates the mount point
    ctx.config.snapshot.mount_tool = "sleep".to_string();
    ctx.config.snapshot.mount_timeout = 1;

    let mut session = MountSession::new(&ctx);
    let mut warnings = Vec::new();

    let start = Instant::now();
    assert_eq!(session.ensure_ready(&mut warnings), MountState::Failed);
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(matches!(&warnings[0], RunWarning::MountTimeout { seconds: 1 }));
    Ok(())
}

#[test]
#[serial]
fn finish_after_mount_reaches_unmounted() -> anyhow::Result<()> {
    let home = TestHome::new()?;
    std::fs::create_dir_all(home.path().join("mnt/snapshots/latest"))?;
    let mut ctx = home.ctx.clone();
    // Force the unmount path through a missing tool: still only a warning
    ctx.config.snapshot.unmount_tool = "recap-test-missing-unmount".to_string();

    let mut session = MountSession::new(&ctx);
    let mut warnings = Vec::new();
    assert_eq!(session.ensure_ready(&mut warnings), MountState::Mounted);

    let warning = session.finish();
    assert!(matches!(warning, Some(RunWarning::ToolMissing { .. })));
    assert_eq!(session.state(), MountState::Unmounted);

    // Unmounted is terminal
    assert_eq!(session.ensure_ready(&mut warnings), MountState::Unmounted);
    Ok(())
}
