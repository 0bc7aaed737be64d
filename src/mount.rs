//! Snapshot mount session lifecycle.
//!
//! The snapshot analyzer needs the most recent backup archive mounted as a
//! read-only filesystem. [`MountSession`] owns that external resource: it
//! spawns the backup tool's mount subcommand detached in its own process
//! group (optionally inside the user's terminal emulator so a passphrase
//! prompt stays visible), polls the mount point for readiness under a
//! timeout, and guarantees the unmount runs when the session is dropped,
//! whether the run finished, errored, or was cancelled.
//!
//! State transitions are driven only by this type: `NotMounted` moves to
//! `Mounted` directly when the mount point is already populated, otherwise
//! through `Mounting`; the poll loop ends in `Mounted` or `Failed`; and
//! `Mounted` ends in `Unmounted`. `Failed` and `Unmounted` are terminal
//! within a run, so a failed mount is never retried.

use crate::RecapContext;
use crate::report::RunWarning;
use crate::utils::proc;
use anyhow::Result;
use command_group::{CommandGroup, GroupChild};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Interval between mount point readiness checks
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle state of the snapshot mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// No mount attempted yet
    NotMounted,
    /// Mount process spawned, waiting for the mount point to populate
    Mounting,
    /// Mount point is populated and usable
    Mounted,
    /// Mount did not become ready; not retried this run
    Failed,
    /// Mount was detached (or cleanup ran)
    Unmounted,
}

/// Singleton-per-run owner of the mounted snapshot filesystem.
pub struct MountSession {
    state: MountState,
    repository: String,
    mount_point: PathBuf,
    mount_tool: String,
    unmount_tool: String,
    terminal: String,
    timeout: Duration,
    command_timeout: Duration,
    child: Option<GroupChild>,
    spawns: u32,
}

impl MountSession {
    /// Creates a session from the run configuration. Nothing is spawned
    /// until [`ensure_ready`](Self::ensure_ready) is called.
    #[must_use]
    pub fn new(ctx: &RecapContext) -> Self {
        let snapshot = &ctx.config.snapshot;
        Self {
            state: MountState::NotMounted,
            repository: snapshot.repository.clone(),
            mount_point: snapshot.mount_point.clone(),
            mount_tool: snapshot.mount_tool.clone(),
            unmount_tool: snapshot.unmount_tool.clone(),
            terminal: snapshot.terminal.clone(),
            timeout: Duration::from_secs(snapshot.mount_timeout),
            command_timeout: ctx.command_timeout(),
            child: None,
            spawns: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MountState {
        self.state
    }

    /// Mount point directory backing this session.
    #[must_use]
    pub fn mount_point(&self) -> &PathBuf {
        &self.mount_point
    }

    /// Drives the session toward `Mounted`, returning the resulting state.
    ///
    /// Idempotent: an already-`Mounted` session returns immediately without
    /// spawning anything, and the terminal states (`Failed`, `Unmounted`)
    /// are sticky. A mount point that is already populated counts as
    /// mounted without re-spawning the mount process.
    pub fn ensure_ready(&mut self, warnings: &mut Vec<RunWarning>) -> MountState {
        match self.state {
            MountState::Mounted | MountState::Failed | MountState::Unmounted => {
                return self.state;
            }
            MountState::NotMounted | MountState::Mounting => {}
        }

        if self.is_populated() {
            debug!(mount_point = %self.mount_point.display(), "Mount point already populated");
            self.state = MountState::Mounted;
            return self.state;
        }

        if let Err(warning) = self.spawn_mount() {
            warnings.push(warning);
            self.state = MountState::Failed;
            return self.state;
        }
        self.state = MountState::Mounting;

        let start = Instant::now();
        loop {
            if self.is_populated() {
                info!(
                    mount_point = %self.mount_point.display(),
                    waited_ms = start.elapsed().as_millis() as u64,
                    "Snapshot mounted"
                );
                self.state = MountState::Mounted;
                return self.state;
            }
            if start.elapsed() >= self.timeout {
                warn!(
                    timeout_s = self.timeout.as_secs(),
                    "Snapshot mount did not become ready"
                );
                warnings.push(RunWarning::MountTimeout {
                    seconds: self.timeout.as_secs(),
                });
                self.release_child();
                self.state = MountState::Failed;
                return self.state;
            }
            std::thread::sleep(POLL_INTERVAL.min(self.timeout));
        }
    }

    /// Detaches the mount and releases the process handle.
    ///
    /// Returns a warning instead of an error when the unmount utility is
    /// missing or fails; the analysis result is unaffected either way.
    pub fn finish(&mut self) -> Option<RunWarning> {
        if self.state != MountState::Mounted {
            self.release_child();
            return None;
        }

        let result = self.run_unmount();
        self.release_child();
        self.state = MountState::Unmounted;
        result.err()
    }

    /// Spawns the detached mount process group.
    fn spawn_mount(&mut self) -> Result<(), RunWarning> {
        if self.repository.is_empty() {
            return Err(RunWarning::BackendError {
                path: self.mount_point.display().to_string(),
                message: "no backup repository configured".to_string(),
            });
        }

        let mut argv: Vec<String> = Vec::new();
        if !self.terminal.is_empty() {
            match shell_words::split(&self.terminal) {
                Ok(words) => argv.extend(words),
                Err(e) => {
                    return Err(RunWarning::BackendError {
                        path: self.mount_point.display().to_string(),
                        message: format!("invalid terminal command: {e}"),
                    });
                }
            }
        }
        argv.push(self.mount_tool.clone());
        argv.push("-r".to_string());
        argv.push(self.repository.clone());
        argv.push("mount".to_string());
        argv.push(self.mount_point.display().to_string());

        let program = argv[0].clone();
        if proc::find_tool(&program).is_none() {
            return Err(RunWarning::ToolMissing {
                tool: program,
                capability: "snapshot mount".to_string(),
            });
        }

        debug!(?argv, "Spawning mount process");

        // Spawn as process group for proper cleanup
        let child = Command::new(&program)
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .group_spawn()
            .map_err(|e| RunWarning::BackendError {
                path: self.mount_point.display().to_string(),
                message: format!("failed to spawn {program}: {e}"),
            })?;

        self.child = Some(child);
        self.spawns += 1;
        Ok(())
    }

    /// Runs the unmount utility against the mount point.
    fn run_unmount(&self) -> Result<(), RunWarning> {
        if proc::find_tool(&self.unmount_tool).is_none() {
            return Err(RunWarning::ToolMissing {
                tool: self.unmount_tool.clone(),
                capability: "snapshot unmount".to_string(),
            });
        }

        let mount_point = self.mount_point.display().to_string();
        match proc::run_with_timeout(
            &self.unmount_tool,
            &["-u", &mount_point],
            None,
            self.command_timeout,
        ) {
            Ok(output) if output.success() => {
                info!(mount_point = %mount_point, "Snapshot unmounted");
                Ok(())
            }
            Ok(output) => {
                warn!(stderr = %output.stderr.trim(), "Unmount failed");
                Err(RunWarning::UnmountFailure {
                    mount_point: self.mount_point.clone(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Unmount failed");
                Err(RunWarning::UnmountFailure {
                    mount_point: self.mount_point.clone(),
                })
            }
        }
    }

    /// True when the mount point directory exists and is non-empty.
    fn is_populated(&self) -> bool {
        std::fs::read_dir(&self.mount_point)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Reaps the mount process group, if one was spawned.
    fn release_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for MountSession {
    // Cleanup must run on cancelled and erroring paths too, so it lives in
    // Drop rather than at the normal end of the run only.
    fn drop(&mut self) {
        if let Some(warning) = self.finish() {
            warn!("{}", warning.user_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecapContext;
    use tempfile::TempDir;

    fn session(configure: impl FnOnce(&mut crate::config::SnapshotConfig)) -> (TempDir, MountSession) {
        let dir = TempDir::new().expect("tempdir");
        let config_path = dir.path().join("config.toml");
        let mut ctx = RecapContext::new_explicit(dir.path().to_path_buf(), config_path)
            .expect("context");
        ctx.config.snapshot.mount_point = dir.path().join("mnt");
        ctx.config.snapshot.repository = "test-repo".to_string();
        ctx.config.snapshot.mount_timeout = 1;
        configure(&mut ctx.config.snapshot);
        let session = MountSession::new(&ctx);
        (dir, session)
    }

    #[test]
    fn test_populated_mount_point_is_mounted_without_spawn() {
        let (dir, mut session) = session(|_| {});
        let mount_point = dir.path().join("mnt");
        std::fs::create_dir_all(mount_point.join("snapshots")).unwrap();

        let mut warnings = Vec::new();
        assert_eq!(session.ensure_ready(&mut warnings), MountState::Mounted);
        assert_eq!(session.spawns, 0);
        assert!(warnings.is_empty());

        // Idempotent: no second spawn, immediate return
        assert_eq!(session.ensure_ready(&mut warnings), MountState::Mounted);
        assert_eq!(session.spawns, 0);

        // Unmount of a plain directory fails but must only warn
        let _ = session.finish();
        assert_eq!(session.state(), MountState::Unmounted);
    }

    #[test]
    fn test_missing_mount_tool_fails() {
        let (_dir, mut session) = session(|s| {
            s.mount_tool = "recap-no-such-tool".to_string();
        });

        let mut warnings = Vec::new();
        assert_eq!(session.ensure_ready(&mut warnings), MountState::Failed);
        assert!(matches!(
            &warnings[0],
            RunWarning::ToolMissing { tool, .. } if tool == "recap-no-such-tool"
        ));

        // Terminal state is sticky
        assert_eq!(session.ensure_ready(&mut warnings), MountState::Failed);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unconfigured_repository_fails() {
        let (_dir, mut session) = session(|s| {
            s.repository = String::new();
        });

        let mut warnings = Vec::new();
        assert_eq!(session.ensure_ready(&mut warnings), MountState::Failed);
        assert!(matches!(&warnings[0], RunWarning::BackendError { .. }));
    }

    #[test]
    fn test_timeout_transitions_to_failed() {
        // "sleep" rejects the mount argv and exits; the mount point never
        // populates, so the poll loop must run out the full timeout.
        let (_dir, mut session) = session(|s| {
            s.mount_tool = "sleep".to_string();
            s.mount_timeout = 1;
        });

        let start = Instant::now();
        let mut warnings = Vec::new();
        assert_eq!(session.ensure_ready(&mut warnings), MountState::Failed);
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(matches!(
            &warnings[0],
            RunWarning::MountTimeout { seconds: 1 }
        ));
        assert_eq!(session.spawns, 1);
    }

    #[test]
    fn test_finish_without_mount_is_noop() {
        let (_dir, mut session) = session(|_| {});
        assert!(session.finish().is_none());
        assert_eq!(session.state(), MountState::NotMounted);
    }

    #[test]
    fn test_unmount_tool_missing_warns() {
        let (dir, mut session) = session(|s| {
            s.unmount_tool = "recap-no-such-tool".to_string();
        });
        std::fs::create_dir_all(dir.path().join("mnt/snapshots")).unwrap();

        let mut warnings = Vec::new();
        assert_eq!(session.ensure_ready(&mut warnings), MountState::Mounted);

        let warning = session.finish();
        assert!(matches!(warning, Some(RunWarning::ToolMissing { .. })));
        assert_eq!(session.state(), MountState::Unmounted);
    }
}
