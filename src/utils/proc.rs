//! External process invocation.
//!
//! Every backend query runs through [`run_with_timeout`] so one hung
//! subprocess cannot stall the whole batch: the child is polled and killed
//! once the deadline passes, and the caller degrades that single file.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// Interval between child liveness checks
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of a finished external command.
#[derive(Debug)]
pub struct ToolOutput {
    /// Process exit code, if the process exited normally
    pub code: Option<i32>,
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

impl ToolOutput {
    /// True when the process exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Locates an external tool on PATH.
#[must_use]
pub fn find_tool(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Runs an external command to completion, killing it after `timeout`.
///
/// Stdout and stderr are drained on reader threads so large outputs (long
/// diffs) cannot deadlock the pipe while the parent polls for exit.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or if the deadline
/// passes before it exits.
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput> {
    debug!(program, ?args, "Running external command");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn {program}"))?;

    let stdout = child.stdout.take().context("Failed to open child stdout")?;
    let stderr = child.stderr.take().context("Failed to open child stderr")?;
    let out_reader = spawn_reader(stdout);
    let err_reader = spawn_reader(stderr);

    let start = Instant::now();
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs());
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    };

    let stdout = out_reader.join().unwrap_or_default();
    let stderr = err_reader.join().unwrap_or_default();

    Ok(ToolOutput {
        code: status.code(),
        stdout,
        stderr,
    })
}

/// Drains a child pipe on a background thread.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}
