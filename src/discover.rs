//! Discovery of recently modified files.
//!
//! Delegates the tree walk to an external fast-file-search tool (fd by
//! default) restricted to regular files within the change window, then
//! enriches each hit with stat metadata. A missing tool degrades to an
//! empty result plus a warning; a failing tool is a run-level error since
//! nothing at all can be discovered without it.

use crate::RecapContext;
use crate::record::DiscoveredFile;
use crate::report::RunWarning;
use crate::utils::proc;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Lists regular files under `root` modified within `window`.
///
/// The returned list carries no ordering guarantee; the aggregator imposes
/// order later.
///
/// # Errors
///
/// Returns an error if the search tool is present but the invocation fails.
pub fn discover(
    ctx: &RecapContext,
    root: &Path,
    window: Duration,
    warnings: &mut Vec<RunWarning>,
) -> Result<Vec<DiscoveredFile>> {
    let tool = &ctx.config.discovery.search_tool;
    if proc::find_tool(tool).is_none() {
        warn!(tool = %tool, "Search tool not found, skipping discovery");
        warnings.push(RunWarning::ToolMissing {
            tool: tool.clone(),
            capability: "file discovery".to_string(),
        });
        return Ok(Vec::new());
    }

    // Hidden files are the point of a dotfile-aware tool; repository
    // internals are not.
    let window_arg = format!("{}s", window.as_secs());
    let root_arg = root.display().to_string();
    let output = proc::run_with_timeout(
        tool,
        &[
            "--type",
            "file",
            "--hidden",
            "--no-ignore",
            "--exclude",
            crate::GIT_MARKER,
            "--absolute-path",
            "--changed-within",
            &window_arg,
            ".",
            &root_arg,
        ],
        None,
        ctx.command_timeout(),
    )
    .with_context(|| format!("Failed to run {tool}"))?;

    if !output.success() {
        anyhow::bail!(
            "{tool} exited with {:?}: {}",
            output.code,
            output.stderr.trim()
        );
    }

    let mount_point = &ctx.config.snapshot.mount_point;
    let mut files = Vec::new();
    for line in output.stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let path = Path::new(line);
        // The snapshot mount is a baseline, never a subject
        if path.starts_with(mount_point) {
            continue;
        }
        match stat_file(root, path) {
            Some(file) => files.push(file),
            // Vanished between listing and stat
            None => debug!(path = line, "Skipping unreadable file"),
        }
    }

    debug!(count = files.len(), "Discovery complete");
    Ok(files)
}

/// Attaches mtime and size to one discovered path.
fn stat_file(root: &Path, path: &Path) -> Option<DiscoveredFile> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;

    let relative_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string();

    Some(DiscoveredFile {
        relative_path,
        absolute_path: path.to_path_buf(),
        modified_at: DateTime::<Local>::from(modified),
        size_bytes: metadata.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_context(dir: &Path, search_tool: &str) -> RecapContext {
        let config_path = dir.join("config.toml");
        let mut ctx =
            RecapContext::new_explicit(dir.to_path_buf(), config_path).expect("context");
        ctx.config.discovery.search_tool = search_tool.to_string();
        ctx
    }

    #[test]
    fn test_missing_tool_degrades_to_empty() -> Result<()> {
        let dir = tempdir()?;
        let ctx = test_context(dir.path(), "recap-no-such-tool");

        let mut warnings = Vec::new();
        let files = discover(&ctx, dir.path(), Duration::from_secs(3600), &mut warnings)?;

        assert!(files.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            RunWarning::ToolMissing { tool, .. } if tool == "recap-no-such-tool"
        ));
        Ok(())
    }

    #[test]
    fn test_stat_file_attaches_metadata() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "one\ntwo\n")?;

        let file = stat_file(dir.path(), &path).expect("stat");
        assert_eq!(file.relative_path, "notes.txt");
        assert_eq!(file.size_bytes, 8);
        assert_eq!(file.absolute_path, path);
        Ok(())
    }

    #[test]
    fn test_stat_file_vanished() {
        let file = stat_file(Path::new("/tmp"), Path::new("/tmp/recap-gone-xyz"));
        assert!(file.is_none());
    }
}
