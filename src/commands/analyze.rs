use crate::output;
use crate::{RecapContext, analyze};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Execute the analysis: discover, classify, analyze, and render.
///
/// `directory` defaults to the home directory and `since` to the configured
/// window.
///
/// # Errors
///
/// Returns an error if the window cannot be parsed or discovery fails
/// outright; degraded backends surface as report warnings instead.
pub fn execute(
    ctx: &RecapContext,
    directory: Option<&Path>,
    since: Option<&str>,
    short: bool,
) -> Result<()> {
    let root: PathBuf = directory.map_or_else(|| ctx.home.clone(), Path::to_path_buf);
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let window_str = since.unwrap_or(&ctx.config.discovery.default_window);
    let window = humantime::parse_duration(window_str)
        .with_context(|| format!("Invalid time window: {window_str}"))?;

    let report = analyze::analyze_directory(ctx, &root, window)?;
    output::table::render(&report, ctx, short);

    Ok(())
}
