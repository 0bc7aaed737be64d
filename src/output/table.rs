//! Console rendering of the analysis report.
//!
//! The engine hands over a fully computed [`Report`]; this module only
//! formats rows. Summary and warning messages go to stderr, report rows to
//! stdout.

use crate::RecapContext;
use crate::record::FileRecord;
use crate::report::{Report, Summary};
use crate::utils::{format_relative_time, format_size};
use colored::Colorize;

/// Renders the report, either bucketed (default) or as a flat short list.
pub fn render(report: &Report, ctx: &RecapContext, short: bool) {
    if report.is_empty() {
        crate::commands::print_info("No files modified within the window");
        render_warnings(report);
        return;
    }

    if short {
        for bucket in &report.buckets {
            for record in &bucket.records {
                println!(
                    "{} {}",
                    record.status.worktree_state.short_char(),
                    record.relative_path
                );
            }
        }
    } else {
        render_summary_line(&report.overall);
        if let Some(newest) = report
            .buckets
            .iter()
            .flat_map(|b| b.records.iter())
            .map(|r| r.modified_at.timestamp())
            .max()
        {
            println!("{}", format!("newest change {}", format_relative_time(newest)).dimmed());
        }
        for bucket in &report.buckets {
            println!();
            println!(
                "{}  {}",
                bucket.label.bold(),
                summary_counts(&bucket.summary).dimmed()
            );
            for record in &bucket.records {
                render_row(record, ctx);
            }
        }
    }

    render_warnings(report);
}

/// Overall one-line summary.
fn render_summary_line(summary: &Summary) {
    let hours = if summary.active_hours == 1 {
        "1 active hour".to_string()
    } else {
        format!("{} active hours", summary.active_hours)
    };
    println!(
        "{} files ({} changed) across {}  {} {}",
        summary.total_files,
        summary.changed_files,
        hours,
        format!("+{}", summary.additions).green(),
        format!("-{}", summary.deletions).red()
    );
}

/// Compact per-bucket counts used next to the bucket label.
fn summary_counts(summary: &Summary) -> String {
    format!(
        "({} files, +{} -{})",
        summary.total_files, summary.additions, summary.deletions
    )
}

/// One file row: state, counts, tracking tag, size, time, path.
fn render_row(record: &FileRecord, ctx: &RecapContext) {
    // Pad before coloring so ANSI codes do not break the column widths
    let additions = format!("{:>6}", format!("+{}", record.diff.additions));
    let deletions = format!("{:>6}", format!("-{}", record.diff.deletions));
    let tag = format!("{:<9}", record.tracking.tag());

    println!(
        "  {} {} {}  {} {:>9}  {}  {}",
        record.status.worktree_state.colored_char(),
        additions.green(),
        deletions.red(),
        record.tracking.colorize(&tag),
        format_size(record.size_bytes),
        record
            .modified_at
            .format(&ctx.config.core.time_format)
            .to_string()
            .dimmed(),
        record.relative_path
    );
}

/// Degraded conditions, always shown after the report body.
fn render_warnings(report: &Report) {
    for warning in &report.warnings {
        crate::output::warning(&format!("warning: {}", warning.user_message()));
    }
}
