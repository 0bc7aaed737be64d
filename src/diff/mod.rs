//! Unified diff text statistics.
//!
//! Every backend hands back ordinary unified diff text (`git diff`,
//! `yadm diff`, `diff -u`); this module reduces it to a [`DiffStat`] by
//! counting addition lines, deletion lines, and hunk markers. The file
//! headers (`+++`, `---`) are excluded from the counts.

use crate::record::DiffStat;

/// Reduces unified diff text to line/hunk counts.
#[must_use]
pub fn parse_unified(text: &str) -> DiffStat {
    let mut stat = DiffStat::default();

    for line in text.lines() {
        if line.starts_with("@@") {
            stat.chunks += 1;
        } else if line.starts_with('+') && !line.starts_with("+++") {
            stat.additions += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            stat.deletions += 1;
        }
    }

    stat
}

/// Counts the lines of a file's content, used when a whole file is new
/// relative to its baseline.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn count_lines(content: &str) -> u32 {
    content.lines().count() as u32
}
