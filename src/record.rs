//! Core data model shared by every stage of the pipeline.
//!
//! Discovery produces [`DiscoveredFile`]s; classification and analysis turn
//! each into exactly one [`FileRecord`] via [`DiscoveredFile::into_record`].
//! There is deliberately no way to change `tracking` on an existing record.

use chrono::{DateTime, Local};
use colored::Colorize;
use std::fmt;
use std::path::PathBuf;

/// The system of record used to determine how a file has changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackingKind {
    /// Inside a git working tree
    Git,
    /// Managed by the dotfile manager
    Dotfile,
    /// Compared against the mounted backup snapshot
    Snapshot,
    /// Absent from the snapshot baseline
    New,
    /// No usable baseline
    Untracked,
}

impl TrackingKind {
    /// Short tag used in report rows
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Dotfile => "dotfile",
            Self::Snapshot => "snapshot",
            Self::New => "new",
            Self::Untracked => "untracked",
        }
    }

    /// Applies this kind's color to an (already padded) tag string.
    #[must_use]
    pub fn colorize(&self, tag: &str) -> String {
        match self {
            Self::Git => tag.cyan().to_string(),
            Self::Dotfile => tag.magenta().to_string(),
            Self::Snapshot => tag.blue().to_string(),
            Self::New => tag.green().to_string(),
            Self::Untracked => tag.bright_black().to_string(),
        }
    }
}

impl fmt::Display for TrackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One side (index or worktree) of a porcelain status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// No change recorded
    Clean,
    /// File has been newly added
    Added,
    /// File content has been changed
    Modified,
    /// File has been removed
    Deleted,
    /// File is not known to the backend
    Untracked,
    /// File has unresolved merge conflicts
    Unmerged,
    /// File was renamed
    Renamed,
    /// File was copied
    Copied,
    /// Backend reported a code this tool does not understand
    Unknown,
    /// The status query itself failed for this file
    Error,
}

impl FileState {
    /// Maps one character of a git porcelain XY code.
    #[must_use]
    pub const fn from_porcelain(c: char) -> Self {
        match c {
            ' ' => Self::Clean,
            'A' => Self::Added,
            'M' | 'T' => Self::Modified,
            'D' => Self::Deleted,
            '?' => Self::Untracked,
            'U' => Self::Unmerged,
            'R' => Self::Renamed,
            'C' => Self::Copied,
            _ => Self::Unknown,
        }
    }

    /// Returns the status character used in short format
    #[must_use]
    pub const fn short_char(&self) -> char {
        match self {
            Self::Clean => ' ',
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Untracked => '?',
            Self::Unmerged => 'U',
            Self::Renamed => 'R',
            Self::Copied => 'C',
            Self::Unknown => 'X',
            Self::Error => 'E',
        }
    }

    /// Returns the colored status character
    #[must_use]
    pub fn colored_char(&self) -> String {
        match self {
            Self::Clean => " ".to_string(),
            Self::Added => "A".green().to_string(),
            Self::Modified => "M".yellow().to_string(),
            Self::Deleted => "D".red().to_string(),
            Self::Untracked => "?".bright_black().to_string(),
            Self::Unmerged => "U".red().bold().to_string(),
            Self::Renamed => "R".cyan().to_string(),
            Self::Copied => "C".cyan().to_string(),
            Self::Unknown => "X".bright_black().to_string(),
            Self::Error => "E".red().bold().to_string(),
        }
    }

    /// Returns the full status name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Untracked => "untracked",
            Self::Unmerged => "unmerged",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::Unknown => "unknown",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Two-character backend status plus its decoded index/worktree states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Raw two-character code as reported (or synthesized)
    pub raw_code: String,
    /// State of the staged/index side
    pub index_state: FileState,
    /// State of the working tree side
    pub worktree_state: FileState,
}

impl FileStatus {
    /// Decodes a porcelain XY code. Short inputs are padded with spaces.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let mut chars = code.chars();
        let index = chars.next().unwrap_or(' ');
        let worktree = chars.next().unwrap_or(' ');

        Self {
            raw_code: format!("{index}{worktree}"),
            index_state: FileState::from_porcelain(index),
            worktree_state: FileState::from_porcelain(worktree),
        }
    }

    /// Status for a file the backend reports no changes for.
    #[must_use]
    pub fn clean() -> Self {
        Self::from_code("  ")
    }

    /// Status for a file whose worktree copy was added relative to baseline.
    #[must_use]
    pub fn added() -> Self {
        Self {
            raw_code: " A".to_string(),
            index_state: FileState::Clean,
            worktree_state: FileState::Added,
        }
    }

    /// Status for a file whose worktree copy differs from baseline.
    #[must_use]
    pub fn modified() -> Self {
        Self::from_code(" M")
    }

    /// Status for a file with no baseline at all.
    #[must_use]
    pub fn untracked() -> Self {
        Self::from_code("??")
    }

    /// Degraded status when the backend query failed for this file.
    #[must_use]
    pub fn error() -> Self {
        Self {
            raw_code: "EE".to_string(),
            index_state: FileState::Error,
            worktree_state: FileState::Error,
        }
    }

    /// True when neither side carries a change.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.index_state == FileState::Clean && self.worktree_state == FileState::Clean
    }
}

/// Line-level change statistics from a unified diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    /// Lines added
    pub additions: u32,
    /// Lines removed
    pub deletions: u32,
    /// Number of hunks
    pub chunks: u32,
}

impl DiffStat {
    /// Stat with the given counts.
    #[must_use]
    pub const fn new(additions: u32, deletions: u32, chunks: u32) -> Self {
        Self {
            additions,
            deletions,
            chunks,
        }
    }

    /// True when no lines changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.additions == 0 && self.deletions == 0
    }
}

/// A file found by the discoverer, before any backend is known.
///
/// Converted into a [`FileRecord`] exactly once; the tracking kind cannot be
/// revised afterwards.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the analysis root
    pub relative_path: String,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Modification time, the source of truth for bucketing
    pub modified_at: DateTime<Local>,
    /// File size in bytes
    pub size_bytes: u64,
}

impl DiscoveredFile {
    /// Finalizes this file into a record by attaching the analysis result.
    #[must_use]
    pub fn into_record(self, tracking: TrackingKind, status: FileStatus, diff: DiffStat) -> FileRecord {
        FileRecord {
            relative_path: self.relative_path,
            absolute_path: self.absolute_path,
            modified_at: self.modified_at,
            size_bytes: self.size_bytes,
            tracking,
            status,
            diff,
        }
    }
}

/// One analyzed file: discovery metadata plus backend status and diff.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path relative to the analysis root
    pub relative_path: String,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Modification time, the source of truth for bucketing
    pub modified_at: DateTime<Local>,
    /// File size in bytes
    pub size_bytes: u64,
    /// Tracking backend, assigned once
    pub tracking: TrackingKind,
    /// Backend status
    pub status: FileStatus,
    /// Line-level change statistics
    pub diff: DiffStat,
}

impl FileRecord {
    /// True when the worktree side reports a change (or an error).
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.status.worktree_state != FileState::Clean
    }
}
