//! Output formatting, styling, and verbosity control for the recap CLI.
//!
//! Messages go to stderr so the rendered report on stdout stays pipeable.
//! Warnings and errors are always shown; informational messages respect
//! quiet mode.

/// Report rendering
pub mod table;

use colored::{ColoredString, Colorize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Suppress informational messages, show only warnings and errors.
    Quiet = 0,
    /// Default verbosity level, show all standard messages.
    Normal = 1,
    /// Show verbose debug messages in addition to standard output.
    Verbose = 2,
}

/// Global verbosity setting (default: Normal).
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the global verbosity level for all output functions.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// True when stdout is an interactive terminal and color is not disabled.
#[must_use]
pub fn use_color() -> bool {
    use crossterm::tty::IsTty;

    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_tty()
}

/// Emits a styled message if the current verbosity reaches `at_least`.
fn emit(styled: ColoredString, at_least: Verbosity) {
    if get_verbosity() >= at_least {
        eprintln!("{styled}");
    }
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    emit(message.green(), Verbosity::Normal);
}

/// Prints an error message in bold red (always shown).
pub fn error(message: &str) {
    emit(message.red().bold(), Verbosity::Quiet);
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    emit(message.yellow().bold(), Verbosity::Quiet);
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    emit(message.dimmed(), Verbosity::Normal);
}

/// Prints a verbose debug message (only in verbose mode).
pub fn verbose(message: &str) {
    emit(message.dimmed(), Verbosity::Verbose);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_round_trip() {
        let levels = [Verbosity::Quiet, Verbosity::Normal, Verbosity::Verbose];
        for level in &levels {
            set_verbosity(*level);
            assert_eq!(get_verbosity(), *level);
        }
        set_verbosity(Verbosity::Normal);
    }
}
