//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips the escapes when stdout is not
//! a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark used for completed steps
pub const CHECK: &str = "✓";

/// Cross used for failed steps
pub const CROSS: &str = "✗";

/// Semantic colors for CLI output
pub trait Stylize: Display {
    /// Secondary information
    fn muted(&self) -> String {
        self.to_string().dimmed().to_string()
    }

    /// Names and numbers worth spotting
    fn accent(&self) -> String {
        self.to_string().cyan().to_string()
    }

    /// Headings and verbs
    fn emphasis(&self) -> String {
        self.to_string().bold().to_string()
    }

    /// Successful outcomes
    fn success(&self) -> String {
        self.to_string().green().to_string()
    }

    /// Partial failures that need attention
    fn warn(&self) -> String {
        self.to_string().yellow().to_string()
    }

    /// Hard failures
    fn error(&self) -> String {
        self.to_string().red().bold().to_string()
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Red cross
pub fn cross() -> String {
    CROSS.error()
}

/// Muted arrow prefixing progress lines
pub fn arrow() -> String {
    "→".muted()
}

/// Spinner style for network-bound steps
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
}
