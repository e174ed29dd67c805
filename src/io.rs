//! Status output.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;

/// How much non-critical status output to produce.
#[derive(Clone)]
pub enum Verbosity {
    Quiet,
    Messages,
    Progress(ProgressStyle),
}

impl Verbosity {
    /// Creates a verbosity showing a progress bar with the default style.
    pub fn progress() -> Self {
        Self::Progress(
            ProgressStyle::default_bar()
                .template("{bar:40} {pos}/{len} seeds ({elapsed_precise})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        )
    }

    /// Whether status messages should be printed.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Creates a progress bar for the given number of steps, or a hidden
    /// bar if progress should not be shown.
    pub fn create_progress_bar(&self, len: u64) -> ProgressBar {
        match self {
            Self::Progress(style) => ProgressBar::new(len).with_style(style.clone()),
            _ => ProgressBar::hidden(),
        }
    }
}

impl fmt::Debug for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "Quiet"),
            Self::Messages => write!(f, "Messages"),
            Self::Progress(_) => write!(f, "Progress"),
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Quiet
    }
}
