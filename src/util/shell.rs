//! Shell output for the CLI.
//!
//! Commands report semantic statuses; the shell owns formatting,
//! alignment, and color detection. Long-running SDK installs get an
//! indicatif spinner so the terminal is not silent for minutes.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // In-progress statuses (cyan)
    Activating,
    Installing,
    Updating,
    Configuring,
    Building,
    Cleaning,
    Staging,
    Running,

    // Success statuses (green)
    Finished,

    // Warning status (yellow)
    Warning,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Activating => "Activating",
            Status::Installing => "Installing",
            Status::Updating => "Updating",
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Cleaning => "Cleaning",
            Status::Staging => "Staging",
            Status::Running => "Running",
            Status::Finished => "Finished",
            Status::Warning => "warning",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished => "\x1b[1;32m",
            Status::Warning => "\x1b[1;33m",
            _ => "\x1b[1;36m",
        }
    }
}

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only
    Quiet,
    /// Default: status messages
    #[default]
    Normal,
    /// --verbose: status messages plus debug logging elsewhere
    Verbose,
}

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    /// Create a new shell, detecting color support from the terminal.
    pub fn new(verbosity: Verbosity) -> Self {
        Shell {
            verbosity,
            use_color: io::stderr().is_terminal(),
        }
    }

    /// Create a shell with color forced on or off.
    pub fn with_color(verbosity: Verbosity, use_color: bool) -> Self {
        Shell {
            verbosity,
            use_color,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    /// Print a right-aligned status line, cargo style.
    pub fn status(&self, status: Status, message: impl AsRef<str>) {
        if self.is_quiet() {
            return;
        }

        let text = status.as_str();
        if self.use_color {
            eprintln!(
                "{}{:>12}\x1b[0m {}",
                status.color_code(),
                text,
                message.as_ref()
            );
        } else {
            eprintln!("{:>12} {}", text, message.as_ref());
        }
    }

    /// Print a warning line.
    pub fn warn(&self, message: impl AsRef<str>) {
        self.status(Status::Warning, message);
    }

    /// Start a spinner for a long-running step. Returns a disabled bar
    /// in quiet mode or when stderr is not a terminal.
    pub fn spinner(&self, message: impl Into<String>) -> ProgressBar {
        if self.is_quiet() || !io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("static template is valid"),
        );
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal)
    }
}
