//! Theme and color definitions for console output

use owo_colors::Style;
use std::io::IsTerminal;

/// When to color output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Color when stdout is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl ColorChoice {
    /// Resolve to a yes/no decision for stdout
    #[must_use]
    pub fn enabled(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => {
                std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
        }
    }
}

/// Console theme with predefined styles
///
/// A theme built without color uses plain styles everywhere.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    // Hook status
    pub passed: Style,
    pub failed: Style,
    pub skipped: Style,
    pub disabled: Style,

    // General text
    pub heading: Style,
    pub name: Style,
    pub dim: Style,
    pub warning: Style,
}

impl Theme {
    /// Create a theme, colored or plain
    #[must_use]
    pub fn new(color: bool) -> Self {
        if !color {
            return Self::plain();
        }
        Self {
            passed: Style::new().black().on_green(),
            failed: Style::new().black().on_red(),
            skipped: Style::new().black().on_cyan(),
            disabled: Style::new().black().on_yellow(),

            heading: Style::new().bold(),
            name: Style::new().cyan(),
            dim: Style::new().dimmed(),
            warning: Style::new().yellow(),
        }
    }

    /// Theme without any styling
    #[must_use]
    pub fn plain() -> Self {
        Self {
            passed: Style::new(),
            failed: Style::new(),
            skipped: Style::new(),
            disabled: Style::new(),
            heading: Style::new(),
            name: Style::new(),
            dim: Style::new(),
            warning: Style::new(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ColorChoice::Auto.enabled())
    }
}
