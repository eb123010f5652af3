//! Terminal UI components for guanka
//!
//! - Hook result rendering
//! - Progress indicators
//! - Icons and themes

pub mod icons;
pub mod progress;
pub mod report;
pub mod theme;

pub use icons::{Icons, StatusIcon};
pub use progress::{create_spinner, with_spinner};
pub use report::{ConsoleReporter, LINE_WIDTH};
pub use theme::{ColorChoice, Theme};
