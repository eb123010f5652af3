//! Progress indicators
//!
//! Spinners are drawn on stderr and stay hidden when it is not a terminal.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run `work` behind a spinner, clearing it afterwards
pub fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let spinner = create_spinner(message);
    let result = work();
    spinner.finish_and_clear();
    result
}
