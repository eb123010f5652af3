//! Console rendering of hook results
//!
//! One line per hook, `<name><dots><status>` padded to [`LINE_WIDTH`]
//! columns. Failed (and verbose) hooks are followed by details and the hook's
//! output verbatim.

use super::progress::create_spinner;
use super::theme::Theme;
use guanka_engine::hooks::{Hook, HookResult, HookStatus, ResultReporter, SkipReason};
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use std::cell::RefCell;
use std::fmt::Write;

/// Width of a status line
pub const LINE_WIDTH: usize = 79;

/// Number of dots between the name and the status, at least one
fn dot_count(name: &str, postfix: &str, status: &str, width: usize) -> usize {
    let used = name.chars().count() + postfix.chars().count() + status.chars().count();
    width.saturating_sub(used).max(1)
}

/// Render one result
#[must_use]
pub fn render(result: &HookResult, theme: &Theme) -> String {
    let (postfix, status, style) = match result.status {
        HookStatus::Passed => ("", "Passed", theme.passed),
        HookStatus::Failed => ("", "Failed", theme.failed),
        HookStatus::Skipped(reason @ SkipReason::NoFiles) => {
            (reason.message(), "Skipped", theme.skipped)
        }
        HookStatus::Skipped(reason @ SkipReason::Disabled) => {
            (reason.message(), "Skipped", theme.disabled)
        }
    };

    let dots = ".".repeat(dot_count(&result.name, postfix, status, LINE_WIDTH));
    let mut out = format!("{}{dots}{postfix}{}\n", result.name, status.style(style));

    let ran = !matches!(result.status, HookStatus::Skipped(_));
    if !(result.is_failed() || (ran && result.verbose)) {
        return out;
    }

    let _ = writeln!(out, "{}", format!("- hook id: {}", result.id).style(theme.dim));
    if result.verbose {
        let _ = writeln!(
            out,
            "{}",
            format!("- duration: {:.2}s", result.duration.as_secs_f64()).style(theme.dim)
        );
    }
    if let Some(code) = result.exit_code
        && code != 0
    {
        let _ = writeln!(out, "{}", format!("- exit code: {code}").style(theme.dim));
    }
    if result.files_modified {
        let _ = writeln!(
            out,
            "{}",
            "- files were modified by this hook".style(theme.dim)
        );
    }
    if !result.output.is_empty() {
        out.push('\n');
        out.push_str(&result.output);
        if !result.output.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Prints results to stdout as hooks finish
///
/// A spinner naming the running hook is shown on stderr meanwhile.
pub struct ConsoleReporter {
    theme: Theme,
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleReporter {
    /// Reporter using `theme`
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            spinner: RefCell::new(None),
        }
    }
}

impl ResultReporter for ConsoleReporter {
    fn hook_started(&self, hook: &Hook) {
        *self.spinner.borrow_mut() = Some(create_spinner(hook.name()));
    }

    fn report(&self, result: &HookResult) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
        print!("{}", render(result, &self.theme));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::time::Duration;

    fn result(status: HookStatus) -> HookResult {
        HookResult {
            id: "black".to_string(),
            name: "black".to_string(),
            status,
            exit_code: None,
            output: String::new(),
            files_modified: false,
            duration: Duration::from_millis(1500),
            verbose: false,
            timed_out: false,
        }
    }

    #[test]
    fn test_passed_line_is_padded() {
        let line = render(&result(HookStatus::Passed), &Theme::plain());
        assert_eq!(line.trim_end().chars().count(), LINE_WIDTH);
        assert!(line.starts_with("black..."));
        assert!(line.ends_with("Passed\n"));
    }

    #[test]
    fn test_skipped_no_files() {
        let line = render(
            &result(HookStatus::Skipped(SkipReason::NoFiles)),
            &Theme::plain(),
        );
        assert!(line.ends_with("(no files to check)Skipped\n"));
        assert_eq!(line.trim_end().chars().count(), LINE_WIDTH);
    }

    #[test]
    fn test_failed_shows_details_and_output() {
        let mut failed = result(HookStatus::Failed);
        failed.exit_code = Some(1);
        failed.files_modified = true;
        failed.output = "would reformat a.py".to_string();

        let text = render(&failed, &Theme::plain());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("Failed"));
        assert_eq!(lines[1], "- hook id: black");
        assert_eq!(lines[2], "- exit code: 1");
        assert_eq!(lines[3], "- files were modified by this hook");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "would reformat a.py");
    }

    #[test]
    fn test_verbose_pass_shows_output() {
        let mut passed = result(HookStatus::Passed);
        passed.verbose = true;
        passed.exit_code = Some(0);
        passed.output = "a.py\n".to_string();

        let text = render(&passed, &Theme::plain());
        assert!(text.contains("- duration: 1.50s"));
        assert!(!text.contains("exit code"));
        assert!(text.contains("\na.py\n"));
    }

    #[test]
    fn test_long_name_keeps_one_dot() {
        let mut long = result(HookStatus::Passed);
        long.name = "x".repeat(100);
        let line = render(&long, &Theme::plain());
        assert!(line.contains("x.Passed"));
    }
}
