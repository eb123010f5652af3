//! Logging configuration for guanka CLI
//!
//! Compact terminal output plus an optional file log, using tracing.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown
const TARGETS: [&str; 4] = ["guanka", "guanka_engine", "guanka_config", "guanka_core"];

fn default_directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logging system
///
/// Normal runs only show warnings, so hook output stays readable; `verbose`
/// lowers the level to debug. `RUST_LOG` overrides both.
///
/// ```ignore
/// init(false, None)?;
/// init(true, Some(Path::new("guanka.log")))?;
/// ```
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(level)))
        .context("Failed to create log filter")?;

    // Logs go to stderr: stdout carries hook results
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .compact()
        .with_ansi(true)
        .with_filter(env_filter);

    match log_file {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

            let file_filter = EnvFilter::try_new(default_directives("debug"))
                .context("Failed to create file log filter")?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .with_filter(file_filter);

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .context("Failed to install logger")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .try_init()
                .context("Failed to install logger")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_default_directives_cover_all_crates() {
        assert_eq!(
            default_directives("debug"),
            "guanka=debug,guanka_engine=debug,guanka_config=debug,guanka_core=debug"
        );
    }
}
