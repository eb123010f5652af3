//! XDG directory utilities
//!
//! Cloned hook repositories and language environments live under a single
//! cache directory:
//! - `$GUANKA_HOME` when set
//! - otherwise `$XDG_CACHE_HOME/guanka` (defaults to `~/.cache/guanka`)

use std::ffi::OsString;
use std::path::PathBuf;
use xdg::BaseDirectories;

/// Environment variable overriding the cache directory
pub const HOME_ENV: &str = "GUANKA_HOME";

/// Get the guanka cache directory
///
/// Returns `$GUANKA_HOME`, `$XDG_CACHE_HOME/guanka` or `~/.cache/guanka`
#[must_use]
pub fn cache_dir() -> Option<PathBuf> {
    resolve_cache_dir(std::env::var_os(HOME_ENV))
}

/// Get the repository store directory
///
/// Same as [`cache_dir`]; kept separate so callers name what they need.
#[must_use]
pub fn store_dir() -> Option<PathBuf> {
    cache_dir()
}

fn resolve_cache_dir(home_override: Option<OsString>) -> Option<PathBuf> {
    match home_override {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => BaseDirectories::with_prefix("guanka").get_cache_home(),
    }
}
