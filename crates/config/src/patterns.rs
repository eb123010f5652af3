//! Regex patterns for file selection
//!
//! `files` and `exclude` are regular expressions searched (not anchored)
//! against repository-relative paths using `/` as separator.

use crate::{Error, Result};
use regex::Regex;

/// Default `files` pattern: matches every path
pub const MATCH_ALL: &str = "";

/// Default `exclude` pattern: matches only the empty path, i.e. nothing
pub const MATCH_NONE: &str = "^$";

/// Compile a pattern, naming its origin in the error message
///
/// # Errors
///
/// Returns `Error::Config` if the pattern is not a valid regex
pub fn compile(pattern: &str, origin: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::Config(format!("{origin}: invalid regex '{pattern}': {e}")))
}

/// Whether a pattern is one of the defaults that never filters anything out
#[must_use]
pub fn is_default_exclude(pattern: &str) -> bool {
    pattern == MATCH_NONE
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_match_all_matches_everything() {
        let re = compile(MATCH_ALL, "files").unwrap();
        assert!(re.is_match("src/main.py"));
        assert!(re.is_match(""));
    }

    #[test]
    fn test_match_none_matches_no_real_path() {
        let re = compile(MATCH_NONE, "exclude").unwrap();
        assert!(!re.is_match("src/main.py"));
    }

    #[test]
    fn test_search_semantics() {
        let re = compile(r"\.py$", "files").unwrap();
        assert!(re.is_match("pkg/module.py"));
        assert!(!re.is_match("pkg/module.pyc"));
    }

    #[test]
    fn test_invalid_pattern_names_origin() {
        let err = compile("(unclosed", "hook 'black' exclude").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("hook 'black' exclude"));
        assert!(msg.contains("(unclosed"));
    }
}
