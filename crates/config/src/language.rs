//! Hook languages
//!
//! The language decides how a hook's `entry` is resolved and whether an
//! isolated environment has to be built before the hook can run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language a hook is implemented in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Entry is a program found on `PATH`
    System,
    /// Entry is a script path relative to the hook repository
    Script,
    /// Entry runs inside a dedicated virtualenv
    Python,
    /// Always fails, printing the entry and the matched files
    Fail,
}

impl Language {
    /// Lowercase name as used in configuration files
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Language::System => "system",
            Language::Script => "script",
            Language::Python => "python",
            Language::Fail => "fail",
        }
    }

    /// Whether `additional_dependencies` can be installed for this language
    #[must_use]
    pub fn supports_dependencies(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Whether an environment must be installed before running
    #[must_use]
    pub fn needs_environment(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
