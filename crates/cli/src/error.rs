//! Error types for CLI commands
//!
//! Structured errors using thiserror; everything else travels as
//! `anyhow::Error` through [`CommandError::Other`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// One or more hooks failed
    #[error("{failed} of {total} hooks failed")]
    HooksFailed {
        /// Number of failed hooks
        failed: usize,
        /// Number of hooks that were selected for the run
        total: usize,
    },

    /// Not inside a git work tree
    #[error("Not a git repository: {}", .0.display())]
    NotAGitRepository(PathBuf),

    /// The index has unresolved merge conflicts
    #[error("Unmerged files. Resolve before committing.")]
    UnmergedPaths,

    /// A stage needs an argument that was not given
    #[error("Stage '{stage}' requires {what}")]
    MissingStageInput {
        /// Stage being run
        stage: String,
        /// What is missing
        what: &'static str,
    },

    /// One or more files failed validation
    #[error("{invalid} of {total} files are invalid")]
    ValidationFailed {
        /// Number of invalid files
        invalid: usize,
        /// Number of files checked
        total: usize,
    },

    /// A git hook script not written by guanka is in the way
    #[error("{} exists and was not installed by guanka (use --overwrite)", .0.display())]
    ForeignHook(PathBuf),

    /// Engine or configuration error
    #[error(transparent)]
    Core(#[from] guanka_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_hooks_failed_message() {
        let err = CommandError::HooksFailed {
            failed: 2,
            total: 5,
        };
        assert_eq!(err.to_string(), "2 of 5 hooks failed");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: CommandError = guanka_core::Error::Git("boom".to_string()).into();
        assert_eq!(err.to_string(), "Git error: boom");
    }

    #[test]
    fn test_missing_stage_input() {
        let err = CommandError::MissingStageInput {
            stage: "commit-msg".to_string(),
            what: "--commit-msg-filename",
        };
        assert!(err.to_string().contains("commit-msg"));
    }
}
