//! Base error types for guanka
//!
//! Every library crate returns [`Error`]. Hook failures are not errors: a hook
//! that exits non-zero produces a failed result, while an `Error` means the
//! orchestrator itself could not do its job (bad config, clone failure, ...).

use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is missing
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid hook repository manifest
    #[error("Invalid manifest for {repo}: {message}")]
    Manifest {
        /// Repository the manifest belongs to
        repo: String,
        /// What is wrong with it
        message: String,
    },

    /// Declared hook id does not exist in the repository manifest
    #[error("Hook '{id}' is not provided by {repo}")]
    HookNotFound {
        /// Repository that was searched
        repo: String,
        /// Missing hook id
        id: String,
    },

    /// Git operation error
    #[error("Git error: {0}")]
    Git(String),

    /// Repository store error
    #[error("Store error: {0}")]
    Store(String),

    /// Language environment could not be prepared
    #[error("Failed to prepare {language} environment: {message}")]
    Environment {
        /// Language of the environment
        language: String,
        /// What went wrong
        message: String,
    },

    /// State persistence error
    #[error("State error: {0}")]
    State(String),

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
