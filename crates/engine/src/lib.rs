//! # Guanka Engine
//!
//! Core library of the guanka hook orchestrator:
//!
//! - **Git**: Staged files, index listing, hook directory, revision checkout
//! - **Store**: Cache of hook repositories pinned at a revision
//! - **Tags**: File classification for `types` filters
//! - **Languages**: Isolated environments hooks run in
//! - **Hooks**: Resolution and sequential execution

pub mod git;
pub mod hooks;
pub mod languages;
pub mod state;
pub mod store;
pub mod tags;

// Re-export error types from core
pub use guanka_core::{Error, Result};

// Re-export commonly used types
pub use hooks::{Hook, HookResolver, HookRunner, RunRequest, RunSummary};
pub use languages::EnvironmentInstaller;
pub use store::Store;
