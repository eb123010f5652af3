//! Hook system
//!
//! ## Execution Model
//!
//! - Hooks run strictly one after another, in declaration order
//! - Files rejected by the global filter never reach any hook
//! - A failing hook stops the run when fail-fast applies (globally or per hook)
//!
//! ## Module Organization
//!
//! - `config`: Resolved hook structures (Hook, HookKind)
//! - `filter`: File selection (global and per hook)
//! - `resolve`: Configuration + manifests into resolved hooks
//! - `meta`: Built-in hooks of the `meta` repository
//! - `executor`: Sequential execution engine

pub mod config;
pub mod executor;
pub mod filter;
pub mod meta;
pub mod resolve;

// Re-export main types for convenience
pub use config::{Hook, HookKind};
pub use executor::{
    HookResult, HookRunner, HookRunnerBuilder, HookStatus, NoOpReporter, ResultReporter,
    RunRequest, RunSummary, SkipReason,
};
pub use filter::{Classifier, FileFilter};
pub use meta::MetaHook;
pub use resolve::HookResolver;
