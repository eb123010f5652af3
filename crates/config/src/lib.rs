//! Configuration management for guanka
//!
//! This crate handles:
//! - The repository configuration file (`.guanka.toml`)
//! - Hook repository manifests (`.guanka-hooks.toml`)
//! - Stages and languages shared by both files
//! - Regex pattern compilation
//! - XDG cache directory lookup

pub mod config;
pub mod dirs;
pub mod language;
pub mod manifest;
pub mod patterns;
pub mod stage;

// Re-export error types from core
pub use guanka_core::{Error, Result};

// Re-export main types
pub use config::{CONFIG_FILE_NAME, Config, HookConfig, RepoConfig, RepoSource};
pub use dirs::{cache_dir, store_dir};
pub use language::Language;
pub use manifest::{HookDefinition, MANIFEST_FILE_NAME, Manifest};
pub use stage::Stage;
