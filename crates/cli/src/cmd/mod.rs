//! CLI command implementations
//!
//! This module contains all command implementations for the guanka CLI.

pub mod clean;
pub mod hook_impl;
pub mod install;
pub mod list;
pub mod run;
pub mod sample;
pub mod validate;
