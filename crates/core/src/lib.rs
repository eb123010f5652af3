//! Core types and utilities for guanka
//!
//! This is the foundation crate that all other guanka crates depend on.
//! It provides:
//! - Base error types
//! - Platform detection
//!
//! This crate has no dependencies on other guanka crates.

pub mod error;
pub mod platform;

pub use error::{Error, Result};
