//! Shared utilities for chronicle.
//!
//! This crate provides common utilities used across the chronicle workspace:
//! - Logging setup with tracing
//! - Repository-relative path normalization

pub mod log;
pub mod path;

pub use path::{normalize, PathError};
