//! Shared utilities for sentencify.
//!
//! This crate provides common utilities used across the sentencify workspace:
//! - Logging setup with tracing
//! - Path utilities for config and data directories
//! - JSONC comment stripping for config files

pub mod jsonc;
pub mod log;
pub mod path;

pub use log::{LogConfig, LogLevel};
