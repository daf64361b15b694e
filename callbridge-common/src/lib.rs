//! # Callbridge Common Library
//!
//! Shared code for the callbridge gateway:
//! - Error types
//! - Configuration loading (TOML file + environment overrides)
//! - Bounded retry policy with injectable sleeper

pub mod config;
pub mod error;
pub mod retry;

pub use error::{Error, Result};
