//! Common types and utilities shared across pageindex.
//!
//! This module contains:
//! - Configuration constants and [`IndexConfig`]
//! - Error types

pub mod config;
pub mod error;

pub use config::IndexConfig;
pub use error::{Error, Result};
