//! Core types and configuration for the trade calendar system.
//!
//! This crate provides shared types used across all other crates:
//! - Normalized trade records and daily summaries
//! - Source configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, SourceConfig};
pub use error::{Error, Result};
pub use types::*;
