//! Core configuration for the TurboCommerce search layer.
//!
//! This crate provides:
//! - `SearchConfig` - Search surface configuration (API, debounce, suggestions, pagination, logging)
//! - `ConfigError` - Loading and validation failures

mod config;

pub use config::*;
