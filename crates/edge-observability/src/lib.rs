//! Observability infrastructure for the TurboCommerce search layer.
//!
//! This crate provides:
//! - `init_logging` - `tracing` subscriber setup driven by `LoggingConfig`
//! - `SearchMetrics` - Counters for dispatch, dedupe, cancellation and cache behavior

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

pub use edge_core::LoggingConfig;
