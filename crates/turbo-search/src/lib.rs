//! Search-and-filter orchestration for TurboCommerce storefronts.
//!
//! Turns continuous user input into a minimal, de-duplicated, cancellable
//! stream of catalog requests:
//!
//! - **Orchestrator**: filter/page state machine, dedupe, mode selection
//! - **Result store**: latest results with per-mode loading and error state
//! - **URL sync**: one-time hydration and history-replacing writes
//! - **Suggestions**: short-query guard, TTL cache, debounced feed
//! - **Surface**: tokio driver wiring the above to a backend and a history
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use edge_core::SearchConfig;
//! use edge_data::HttpBackend;
//! use turbo_search::{MemoryHistory, SearchPhase, SearchSurface};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SearchConfig::default();
//! let backend = Arc::new(HttpBackend::new(&config.api)?);
//! let history = Arc::new(MemoryHistory::with_query("search=laptop"));
//!
//! let surface = SearchSurface::mount(&config, backend, history);
//! let snapshot = surface
//!     .wait_until(|s| matches!(s.phase, SearchPhase::Settled(_)))
//!     .await;
//! println!("{} products", snapshot.map_or(0, |s| s.store.total()));
//! # Ok(())
//! # }
//! ```

mod error;
mod orchestrator;
mod store;
mod suggestions;
mod surface;
mod url_sync;

pub use error::SearchError;
pub use orchestrator::{Dispatch, SearchOrchestrator, SearchPhase, Settlement};
pub use store::{ModeStatus, ResultStore};
pub use suggestions::{SuggestionFeed, SuggestionService, SuggestionState};
pub use surface::{SearchSurface, SurfaceOptions, SurfaceSnapshot};
pub use url_sync::{decode_query, encode_query, query_key, History, MemoryHistory, UrlState, UrlStateSync};
