//! E-commerce search domain types and logic for TurboCommerce.
//!
//! This crate provides the types the storefront search layer exchanges with
//! the catalog API:
//!
//! - **Search**: raw and canonical filters, pagination, results, suggestions
//! - **Canonicalization**: stable request payloads and dedupe keys
//! - **Catalog**: category spec schemas that drive facet controls
//!
//! # Example
//!
//! ```rust
//! use turbo_commerce::prelude::*;
//!
//! let raw = RawFilters::default()
//!     .with_search("laptop")
//!     .with_min_price("500");
//! let pagination = PaginationState::new(12);
//!
//! let mode = SearchMode::infer(&raw);
//! let request = canonicalize(&raw, &pagination, mode).unwrap();
//!
//! assert_eq!(mode, SearchMode::Advanced);
//! assert_eq!(request.payload.min_price, Some(500.0));
//! assert!(request.payload.include_aggregations);
//! ```

pub mod error;

pub mod catalog;
pub mod search;

pub use error::CommerceError;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;

    // Catalog
    pub use crate::catalog::{CategorySpec, CategorySpecs, SpecField, SpecFieldKind};

    // Search
    pub use crate::search::{
        canonicalize, normalize_filters, AggregationBucket, Aggregations, CanonicalRequest,
        DedupeKey, EngineTelemetry, PageSizes, PaginationState, ProductSummary, ProductsResponse,
        RawFilters, SearchFilters, SearchMode, SearchResult, SpecMap, SpecValue, Suggestion,
        SuggestionsResponse,
    };
}
