//! Search module.
//!
//! Contains raw and canonical filters, pagination, canonicalization,
//! results and suggestions.

mod canonical;
mod filter;
mod pagination;
mod results;
mod suggestion;

pub use canonical::{canonicalize, normalize_filters, CanonicalRequest, DedupeKey, SearchMode};
pub use filter::{normalize_spec_map, RawFilters, SearchFilters, SpecMap, SpecValue};
pub use pagination::{PageSizes, PaginationState, LISTING_PAGE_SIZES, TABLE_PAGE_SIZES};
pub use results::{
    AggregationBucket, Aggregations, EngineTelemetry, ProductSummary, ProductsResponse,
    SearchResult,
};
pub use suggestion::{Suggestion, SuggestionsResponse};
