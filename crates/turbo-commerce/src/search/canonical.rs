//! Canonical request building and dedupe keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::search::filter::{normalize_spec_map, RawFilters, SearchFilters};
use crate::search::pagination::PaginationState;

/// Which backend engine a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Plain product listing.
    Listing,
    /// Faceted/advanced search engine.
    Advanced,
}

impl SearchMode {
    /// Advanced whenever search text or any facet beyond page/size is set.
    pub fn infer(raw: &RawFilters) -> Self {
        Self::for_filters(&normalize_filters(raw))
    }

    /// Mode for already-normalized filters.
    pub fn for_filters(filters: &SearchFilters) -> Self {
        if filters.has_search_text() || filters.has_facets() {
            SearchMode::Advanced
        } else {
            SearchMode::Listing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Listing => "listing",
            SearchMode::Advanced => "advanced",
        }
    }

    /// The other mode.
    pub fn other(&self) -> Self {
        match self {
            SearchMode::Listing => SearchMode::Advanced,
            SearchMode::Advanced => SearchMode::Listing,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable string identifying a request for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupeKey(String);

impl DedupeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonical, ready-to-send request.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRequest {
    pub mode: SearchMode,
    pub payload: SearchFilters,
    pub key: DedupeKey,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Serialize)]
struct KeyParts<'a> {
    mode: SearchMode,
    filters: &'a SearchFilters,
    page: u32,
    #[serde(rename = "pageSize")]
    page_size: u32,
}

/// Normalize raw UI filters; pagination fields are left at zero.
///
/// Strings are trimmed and dropped when empty; price and rating inputs that
/// do not parse as finite numbers are dropped.
pub fn normalize_filters(raw: &RawFilters) -> SearchFilters {
    SearchFilters {
        search: non_empty(&raw.search),
        category: non_empty(&raw.category),
        brand: non_empty(&raw.brand),
        min_price: parse_number(&raw.min_price),
        max_price: parse_number(&raw.max_price),
        min_rating: parse_number(&raw.min_rating),
        in_stock: raw.in_stock,
        specifications: normalize_spec_map(&raw.specifications),
        category_specific: normalize_spec_map(&raw.category_specific),
        ..SearchFilters::default()
    }
}

/// Build the canonical payload and dedupe key for a request.
pub fn canonicalize(
    raw: &RawFilters,
    pagination: &PaginationState,
    mode: SearchMode,
) -> Result<CanonicalRequest, CommerceError> {
    let mut payload = normalize_filters(raw);
    payload.offset = pagination.offset();
    payload.limit = pagination.page_size();
    payload.include_aggregations = pagination.page() == 1;

    // serde_json maps are ordered, so the value prints with sorted keys
    let value = serde_json::to_value(KeyParts {
        mode,
        filters: &payload,
        page: pagination.page(),
        page_size: pagination.page_size(),
    })?;

    Ok(CanonicalRequest {
        mode,
        key: DedupeKey(value.to_string()),
        payload,
        page: pagination.page(),
        page_size: pagination.page_size(),
    })
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
