//! Endpoint categories for request bookkeeping.

use turbo_commerce::search::SearchMode;

/// Logical catalog endpoints.
///
/// At most one request per category is live at a time; a newer request in
/// the same category supersedes the older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointCategory {
    /// Plain product listing.
    Listing,
    /// Advanced/faceted search engine.
    AdvancedSearch,
    /// Autocomplete suggestions.
    Suggestions,
    /// Category facet schemas.
    CategorySpecs,
}

impl EndpointCategory {
    /// Every category, in a stable order.
    pub const ALL: [EndpointCategory; 4] = [
        Self::Listing,
        Self::AdvancedSearch,
        Self::Suggestions,
        Self::CategorySpecs,
    ];

    /// The category serving a search mode.
    pub fn for_mode(mode: SearchMode) -> Self {
        match mode {
            SearchMode::Listing => Self::Listing,
            SearchMode::Advanced => Self::AdvancedSearch,
        }
    }

    /// Path relative to the API base URL. Category specs take an optional
    /// category scope, see [`EndpointCategory::scoped_path`].
    pub fn path(&self) -> &'static str {
        match self {
            Self::Listing => "/products",
            Self::AdvancedSearch => "/products/search/advanced",
            Self::Suggestions => "/products/search/suggestions",
            Self::CategorySpecs => "/products/categories/specs",
        }
    }

    /// Path with an optional scope segment (only meaningful for category specs).
    pub fn scoped_path(&self, scope: Option<&str>) -> String {
        match (self, scope) {
            (Self::CategorySpecs, Some(category)) if !category.is_empty() => {
                format!("/products/categories/{}/specs", urlencoding::encode(category))
            }
            _ => self.path().to_string(),
        }
    }

    /// Whether this category returns product results.
    pub fn is_search(&self) -> bool {
        matches!(self, Self::Listing | Self::AdvancedSearch)
    }

    /// Get the name of this category.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::AdvancedSearch => "advanced",
            Self::Suggestions => "suggestions",
            Self::CategorySpecs => "category_specs",
        }
    }
}

impl std::fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
