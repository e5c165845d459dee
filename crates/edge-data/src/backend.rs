//! The catalog backend seam.

use async_trait::async_trait;
use turbo_commerce::catalog::{CategorySpec, CategorySpecs};
use turbo_commerce::search::{
    ProductsResponse, SearchFilters, SearchMode, SearchResult, SuggestionsResponse,
};

use crate::client::FetchError;

/// Everything the search layer asks of the catalog API.
///
/// [`HttpBackend`](crate::HttpBackend) talks to the real service; tests plug
/// in their own implementation.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// `GET /products` with canonical filters as query parameters.
    async fn list_products(&self, filters: &SearchFilters) -> Result<ProductsResponse, FetchError>;

    /// `GET /products/search/advanced` with canonical filters as query parameters.
    async fn advanced_search(
        &self,
        filters: &SearchFilters,
    ) -> Result<ProductsResponse, FetchError>;

    /// `GET /products/search/suggestions?query=&category=`.
    async fn suggestions(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<SuggestionsResponse, FetchError>;

    /// `GET /products/categories/specs`.
    async fn category_specs(&self) -> Result<CategorySpecs, FetchError>;

    /// `GET /products/categories/:category/specs`.
    async fn category_spec(&self, category: &str) -> Result<CategorySpec, FetchError>;

    /// Run a search in `mode` and normalize the response.
    async fn search(
        &self,
        mode: SearchMode,
        filters: &SearchFilters,
    ) -> Result<SearchResult, FetchError> {
        let response = match mode {
            SearchMode::Listing => self.list_products(filters).await?,
            SearchMode::Advanced => self.advanced_search(filters).await?,
        };
        Ok(response.into_result(filters))
    }
}
