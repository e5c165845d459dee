//! reqwest-backed catalog client.

use std::sync::Arc;

use async_trait::async_trait;
use edge_core::ApiConfig;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use turbo_commerce::catalog::{CategorySpec, CategorySpecs};
use turbo_commerce::search::{ProductsResponse, SearchFilters, SuggestionsResponse};

use crate::backend::CatalogBackend;
use crate::credentials::{CredentialProvider, NoCredentials};
use crate::endpoint::EndpointCategory;
use crate::timeout::TimeoutConfig;

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Unauthorized: {url}")]
    Unauthorized { url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),
}

impl FetchError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            FetchError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else if e.is_decode() {
            FetchError::Deserialization(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

impl From<turbo_commerce::CommerceError> for FetchError {
    fn from(e: turbo_commerce::CommerceError) -> Self {
        FetchError::Request(e.to_string())
    }
}

/// Catalog API client over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpBackend {
    /// Create a client from API settings.
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        Self::with_timeouts(&config.base_url, TimeoutConfig::from(config))
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(base_url: &str, timeouts: TimeoutConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.total)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Arc::new(NoCredentials),
        })
    }

    /// Attach a credential provider.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint.
    pub fn url_for(&self, category: EndpointCategory, scope: Option<&str>) -> String {
        format!("{}{}", self.base_url, category.scoped_path(scope))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        category: EndpointCategory,
        url: String,
        query: &[(String, String)],
    ) -> Result<T, FetchError> {
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = self.credentials.bearer_token() {
            request = request.bearer_auth(token);
        }

        tracing::debug!(category = %category, url = %url, params = query.len(), "catalog request");

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(category = %category, url = %url, "catalog request unauthorized");
            self.credentials.on_unauthorized();
            return Err(FetchError::Unauthorized { url });
        }
        if !status.is_success() {
            tracing::warn!(category = %category, url = %url, status = status.as_u16(), "catalog request failed");
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Deserialization(e.to_string()))
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogBackend for HttpBackend {
    async fn list_products(&self, filters: &SearchFilters) -> Result<ProductsResponse, FetchError> {
        let category = EndpointCategory::Listing;
        self.get_json(category, self.url_for(category, None), &filters.to_query_pairs()?)
            .await
    }

    async fn advanced_search(
        &self,
        filters: &SearchFilters,
    ) -> Result<ProductsResponse, FetchError> {
        let category = EndpointCategory::AdvancedSearch;
        self.get_json(category, self.url_for(category, None), &filters.to_query_pairs()?)
            .await
    }

    async fn suggestions(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<SuggestionsResponse, FetchError> {
        let endpoint = EndpointCategory::Suggestions;
        let mut params = vec![("query".to_string(), query.to_string())];
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            params.push(("category".to_string(), category.to_string()));
        }
        self.get_json(endpoint, self.url_for(endpoint, None), &params)
            .await
    }

    async fn category_specs(&self) -> Result<CategorySpecs, FetchError> {
        let endpoint = EndpointCategory::CategorySpecs;
        self.get_json(endpoint, self.url_for(endpoint, None), &[])
            .await
    }

    async fn category_spec(&self, category: &str) -> Result<CategorySpec, FetchError> {
        let endpoint = EndpointCategory::CategorySpecs;
        let mut spec: CategorySpec = self
            .get_json(endpoint, self.url_for(endpoint, Some(category)), &[])
            .await?;
        if spec.category.is_empty() {
            spec.category = category.to_string();
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building_trims_trailing_slash() {
        let backend =
            HttpBackend::with_timeouts("http://localhost:5000/api/", TimeoutConfig::default())
                .unwrap();
        assert_eq!(backend.base_url(), "http://localhost:5000/api");
        assert_eq!(
            backend.url_for(EndpointCategory::AdvancedSearch, None),
            "http://localhost:5000/api/products/search/advanced"
        );
        assert_eq!(
            backend.url_for(EndpointCategory::CategorySpecs, Some("laptops")),
            "http://localhost:5000/api/products/categories/laptops/specs"
        );
    }

    #[test]
    fn test_status_accessor() {
        let err = FetchError::Http {
            status: 503,
            url: "u".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(FetchError::Unauthorized { url: "u".into() }.status(), Some(401));
        assert_eq!(FetchError::Timeout("t".into()).status(), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_connection_error() {
        let backend = HttpBackend::with_timeouts(
            "http://127.0.0.1:9",
            TimeoutConfig::from_total(std::time::Duration::from_secs(2)),
        )
        .unwrap();
        let err = backend
            .list_products(&SearchFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Connection(_) | FetchError::Request(_) | FetchError::Timeout(_)
        ));
        assert_eq!(err.status(), None);
    }
}
