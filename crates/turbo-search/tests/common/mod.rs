#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use edge_data::{CatalogBackend, FetchError};
use parking_lot::Mutex;
use turbo_commerce::catalog::{CategorySpec, CategorySpecs};
use turbo_commerce::search::{
    ProductSummary, ProductsResponse, SearchFilters, SearchMode, Suggestion, SuggestionsResponse,
};

pub const TOTAL: u64 = 100;

/// A request that reached the "network".
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search(SearchMode, SearchFilters),
    Suggestions(String, Option<String>),
    Specs(Option<String>),
}

/// In-memory catalog that records calls and can be slowed down or broken.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    delay: Mutex<Duration>,
    search_delays: Mutex<HashMap<String, Duration>>,
    failures: AtomicUsize,
    timed_out: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = delay;
        self
    }

    /// Delay responses for one search text.
    pub fn delay_search(&self, search: &str, delay: Duration) {
        self.search_delays.lock().insert(search.to_string(), delay);
    }

    /// Fail the next `n` calls with a 503.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Flag advanced responses as engine timeouts.
    pub fn set_timed_out(&self, timed_out: bool) {
        self.timed_out.store(timed_out, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn searches(&self, mode: SearchMode) -> Vec<SearchFilters> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Search(m, filters) if *m == mode => Some(filters.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn listing_calls(&self) -> usize {
        self.searches(SearchMode::Listing).len()
    }

    pub fn advanced_calls(&self) -> usize {
        self.searches(SearchMode::Advanced).len()
    }

    pub fn suggestion_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::Suggestions(..)))
            .count()
    }

    async fn respond(&self, call: Call, search: Option<&str>) -> Result<(), FetchError> {
        self.calls.lock().push(call);

        let delay = search
            .and_then(|s| self.search_delays.lock().get(s).copied())
            .unwrap_or(*self.delay.lock());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FetchError::Http {
                status: 503,
                url: "mock".into(),
            });
        }
        Ok(())
    }

    fn products(&self, mode: SearchMode, filters: &SearchFilters) -> ProductsResponse {
        let start = u64::from(filters.offset);
        let end = (start + u64::from(filters.limit)).min(TOTAL);
        let tag = filters.search.clone().unwrap_or_else(|| mode.to_string());
        let products = (start..end)
            .map(|i| ProductSummary {
                id: format!("{tag}-{i}"),
                name: format!("{tag} #{i}"),
                price: 10.0 + i as f64,
                ..Default::default()
            })
            .collect();

        ProductsResponse {
            products,
            total: Some(TOTAL),
            offset: Some(filters.offset),
            limit: Some(filters.limit),
            use_elastic: Some(mode == SearchMode::Advanced),
            es_took: (mode == SearchMode::Advanced).then_some(12),
            es_timed_out: Some(mode == SearchMode::Advanced && self.timed_out.load(Ordering::SeqCst)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CatalogBackend for MockBackend {
    async fn list_products(&self, filters: &SearchFilters) -> Result<ProductsResponse, FetchError> {
        self.respond(
            Call::Search(SearchMode::Listing, filters.clone()),
            filters.search.as_deref(),
        )
        .await?;
        Ok(self.products(SearchMode::Listing, filters))
    }

    async fn advanced_search(
        &self,
        filters: &SearchFilters,
    ) -> Result<ProductsResponse, FetchError> {
        self.respond(
            Call::Search(SearchMode::Advanced, filters.clone()),
            filters.search.as_deref(),
        )
        .await?;
        Ok(self.products(SearchMode::Advanced, filters))
    }

    async fn suggestions(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<SuggestionsResponse, FetchError> {
        self.respond(
            Call::Suggestions(query.to_string(), category.map(str::to_string)),
            Some(query),
        )
        .await?;
        Ok(SuggestionsResponse {
            suggestions: vec![
                Suggestion::new(format!("{query} pro")),
                Suggestion::new(format!("{query} air")).with_brand("Acme"),
            ],
        })
    }

    async fn category_specs(&self) -> Result<CategorySpecs, FetchError> {
        self.respond(Call::Specs(None), None).await?;
        Ok(CategorySpecs::default())
    }

    async fn category_spec(&self, category: &str) -> Result<CategorySpec, FetchError> {
        self.respond(Call::Specs(Some(category.to_string())), None)
            .await?;
        Ok(CategorySpec {
            category: category.to_string(),
            ..Default::default()
        })
    }
}
