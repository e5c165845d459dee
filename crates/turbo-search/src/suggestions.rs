//! Autocomplete with a time-boxed cache.

use std::sync::Arc;
use std::time::Duration;

use edge_cache::{CacheKey, TtlCache};
use edge_core::SuggestionConfig;
use edge_data::{CatalogBackend, EndpointCategory};
use edge_executor::{CancellationManager, DebounceOptions, Debouncer};
use edge_observability::SearchMetrics;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use turbo_commerce::search::Suggestion;

use crate::error::SearchError;

/// Suggestion lookups: short-query guard, cache, then one cancellable request.
pub struct SuggestionService {
    backend: Arc<dyn CatalogBackend>,
    cancellations: Arc<CancellationManager>,
    cache: Mutex<TtlCache<Vec<Suggestion>>>,
    min_chars: usize,
    metrics: Arc<SearchMetrics>,
}

impl SuggestionService {
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        cancellations: Arc<CancellationManager>,
        config: &SuggestionConfig,
        metrics: Arc<SearchMetrics>,
    ) -> Self {
        Self {
            backend,
            cancellations,
            cache: Mutex::new(TtlCache::new(config.ttl())),
            min_chars: config.min_query_chars,
            metrics,
        }
    }

    /// Cache lifetime.
    pub fn ttl(&self) -> Duration {
        self.cache.lock().ttl()
    }

    fn is_too_short(&self, query: &str) -> bool {
        query.chars().count() < self.min_chars
    }

    /// Answer without touching the network: empty for short queries, the
    /// cached list for live entries, `None` otherwise.
    pub fn cached(&self, query: &str, category: Option<&str>) -> Option<Vec<Suggestion>> {
        let query = query.trim();
        if self.is_too_short(query) {
            return Some(Vec::new());
        }
        self.cache
            .lock()
            .get(&CacheKey::scoped(category, query), Instant::now())
            .cloned()
    }

    /// Suggestions for `query` within `category`.
    ///
    /// Returns `Ok(None)` when a newer lookup superseded this one.
    pub async fn get_suggestions(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<Option<Vec<Suggestion>>, SearchError> {
        let query = query.trim();
        if self.is_too_short(query) {
            return Ok(Some(Vec::new()));
        }

        let key = CacheKey::scoped(category, query);
        let hit = self.cache.lock().get(&key, Instant::now()).cloned();
        self.metrics.record_suggestion_lookup(hit.is_some());
        if let Some(hit) = hit {
            tracing::trace!(key = %key, "suggestion cache hit");
            return Ok(Some(hit));
        }

        let token = self.cancellations.begin_request(EndpointCategory::Suggestions);
        let category = category.filter(|c| !c.is_empty());
        let response = match token.run(self.backend.suggestions(query, category)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::debug!(key = %key, seq = token.seq(), "suggestion request superseded");
                return Ok(None);
            }
        };
        self.cancellations.finish(&token);

        let suggestions = response?.suggestions;
        self.cache
            .lock()
            .insert(key, suggestions.clone(), Instant::now());
        Ok(Some(suggestions))
    }

    /// Cancel the in-flight lookup, if any.
    pub fn cancel_pending(&self) -> bool {
        self.cancellations.cancel(EndpointCategory::Suggestions)
    }
}

impl std::fmt::Debug for SuggestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionService")
            .field("min_chars", &self.min_chars)
            .finish_non_exhaustive()
    }
}

/// Latest suggestions published by a [`SuggestionFeed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    pub error: Option<String>,
}

/// Debounces keystrokes into suggestion lookups and publishes the results.
pub struct SuggestionFeed {
    service: Arc<SuggestionService>,
    debouncer: Debouncer<(String, Option<String>)>,
    sender: Arc<watch::Sender<SuggestionState>>,
    receiver: watch::Receiver<SuggestionState>,
}

impl SuggestionFeed {
    /// Create a feed. Must be called within a Tokio runtime.
    pub fn new(service: Arc<SuggestionService>, wait: Duration) -> Self {
        let (sender, receiver) = watch::channel(SuggestionState::default());
        let sender = Arc::new(sender);

        let debouncer = {
            let service = service.clone();
            let sender = sender.clone();
            Debouncer::new(
                DebounceOptions::new(wait),
                move |(query, category): (String, Option<String>)| {
                    let service = service.clone();
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        match service.get_suggestions(&query, category.as_deref()).await {
                            Ok(Some(suggestions)) => {
                                sender.send_replace(SuggestionState {
                                    query,
                                    suggestions,
                                    error: None,
                                });
                            }
                            Ok(None) => {}
                            Err(e) => {
                                tracing::warn!(query = %query, error = %e, "suggestion lookup failed");
                                sender.send_replace(SuggestionState {
                                    query,
                                    suggestions: Vec::new(),
                                    error: Some(e.to_string()),
                                });
                            }
                        }
                    });
                },
            )
        };

        Self {
            service,
            debouncer,
            sender,
            receiver,
        }
    }

    /// Feed a keystroke. Cached answers are published immediately.
    pub fn input(&self, query: &str, category: Option<&str>) {
        if let Some(suggestions) = self.service.cached(query, category) {
            self.debouncer.cancel();
            self.service.cancel_pending();
            self.sender.send_replace(SuggestionState {
                query: query.trim().to_string(),
                suggestions,
                error: None,
            });
            return;
        }
        self.debouncer
            .call((query.to_string(), category.map(str::to_string)));
    }

    /// Subscribe to published suggestions.
    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.receiver.clone()
    }

    /// The most recently published state.
    pub fn latest(&self) -> SuggestionState {
        self.receiver.borrow().clone()
    }

    /// Drop pending input and the in-flight lookup.
    pub fn cancel(&self) {
        self.debouncer.cancel();
        self.service.cancel_pending();
    }
}

impl std::fmt::Debug for SuggestionFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionFeed")
            .field("pending", &self.debouncer.is_pending())
            .finish_non_exhaustive()
    }
}
