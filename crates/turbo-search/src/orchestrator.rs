//! Search orchestrator state machine.

use std::sync::Arc;

use edge_data::{CatalogBackend, EndpointCategory};
use edge_executor::{CancellationManager, RequestToken};
use edge_observability::SearchMetrics;
use serde::Serialize;
use turbo_commerce::search::{
    canonicalize, CanonicalRequest, DedupeKey, PageSizes, PaginationState, RawFilters,
    SearchMode, SearchResult,
};

use crate::error::SearchError;
use crate::store::ResultStore;
use crate::url_sync::UrlState;

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    Success,
    Cancelled,
    Failed,
}

/// Where a search surface is in its request cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    #[default]
    Idle,
    /// Input changed; waiting for it to settle.
    Debouncing,
    /// A request is in flight.
    Dispatched,
    Settled(Settlement),
}

/// A request the orchestrator accepted. The caller sends it and hands the
/// outcome back to [`SearchOrchestrator::settle`].
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub token: RequestToken,
    pub request: CanonicalRequest,
    /// Follow-up batch whose items are appended.
    pub append: bool,
}

impl Dispatch {
    /// Send the request, racing it against cancellation.
    pub async fn execute(&self, backend: &dyn CatalogBackend) -> Result<SearchResult, SearchError> {
        let result = self
            .token
            .run(backend.search(self.request.mode, &self.request.payload))
            .await??;
        Ok(result)
    }

    /// Pagination this request was built from.
    pub fn pagination(&self) -> PaginationState {
        PaginationState::at(self.request.page, self.request.page_size)
    }
}

#[derive(Debug)]
struct InFlight {
    token: RequestToken,
    mode: SearchMode,
    append: bool,
    page_size: u32,
}

/// Owns filter and pagination state for one search surface and decides
/// which requests reach the network.
///
/// Setters only record intent and move to [`SearchPhase::Debouncing`];
/// [`prepare`](Self::prepare) turns the current state into at most one
/// [`Dispatch`], and [`settle`](Self::settle) applies its outcome.
#[derive(Debug)]
pub struct SearchOrchestrator {
    filters: RawFilters,
    pagination: PaginationState,
    page_sizes: PageSizes,
    phase: SearchPhase,
    last_key: Option<DedupeKey>,
    last_request: Option<CanonicalRequest>,
    in_flight: Option<InFlight>,
    settlements: u64,
    store: ResultStore,
    cancellations: Arc<CancellationManager>,
    metrics: Arc<SearchMetrics>,
}

impl SearchOrchestrator {
    /// Create an orchestrator at page 1 with the default page size.
    pub fn new(
        page_sizes: PageSizes,
        cancellations: Arc<CancellationManager>,
        metrics: Arc<SearchMetrics>,
    ) -> Self {
        let pagination = page_sizes.initial_state();
        Self {
            filters: RawFilters::default(),
            pagination,
            store: ResultStore::new(pagination.page_size()),
            page_sizes,
            phase: SearchPhase::Idle,
            last_key: None,
            last_request: None,
            in_flight: None,
            settlements: 0,
            cancellations,
            metrics,
        }
    }

    pub fn filters(&self) -> &RawFilters {
        &self.filters
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn page_sizes(&self) -> &PageSizes {
        &self.page_sizes
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Key of the last accepted dispatch.
    pub fn last_key(&self) -> Option<&DedupeKey> {
        self.last_key.as_ref()
    }

    /// Number of requests that have settled, in any way.
    pub fn settlements(&self) -> u64 {
        self.settlements
    }

    /// Mode the current filters select.
    pub fn mode(&self) -> SearchMode {
        SearchMode::infer(&self.filters)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Adopt state read from the URL. Page sizes outside the allowed set
    /// fall back to the default.
    pub fn hydrate(&mut self, state: UrlState) {
        let size = if self.page_sizes.contains(state.pagination.page_size()) {
            state.pagination.page_size()
        } else {
            self.page_sizes.default_size()
        };
        self.filters = state.filters;
        self.pagination = PaginationState::at(state.pagination.page(), size);
        self.phase = SearchPhase::Debouncing;
    }

    /// Replace the filters. Any change resets to page 1.
    pub fn set_filters(&mut self, filters: RawFilters) -> bool {
        if filters == self.filters {
            return false;
        }
        self.filters = filters;
        self.pagination.reset();
        self.phase = SearchPhase::Debouncing;
        true
    }

    /// Edit the filters in place. Any change resets to page 1.
    pub fn update_filters(&mut self, edit: impl FnOnce(&mut RawFilters)) -> bool {
        let mut filters = self.filters.clone();
        edit(&mut filters);
        self.set_filters(filters)
    }

    /// Update the search box text.
    pub fn set_search_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update_filters(|f| f.search = text)
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        if !self.pagination.set_page(page) {
            return false;
        }
        self.phase = SearchPhase::Debouncing;
        true
    }

    /// Change the page size. Sizes outside the allowed set are ignored.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if !self.page_sizes.contains(page_size) {
            tracing::debug!(page_size, allowed = ?self.page_sizes.allowed(), "ignoring page size");
            return false;
        }
        if !self.pagination.set_page_size(page_size) {
            return false;
        }
        self.phase = SearchPhase::Debouncing;
        true
    }

    /// Reset every filter and clear the results in one step. The next
    /// dispatch is a plain listing. The emptied store always gets refilled,
    /// even when the filters were already at their defaults.
    pub fn clear_search(&mut self) -> bool {
        let changed = self.set_filters(RawFilters::default());
        self.pagination.reset();
        self.store.clear();
        self.last_key = None;
        self.phase = SearchPhase::Debouncing;
        changed
    }

    /// Turn the current state into a request, unless it repeats the last one.
    pub fn prepare(&mut self) -> Result<Option<Dispatch>, SearchError> {
        let mode = self.mode();
        let request = canonicalize(&self.filters, &self.pagination, mode)?;

        if self.last_key.as_ref() == Some(&request.key) {
            self.metrics.record_dedupe();
            tracing::debug!(mode = %mode, key = %request.key, "identical request suppressed");
            self.phase = if self.in_flight.is_some() {
                SearchPhase::Dispatched
            } else {
                SearchPhase::Idle
            };
            return Ok(None);
        }

        let other = mode.other();
        if self.cancellations.cancel(EndpointCategory::for_mode(other)) {
            self.metrics.record_superseded(1);
            self.store.set_loading(other, false);
        }
        if self.store.result_mode().is_some_and(|m| m != mode) {
            self.store.clear();
        }

        let category = EndpointCategory::for_mode(mode);
        if self.cancellations.in_flight(category) {
            self.metrics.record_superseded(1);
        }
        let token = self.cancellations.begin_request(category);

        tracing::info!(
            mode = %mode,
            seq = token.seq(),
            page = request.page,
            page_size = request.page_size,
            key = %request.key,
            "dispatching search"
        );

        self.store.begin(mode);
        self.metrics.record_dispatch();
        self.last_key = Some(request.key.clone());
        self.last_request = Some(request.clone());
        self.in_flight = Some(InFlight {
            token: token.clone(),
            mode,
            append: false,
            page_size: request.page_size,
        });
        self.phase = SearchPhase::Dispatched;

        Ok(Some(Dispatch {
            token,
            request,
            append: false,
        }))
    }

    /// Request the batch after the current result. Uses the backend's cursor
    /// when it gave one, the next offset otherwise. Leaves the dedupe key alone.
    pub fn prepare_next_page(&mut self) -> Option<Dispatch> {
        if self.in_flight.is_some() {
            return None;
        }
        let result = self.store.result().filter(|r| r.has_more)?;
        let last = self.last_request.as_ref()?;
        if self.store.result_mode() != Some(last.mode) {
            return None;
        }

        let mut request = last.clone();
        match &result.next_cursor {
            Some(cursor) => request.payload.cursor = Some(cursor.clone()),
            None => {
                request.payload.cursor = None;
                request.payload.offset = result.offset.saturating_add(result.len() as u32);
            }
        }
        request.payload.include_aggregations = false;

        let mode = request.mode;
        let token = self
            .cancellations
            .begin_request(EndpointCategory::for_mode(mode));

        tracing::info!(
            mode = %mode,
            seq = token.seq(),
            offset = request.payload.offset,
            cursor = request.payload.cursor.as_deref().unwrap_or(""),
            "loading next batch"
        );

        self.store.set_loading(mode, true);
        self.metrics.record_dispatch();
        self.in_flight = Some(InFlight {
            token: token.clone(),
            mode,
            append: true,
            page_size: request.page_size,
        });
        self.phase = SearchPhase::Dispatched;

        Some(Dispatch {
            token,
            request,
            append: true,
        })
    }

    /// Apply the outcome of a dispatch. Returns `None` when the outcome
    /// belongs to a superseded request and was discarded.
    pub fn settle(
        &mut self,
        token: &RequestToken,
        outcome: Result<SearchResult, SearchError>,
    ) -> Option<Settlement> {
        let ours = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.token.seq() == token.seq());
        if !ours {
            tracing::debug!(seq = token.seq(), category = %token.category(), "discarding stale response");
            return None;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return None;
        };
        self.settlements += 1;

        let live = self.cancellations.finish(token) && !token.is_cancelled();
        let settlement = match outcome {
            Err(SearchError::Cancelled) => Settlement::Cancelled,
            _ if !live => Settlement::Cancelled,
            Ok(result) => {
                if result.telemetry.is_degraded() {
                    self.metrics.record_degraded();
                    tracing::warn!(
                        mode = %in_flight.mode,
                        timed_out = result.telemetry.timed_out,
                        fallback = result.telemetry.fallback_used,
                        took_ms = result.telemetry.took_ms,
                        "degraded search response"
                    );
                }
                tracing::debug!(
                    mode = %in_flight.mode,
                    seq = token.seq(),
                    items = result.len(),
                    total = result.total,
                    "search settled"
                );
                self.store
                    .apply(in_flight.mode, result, in_flight.append, in_flight.page_size);
                Settlement::Success
            }
            Err(e) => {
                self.metrics.record_failure();
                tracing::warn!(mode = %in_flight.mode, seq = token.seq(), error = %e, "search failed");
                self.store.fail(in_flight.mode, e.to_string());
                if !in_flight.append {
                    // let a retry of the same request through
                    self.last_key = None;
                }
                Settlement::Failed
            }
        };

        if settlement == Settlement::Cancelled {
            self.store.set_loading(in_flight.mode, false);
        }
        self.phase = SearchPhase::Settled(settlement);
        Some(settlement)
    }

    /// Cancel everything in flight. Returns how many requests were cancelled.
    pub fn teardown(&mut self) -> usize {
        let cancelled = self.cancellations.cancel_all();
        if let Some(in_flight) = self.in_flight.take() {
            self.store.set_loading(in_flight.mode, false);
            self.phase = SearchPhase::Settled(Settlement::Cancelled);
        } else {
            self.phase = SearchPhase::Idle;
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_data::FetchError;
    use pretty_assertions::assert_eq;
    use turbo_commerce::search::{EngineTelemetry, ProductSummary};

    fn orchestrator() -> SearchOrchestrator {
        SearchOrchestrator::new(
            PageSizes::listing(),
            Arc::new(CancellationManager::new()),
            Arc::new(SearchMetrics::new()),
        )
    }

    fn result(ids: &[&str]) -> SearchResult {
        SearchResult {
            items: ids
                .iter()
                .map(|id| ProductSummary {
                    id: id.to_string(),
                    ..Default::default()
                })
                .collect(),
            total: 100,
            limit: 12,
            has_more: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_request_dispatches_once() {
        let mut orch = orchestrator();
        let first = orch.prepare().unwrap().unwrap();
        orch.settle(&first.token, Ok(result(&["a"])));

        assert!(orch.prepare().unwrap().is_none());
        assert_eq!(orch.phase(), SearchPhase::Idle);
        assert_eq!(orch.metrics.snapshot().dispatched, 1);
        assert_eq!(orch.metrics.snapshot().deduplicated, 1);
    }

    #[test]
    fn test_identical_request_in_flight_stays_dispatched() {
        let mut orch = orchestrator();
        orch.prepare().unwrap().unwrap();
        assert!(orch.prepare().unwrap().is_none());
        assert_eq!(orch.phase(), SearchPhase::Dispatched);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut orch = orchestrator();
        orch.set_page(3);
        assert_eq!(orch.pagination().offset(), 24);

        assert!(orch.update_filters(|f| f.category = "laptops".into()));
        assert_eq!(orch.phase(), SearchPhase::Debouncing);
        assert_eq!(orch.pagination().page(), 1);

        let dispatch = orch.prepare().unwrap().unwrap();
        assert_eq!(dispatch.request.payload.offset, 0);
        assert_eq!(dispatch.request.mode, SearchMode::Advanced);
    }

    #[test]
    fn test_unchanged_filters_are_not_a_change() {
        let mut orch = orchestrator();
        assert!(!orch.set_filters(RawFilters::default()));
        assert_eq!(orch.phase(), SearchPhase::Idle);
    }

    #[test]
    fn test_invalid_page_size_is_ignored() {
        let mut orch = orchestrator();
        orch.set_page(2);
        assert!(!orch.set_page_size(7));
        assert_eq!(orch.pagination(), PaginationState::at(2, 12));

        assert!(orch.set_page_size(24));
        assert_eq!(orch.pagination(), PaginationState::at(1, 24));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut orch = orchestrator();
        orch.set_search_text("phone");
        let a = orch.prepare().unwrap().unwrap();
        orch.set_search_text("phones");
        let b = orch.prepare().unwrap().unwrap();

        assert!(a.token.is_cancelled());
        assert_eq!(orch.settle(&b.token, Ok(result(&["b"]))), Some(Settlement::Success));
        assert_eq!(orch.settle(&a.token, Ok(result(&["a"]))), None);

        let ids: Vec<&str> = orch.store().items().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(orch.metrics.snapshot().superseded, 1);
    }

    #[test]
    fn test_mode_switch_cancels_other_mode_and_clears() {
        let mut orch = orchestrator();
        let listing = orch.prepare().unwrap().unwrap();
        orch.settle(&listing.token, Ok(result(&["l"])));

        orch.set_search_text("tv");
        let advanced = orch.prepare().unwrap().unwrap();
        assert!(orch.store().result().is_none());
        assert!(orch.store().status(SearchMode::Advanced).loading);

        orch.set_search_text("");
        let back = orch.prepare().unwrap().unwrap();
        assert!(advanced.token.is_cancelled());
        assert!(!orch.store().status(SearchMode::Advanced).loading);
        assert_eq!(back.request.mode, SearchMode::Listing);
    }

    #[test]
    fn test_failure_keeps_results_and_allows_retry() {
        let mut orch = orchestrator();
        let first = orch.prepare().unwrap().unwrap();
        orch.settle(&first.token, Ok(result(&["a"])));

        orch.set_page(2);
        let second = orch.prepare().unwrap().unwrap();
        let err = SearchError::Fetch(FetchError::Http {
            status: 500,
            url: "/products".into(),
        });
        assert_eq!(orch.settle(&second.token, Err(err)), Some(Settlement::Failed));
        assert_eq!(orch.store().items().len(), 1);
        assert!(orch.store().error(SearchMode::Listing).is_some());

        let retry = orch.prepare().unwrap();
        assert!(retry.is_some());
        assert_eq!(orch.store().error(SearchMode::Listing), None);
    }

    #[test]
    fn test_cancellation_is_silent() {
        let mut orch = orchestrator();
        let dispatch = orch.prepare().unwrap().unwrap();
        assert_eq!(
            orch.settle(&dispatch.token, Err(SearchError::Cancelled)),
            Some(Settlement::Cancelled)
        );
        assert_eq!(orch.store().error(SearchMode::Listing), None);
        assert!(!orch.store().is_loading());
        assert_eq!(orch.metrics.snapshot().failed, 0);
    }

    #[test]
    fn test_degraded_success_is_not_an_error() {
        let mut orch = orchestrator();
        orch.set_search_text("laptop");
        let dispatch = orch.prepare().unwrap().unwrap();
        let mut partial = result(&["a"]);
        partial.telemetry = EngineTelemetry {
            use_elastic: true,
            timed_out: true,
            ..Default::default()
        };

        assert_eq!(orch.settle(&dispatch.token, Ok(partial)), Some(Settlement::Success));
        assert!(orch.store().is_degraded());
        assert_eq!(orch.store().error(SearchMode::Advanced), None);
        assert_eq!(orch.metrics.snapshot().degraded, 1);
    }

    #[test]
    fn test_next_page_by_offset_and_cursor() {
        let mut orch = orchestrator();
        let first = orch.prepare().unwrap().unwrap();
        orch.settle(&first.token, Ok(result(&["a", "b"])));

        let next = orch.prepare_next_page().unwrap();
        assert!(next.append);
        assert_eq!(next.request.payload.offset, 2);
        assert_eq!(next.request.key, first.request.key);
        assert!(orch.prepare_next_page().is_none());

        let mut batch = result(&["c"]);
        batch.next_cursor = Some("cur-3".into());
        orch.settle(&next.token, Ok(batch));
        assert_eq!(orch.store().items().len(), 3);

        let by_cursor = orch.prepare_next_page().unwrap();
        assert_eq!(by_cursor.request.payload.cursor.as_deref(), Some("cur-3"));
        assert!(!by_cursor.request.payload.include_aggregations);
    }

    #[test]
    fn test_no_next_page_when_exhausted() {
        let mut orch = orchestrator();
        let first = orch.prepare().unwrap().unwrap();
        let mut last = result(&["a"]);
        last.has_more = false;
        orch.settle(&first.token, Ok(last));
        assert!(orch.prepare_next_page().is_none());
    }

    #[test]
    fn test_clear_search_returns_to_listing() {
        let mut orch = orchestrator();
        orch.set_search_text("camera");
        let dispatch = orch.prepare().unwrap().unwrap();
        orch.settle(&dispatch.token, Ok(result(&["a"])));

        assert!(orch.clear_search());
        assert!(orch.store().result().is_none());
        assert_eq!(orch.mode(), SearchMode::Listing);
    }

    #[test]
    fn test_clear_search_on_defaults_refetches() {
        let mut orch = orchestrator();
        orch.set_page(3);
        let first = orch.prepare().unwrap().unwrap();
        orch.settle(&first.token, Ok(result(&["a"])));

        assert!(!orch.clear_search());
        assert!(orch.store().result().is_none());
        assert_eq!(orch.pagination().page(), 1);

        let refetch = orch.prepare().unwrap().unwrap();
        assert_eq!(refetch.request.payload.offset, 0);
        assert_eq!(refetch.request.mode, SearchMode::Listing);
        orch.settle(&refetch.token, Ok(result(&["b"])));
        assert_eq!(orch.store().items().len(), 1);

        assert!(!orch.clear_search());
        assert!(orch.prepare().unwrap().is_some());
    }

    #[test]
    fn test_teardown_cancels_in_flight() {
        let mut orch = orchestrator();
        let dispatch = orch.prepare().unwrap().unwrap();
        assert_eq!(orch.teardown(), 1);
        assert!(dispatch.token.is_cancelled());
        assert_eq!(orch.phase(), SearchPhase::Settled(Settlement::Cancelled));
        assert_eq!(orch.settle(&dispatch.token, Ok(result(&["late"]))), None);
        assert!(orch.store().result().is_none());
    }
}
