//! Result store.

use serde::Serialize;
use turbo_commerce::search::{
    Aggregations, EngineTelemetry, ProductSummary, SearchMode, SearchResult,
};

/// Loading and error state of one search mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModeStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// The latest results of a search surface.
///
/// Only the orchestrator writes to the store; everything else reads cloned
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultStore {
    result: Option<SearchResult>,
    result_mode: Option<SearchMode>,
    listing: ModeStatus,
    advanced: ModeStatus,
    page_size: u32,
}

impl ResultStore {
    /// Create an empty store.
    pub fn new(page_size: u32) -> Self {
        Self {
            result: None,
            result_mode: None,
            listing: ModeStatus::default(),
            advanced: ModeStatus::default(),
            page_size: page_size.max(1),
        }
    }

    /// The latest result, if any request has succeeded since the last clear.
    pub fn result(&self) -> Option<&SearchResult> {
        self.result.as_ref()
    }

    /// Which mode produced the current result.
    pub fn result_mode(&self) -> Option<SearchMode> {
        self.result_mode
    }

    pub fn items(&self) -> &[ProductSummary] {
        self.result.as_ref().map_or(&[], |r| r.items.as_slice())
    }

    pub fn aggregations(&self) -> Option<&Aggregations> {
        self.result.as_ref().map(|r| &r.aggregations)
    }

    pub fn telemetry(&self) -> Option<EngineTelemetry> {
        self.result.as_ref().map(|r| r.telemetry)
    }

    pub fn total(&self) -> u64 {
        self.result.as_ref().map_or(0, |r| r.total)
    }

    pub fn has_more(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.has_more)
    }

    /// Page size the current result was requested with.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `ceil(total / page_size)`.
    pub fn total_pages(&self) -> u64 {
        self.total().div_ceil(u64::from(self.page_size))
    }

    /// Whether the current result came back degraded (engine timeout or fallback).
    pub fn is_degraded(&self) -> bool {
        self.telemetry().is_some_and(|t| t.is_degraded())
    }

    pub fn status(&self, mode: SearchMode) -> &ModeStatus {
        match mode {
            SearchMode::Listing => &self.listing,
            SearchMode::Advanced => &self.advanced,
        }
    }

    /// Whether either mode is loading.
    pub fn is_loading(&self) -> bool {
        self.listing.loading || self.advanced.loading
    }

    pub fn error(&self, mode: SearchMode) -> Option<&str> {
        self.status(mode).error.as_deref()
    }

    fn status_mut(&mut self, mode: SearchMode) -> &mut ModeStatus {
        match mode {
            SearchMode::Listing => &mut self.listing,
            SearchMode::Advanced => &mut self.advanced,
        }
    }

    pub(crate) fn begin(&mut self, mode: SearchMode) {
        let status = self.status_mut(mode);
        status.loading = true;
        status.error = None;
    }

    pub(crate) fn set_loading(&mut self, mode: SearchMode, loading: bool) {
        self.status_mut(mode).loading = loading;
    }

    /// Replace the result, or append to it for a follow-up batch of the same mode.
    pub(crate) fn apply(
        &mut self,
        mode: SearchMode,
        result: SearchResult,
        append: bool,
        page_size: u32,
    ) {
        match self.result.as_mut() {
            Some(current) if append && self.result_mode == Some(mode) => current.append(result),
            _ => {
                self.result = Some(result);
                self.page_size = page_size.max(1);
            }
        }
        self.result_mode = Some(mode);

        let status = self.status_mut(mode);
        status.loading = false;
        status.error = None;
    }

    /// Record a failure. The previous result stays visible.
    pub(crate) fn fail(&mut self, mode: SearchMode, message: String) {
        let status = self.status_mut(mode);
        status.loading = false;
        status.error = Some(message);
    }

    /// Drop results, facets and telemetry in one step.
    pub(crate) fn clear(&mut self) {
        self.result = None;
        self.result_mode = None;
        self.listing.error = None;
        self.advanced.error = None;
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbo_commerce::search::AggregationBucket;

    fn result(ids: &[&str], total: u64) -> SearchResult {
        SearchResult {
            items: ids
                .iter()
                .map(|id| ProductSummary {
                    id: id.to_string(),
                    ..Default::default()
                })
                .collect(),
            total,
            has_more: true,
            aggregations: Aggregations::from([(
                "brands".to_string(),
                vec![AggregationBucket::new("Acme", total)],
            )]),
            telemetry: EngineTelemetry {
                use_elastic: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_total_pages() {
        let mut store = ResultStore::new(12);
        assert_eq!(store.total_pages(), 0);

        store.apply(SearchMode::Listing, result(&["a"], 25), false, 12);
        assert_eq!(store.total_pages(), 3);

        store.apply(SearchMode::Listing, result(&["a"], 25), false, 5);
        assert_eq!(store.total_pages(), 5);
    }

    #[test]
    fn test_loading_and_errors_are_per_mode() {
        let mut store = ResultStore::new(12);
        store.begin(SearchMode::Advanced);
        assert!(store.status(SearchMode::Advanced).loading);
        assert!(!store.status(SearchMode::Listing).loading);

        store.fail(SearchMode::Advanced, "HTTP error: 502".into());
        assert!(!store.is_loading());
        assert_eq!(store.error(SearchMode::Advanced), Some("HTTP error: 502"));
        assert_eq!(store.error(SearchMode::Listing), None);

        store.begin(SearchMode::Advanced);
        assert_eq!(store.error(SearchMode::Advanced), None);
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let mut store = ResultStore::new(12);
        store.apply(SearchMode::Listing, result(&["a", "b"], 2), false, 12);
        store.begin(SearchMode::Listing);
        store.fail(SearchMode::Listing, "boom".into());
        assert_eq!(store.items().len(), 2);
    }

    #[test]
    fn test_append_only_within_same_mode() {
        let mut store = ResultStore::new(12);
        store.apply(SearchMode::Advanced, result(&["a"], 3), false, 12);
        store.apply(SearchMode::Advanced, result(&["b"], 3), true, 12);
        assert_eq!(store.items().len(), 2);

        store.apply(SearchMode::Listing, result(&["c"], 3), true, 12);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.result_mode(), Some(SearchMode::Listing));
    }

    #[test]
    fn test_clear_is_atomic() {
        let mut store = ResultStore::new(12);
        store.apply(SearchMode::Advanced, result(&["a"], 1), false, 12);
        store.fail(SearchMode::Listing, "old".into());
        assert!(store.aggregations().is_some());

        store.clear();
        assert!(store.result().is_none());
        assert!(store.aggregations().is_none());
        assert!(store.telemetry().is_none());
        assert_eq!(store.total(), 0);
        assert_eq!(store.error(SearchMode::Listing), None);
    }
}
