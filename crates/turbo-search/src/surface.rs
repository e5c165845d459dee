//! Async host for one search surface.

use std::sync::Arc;
use std::time::Duration;

use edge_core::SearchConfig;
use edge_data::CatalogBackend;
use edge_executor::{CancellationManager, DebounceOptions, Debouncer, RequestToken, Throttler};
use edge_observability::{MetricsSnapshot, SearchMetrics};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use turbo_commerce::search::{PageSizes, PaginationState, RawFilters, SearchResult};

use crate::error::SearchError;
use crate::orchestrator::{Dispatch, SearchOrchestrator, SearchPhase};
use crate::store::ResultStore;
use crate::url_sync::{History, UrlStateSync};

/// Timing and paging settings of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub debounce: DebounceOptions,
    pub load_more_throttle: Duration,
    pub page_sizes: PageSizes,
}

impl SurfaceOptions {
    pub fn from_config(config: &SearchConfig) -> Self {
        let mut debounce = DebounceOptions::new(config.debounce.search_wait());
        if let Some(max_wait) = config.debounce.search_max_wait() {
            debounce = debounce.with_max_wait(max_wait);
        }
        Self {
            debounce,
            load_more_throttle: config.debounce.load_more_throttle(),
            page_sizes: PageSizes::new(
                config.pagination.page_sizes.clone(),
                config.pagination.default_page_size,
            ),
        }
    }
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

/// Read-only view of a surface, published after every command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceSnapshot {
    pub phase: SearchPhase,
    pub filters: RawFilters,
    pub pagination: PaginationState,
    pub store: ResultStore,
    pub metrics: MetricsSnapshot,
    /// Requests settled so far, in any way.
    pub settlements: u64,
    pub query_string: String,
    pub mounted: bool,
}

enum Command {
    SetFilters(RawFilters),
    SetSearchText(String),
    SetPage(u32),
    SetPageSize(u32),
    ClearSearch,
    SearchNow,
    LoadMore,
    LocationChanged,
    Debounced,
    LoadMoreTick,
    Settled {
        token: RequestToken,
        outcome: Result<SearchResult, SearchError>,
    },
    Unmount,
}

/// A mounted search surface.
///
/// A driver task owns the orchestrator; this handle only sends commands and
/// reads snapshots. Dropping the handle unmounts the surface.
pub struct SearchSurface {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SurfaceSnapshot>,
    driver: Option<JoinHandle<()>>,
}

impl SearchSurface {
    /// Mount with settings from `config`. Must be called within a Tokio runtime.
    pub fn mount(
        config: &SearchConfig,
        backend: Arc<dyn CatalogBackend>,
        history: Arc<dyn History>,
    ) -> Self {
        Self::mount_with(
            SurfaceOptions::from_config(config),
            backend,
            history,
            Arc::new(CancellationManager::new()),
            Arc::new(SearchMetrics::new()),
        )
    }

    /// Mount with explicit options and shared collaborators.
    ///
    /// The URL is read once, then the initial request is dispatched without
    /// waiting for the debounce timer.
    pub fn mount_with(
        options: SurfaceOptions,
        backend: Arc<dyn CatalogBackend>,
        history: Arc<dyn History>,
        cancellations: Arc<CancellationManager>,
        metrics: Arc<SearchMetrics>,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();

        let orchestrator =
            SearchOrchestrator::new(options.page_sizes.clone(), cancellations, metrics.clone());
        let url = UrlStateSync::new(history, options.page_sizes.clone());

        let (snapshot_tx, snapshots) = watch::channel(SurfaceSnapshot {
            phase: orchestrator.phase(),
            filters: orchestrator.filters().clone(),
            pagination: orchestrator.pagination(),
            store: orchestrator.store().clone(),
            metrics: metrics.snapshot(),
            settlements: 0,
            query_string: url.current_query(),
            mounted: true,
        });

        let debouncer = {
            let commands = commands.clone();
            Debouncer::new(options.debounce, move |()| {
                let _ = commands.send(Command::Debounced);
            })
        };
        let throttler = {
            let commands = commands.clone();
            Throttler::new(options.load_more_throttle, move |()| {
                let _ = commands.send(Command::LoadMoreTick);
            })
        };

        let driver = Driver {
            orchestrator,
            url,
            backend,
            debouncer,
            throttler,
            commands: commands.clone(),
            snapshots: snapshot_tx,
            metrics,
            mounted: true,
        };

        Self {
            commands,
            snapshots,
            driver: Some(tokio::spawn(driver.run(receiver))),
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("search surface already unmounted");
        }
    }

    /// Replace all filters (debounced; resets to page 1).
    pub fn set_filters(&self, filters: RawFilters) {
        self.send(Command::SetFilters(filters));
    }

    /// Update the search box text (debounced; resets to page 1).
    pub fn update_search(&self, text: impl Into<String>) {
        self.send(Command::SetSearchText(text.into()));
    }

    pub fn set_page(&self, page: u32) {
        self.send(Command::SetPage(page));
    }

    /// Change the page size. Sizes outside the allowed set are ignored.
    pub fn set_page_size(&self, page_size: u32) {
        self.send(Command::SetPageSize(page_size));
    }

    /// Reset filters and results, then show the plain listing.
    pub fn clear_search(&self) {
        self.send(Command::ClearSearch);
    }

    /// Dispatch now, skipping the debounce timer. Also the retry entry point.
    pub fn search_now(&self) {
        self.send(Command::SearchNow);
    }

    /// Load the next batch (throttled).
    pub fn load_more(&self) {
        self.send(Command::LoadMore);
    }

    /// Tell the surface the URL may have changed from outside (back/forward, deep link).
    pub fn location_changed(&self) {
        self.send(Command::LocationChanged);
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SurfaceSnapshot> {
        self.snapshots.clone()
    }

    /// Wait for a snapshot matching `predicate`. Returns `None` if the
    /// surface went away first.
    pub async fn wait_until<F>(&self, mut predicate: F) -> Option<SurfaceSnapshot>
    where
        F: FnMut(&SurfaceSnapshot) -> bool,
    {
        let mut receiver = self.snapshots.clone();
        let snapshot = receiver.wait_for(|s| predicate(s)).await.ok()?;
        Some(snapshot.clone())
    }

    /// Cancel pending input and in-flight requests, then stop the driver.
    pub async fn unmount(mut self) -> SurfaceSnapshot {
        self.send(Command::Unmount);
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                tracing::warn!(error = %e, "search surface driver ended abnormally");
            }
        }
        self.snapshot()
    }
}

impl Drop for SearchSurface {
    fn drop(&mut self) {
        if self.driver.is_some() {
            let _ = self.commands.send(Command::Unmount);
        }
    }
}

impl std::fmt::Debug for SearchSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSurface")
            .field("phase", &self.snapshots.borrow().phase)
            .finish_non_exhaustive()
    }
}

struct Driver {
    orchestrator: SearchOrchestrator,
    url: UrlStateSync,
    backend: Arc<dyn CatalogBackend>,
    debouncer: Debouncer<()>,
    throttler: Throttler<()>,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Sender<SurfaceSnapshot>,
    metrics: Arc<SearchMetrics>,
    mounted: bool,
}

impl Driver {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        if let Some(state) = self.url.hydrate() {
            self.orchestrator.hydrate(state);
        }
        self.dispatch();
        self.publish();

        while let Some(command) = receiver.recv().await {
            let done = self.handle(command);
            self.publish();
            if done {
                break;
            }
        }
    }

    /// Returns true once the surface is unmounted.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::SetFilters(filters) => {
                if self.orchestrator.set_filters(filters) {
                    self.debouncer.call(());
                }
            }
            Command::SetSearchText(text) => {
                if self.orchestrator.set_search_text(text) {
                    self.debouncer.call(());
                }
            }
            Command::SetPage(page) => {
                if self.orchestrator.set_page(page) {
                    self.debouncer.call(());
                }
            }
            Command::SetPageSize(size) => {
                if self.orchestrator.set_page_size(size) {
                    self.debouncer.call(());
                }
            }
            Command::ClearSearch => {
                self.debouncer.cancel();
                self.orchestrator.clear_search();
                self.dispatch();
            }
            Command::SearchNow | Command::Debounced => {
                self.debouncer.cancel();
                self.dispatch();
            }
            Command::LoadMore => self.throttler.call(()),
            Command::LoadMoreTick => {
                if let Some(dispatch) = self.orchestrator.prepare_next_page() {
                    self.spawn(dispatch);
                }
            }
            Command::LocationChanged => {
                if let Some(state) = self.url.poll_external() {
                    self.debouncer.cancel();
                    self.orchestrator.hydrate(state);
                    self.dispatch();
                }
            }
            Command::Settled { token, outcome } => {
                self.orchestrator.settle(&token, outcome);
            }
            Command::Unmount => {
                self.debouncer.cancel();
                self.throttler.cancel();
                let cancelled = self.orchestrator.teardown();
                self.mounted = false;
                tracing::debug!(cancelled, "search surface unmounted");
                return true;
            }
        }
        false
    }

    fn dispatch(&mut self) {
        match self.orchestrator.prepare() {
            Ok(Some(dispatch)) => {
                self.url
                    .write(&dispatch.request.payload, &dispatch.pagination());
                self.spawn(dispatch);
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "failed to build search request"),
        }
    }

    fn spawn(&self, dispatch: Dispatch) {
        let backend = self.backend.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let outcome = dispatch.execute(backend.as_ref()).await;
            let _ = commands.send(Command::Settled {
                token: dispatch.token,
                outcome,
            });
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(SurfaceSnapshot {
            phase: self.orchestrator.phase(),
            filters: self.orchestrator.filters().clone(),
            pagination: self.orchestrator.pagination(),
            store: self.orchestrator.store().clone(),
            metrics: self.metrics.snapshot(),
            settlements: self.orchestrator.settlements(),
            query_string: self.url.current_query(),
            mounted: self.mounted,
        });
    }
}
