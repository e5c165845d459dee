//! Query-string synchronization.

use std::sync::Arc;

use parking_lot::Mutex;
use turbo_commerce::search::{
    normalize_filters, PageSizes, PaginationState, RawFilters, SearchFilters, SpecMap,
};

/// The page's navigation history, as far as the search layer needs it.
pub trait History: Send + Sync {
    /// Current query string, without the leading `?`.
    fn query_string(&self) -> String;

    /// Replace the current entry's query string without adding an entry.
    fn replace_query(&self, query: &str);
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<String>,
    index: usize,
    replacements: usize,
}

/// In-process history with back/forward navigation.
#[derive(Debug)]
pub struct MemoryHistory {
    state: Mutex<MemoryState>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::with_query("")
    }

    /// Start at a deep link.
    pub fn with_query(query: impl Into<String>) -> Self {
        let query: String = query.into();
        Self {
            state: Mutex::new(MemoryState {
                entries: vec![query.trim_start_matches('?').to_string()],
                index: 0,
                replacements: 0,
            }),
        }
    }

    /// Push a new entry, as a link click would. Drops any forward entries.
    pub fn navigate(&self, query: impl Into<String>) {
        let query: String = query.into();
        let mut state = self.state.lock();
        let keep = state.index + 1;
        state.entries.truncate(keep);
        state.entries.push(query.trim_start_matches('?').to_string());
        state.index = state.entries.len() - 1;
    }

    /// Go back one entry. Returns whether there was one.
    pub fn back(&self) -> bool {
        let mut state = self.state.lock();
        if state.index == 0 {
            return false;
        }
        state.index -= 1;
        true
    }

    /// Go forward one entry. Returns whether there was one.
    pub fn forward(&self) -> bool {
        let mut state = self.state.lock();
        if state.index + 1 >= state.entries.len() {
            return false;
        }
        state.index += 1;
        true
    }

    /// Number of history entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of in-place replacements made so far.
    pub fn replacements(&self) -> usize {
        self.state.lock().replacements
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl History for MemoryHistory {
    fn query_string(&self) -> String {
        let state = self.state.lock();
        state.entries.get(state.index).cloned().unwrap_or_default()
    }

    fn replace_query(&self, query: &str) {
        let mut state = self.state.lock();
        let index = state.index;
        if let Some(entry) = state.entries.get_mut(index) {
            *entry = query.trim_start_matches('?').to_string();
        }
        state.replacements += 1;
    }
}

/// Parameters this layer reads and writes. Anything else in the query
/// string belongs to the page and is carried through untouched.
const SEARCH_KEYS: [&str; 11] = [
    "search",
    "category",
    "brand",
    "minPrice",
    "maxPrice",
    "minRating",
    "inStock",
    "specifications",
    "category_specific",
    "page",
    "pageSize",
];

/// Filter and pagination state carried by a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlState {
    pub filters: RawFilters,
    pub pagination: PaginationState,
    /// Pairs with keys outside the search parameters, in their original order.
    pub extras: Vec<(String, String)>,
}

impl UrlState {
    /// Whether this state asks for the same search as `filters` at `pagination`.
    /// Request-only fields (offset, limit, aggregations, cursor) are ignored.
    pub fn describes(&self, filters: &SearchFilters, pagination: &PaginationState) -> bool {
        self.pagination == *pagination
            && url_view(&normalize_filters(&self.filters)) == url_view(filters)
    }
}

fn url_view(filters: &SearchFilters) -> SearchFilters {
    SearchFilters {
        offset: 0,
        limit: 0,
        include_aggregations: false,
        cursor: None,
        ..filters.clone()
    }
}

fn join_pairs<'a>(pairs: impl IntoIterator<Item = &'a (String, String)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode canonical filters and pagination. Page 1 and the default page size
/// are left out.
pub fn encode_query(
    filters: &SearchFilters,
    pagination: &PaginationState,
    page_sizes: &PageSizes,
) -> String {
    let mut pairs: Vec<(String, String)> = filters
        .to_query_pairs()
        .unwrap_or_default()
        .into_iter()
        .filter(|(key, _)| {
            !matches!(
                key.as_str(),
                "offset" | "limit" | "includeAggregations" | "cursor"
            )
        })
        .collect();

    if pagination.page() != 1 {
        pairs.push(("page".into(), pagination.page().to_string()));
    }
    if pagination.page_size() != page_sizes.default_size() {
        pairs.push(("pageSize".into(), pagination.page_size().to_string()));
    }

    join_pairs(&pairs)
}

fn decode_pairs(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
            let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

/// Decode a query string. Only non-empty, parseable values override the
/// defaults; everything else is ignored. Pages whose offset would not fit
/// are ignored as well.
pub fn decode_query(query: &str, page_sizes: &PageSizes) -> UrlState {
    let mut filters = RawFilters::default();
    let mut page = 1;
    let mut page_size = page_sizes.default_size();
    let mut extras = Vec::new();

    let is_number = |v: &str| v.parse::<f64>().is_ok_and(f64::is_finite);

    for (key, value) in decode_pairs(query) {
        if !SEARCH_KEYS.contains(&key.as_str()) {
            extras.push((key, value));
            continue;
        }
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "search" => filters.search = value,
            "category" => filters.category = value,
            "brand" => filters.brand = value,
            "minPrice" if is_number(&value) => filters.min_price = value,
            "maxPrice" if is_number(&value) => filters.max_price = value,
            "minRating" if is_number(&value) => filters.min_rating = value,
            "inStock" => match value.as_str() {
                "true" => filters.in_stock = Some(true),
                "false" => filters.in_stock = Some(false),
                _ => {}
            },
            "specifications" => {
                if let Ok(map) = serde_json::from_str::<SpecMap>(&value) {
                    filters.specifications = map;
                }
            }
            "category_specific" => {
                if let Ok(map) = serde_json::from_str::<SpecMap>(&value) {
                    filters.category_specific = map;
                }
            }
            "page" => {
                if let Some(p) = value.parse::<u32>().ok().filter(|p| *p >= 1) {
                    page = p;
                }
            }
            "pageSize" => {
                if let Some(size) = value.parse::<u32>().ok().filter(|s| page_sizes.contains(*s)) {
                    page_size = size;
                }
            }
            _ => {}
        }
    }

    if page > PaginationState::max_page(page_size) {
        page = 1;
    }

    UrlState {
        filters,
        pagination: PaginationState::at(page, page_size),
        extras,
    }
}

/// Order-insensitive identity of a query string.
pub fn query_key(query: &str) -> String {
    let mut pairs: Vec<(String, String)> = decode_pairs(query)
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Keeps filter state and the query string consistent without feedback loops.
///
/// The URL is read once at mount; afterwards the search layer only writes it.
/// The guard remembers the last query string this side wrote, so a later
/// change is treated as external navigation only when it differs.
pub struct UrlStateSync {
    history: Arc<dyn History>,
    page_sizes: PageSizes,
    guard: Option<String>,
    hydrated: bool,
}

impl UrlStateSync {
    pub fn new(history: Arc<dyn History>, page_sizes: PageSizes) -> Self {
        Self {
            history,
            page_sizes,
            guard: None,
            hydrated: false,
        }
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Current query string of the underlying history.
    pub fn current_query(&self) -> String {
        self.history.query_string()
    }

    /// Read the URL. Only the first call returns state.
    pub fn hydrate(&mut self) -> Option<UrlState> {
        if self.hydrated {
            return None;
        }
        self.hydrated = true;

        let query = self.history.query_string();
        self.guard = Some(query_key(&query));
        tracing::debug!(query = %query, "hydrating search state from url");
        Some(decode_query(&query, &self.page_sizes))
    }

    /// Write the state of an accepted dispatch. Returns whether the history changed.
    ///
    /// A URL that already describes the state is left as it is, however it
    /// is spelled. Parameters outside the search keys are kept.
    pub fn write(&mut self, filters: &SearchFilters, pagination: &PaginationState) -> bool {
        let current = self.history.query_string();
        let state = decode_query(&current, &self.page_sizes);
        if state.describes(filters, pagination) {
            self.guard = Some(query_key(&current));
            return false;
        }

        let mut query = encode_query(filters, pagination, &self.page_sizes);
        if !state.extras.is_empty() {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&join_pairs(&state.extras));
        }
        let key = query_key(&query);

        self.history.replace_query(&query);
        self.guard = Some(key);
        true
    }

    /// State from an external navigation, if the URL changed since our last write.
    pub fn poll_external(&mut self) -> Option<UrlState> {
        let query = self.history.query_string();
        let key = query_key(&query);
        if self.guard.as_deref() == Some(key.as_str()) {
            return None;
        }

        tracing::debug!(query = %query, "external url change");
        self.guard = Some(key);
        Some(decode_query(&query, &self.page_sizes))
    }
}

impl std::fmt::Debug for UrlStateSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlStateSync")
            .field("guard", &self.guard)
            .field("hydrated", &self.hydrated)
            .finish_non_exhaustive()
    }
}
