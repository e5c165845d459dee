//! Pagination state and allowed page sizes.

use serde::{Deserialize, Serialize};

/// Page sizes offered by product listings.
pub const LISTING_PAGE_SIZES: [u32; 6] = [6, 12, 18, 24, 30, 36];

/// Page sizes offered by tabular (admin) views.
pub const TABLE_PAGE_SIZES: [u32; 6] = [5, 10, 15, 20, 25, 30];

/// The fixed set of page sizes a surface accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizes {
    allowed: Vec<u32>,
    default: u32,
}

impl PageSizes {
    /// Create a page size set. Falls back to the first allowed size when
    /// `default` is not a member; an empty list allows only `default`.
    pub fn new(allowed: impl Into<Vec<u32>>, default: u32) -> Self {
        let mut allowed: Vec<u32> = allowed.into();
        allowed.retain(|size| *size > 0);
        allowed.sort_unstable();
        allowed.dedup();

        let default = if allowed.contains(&default) {
            default
        } else {
            allowed.first().copied().unwrap_or(default.max(1))
        };
        if allowed.is_empty() {
            allowed.push(default);
        }

        Self { allowed, default }
    }

    /// Product listing sizes, 12 per page by default.
    pub fn listing() -> Self {
        Self::new(LISTING_PAGE_SIZES, 12)
    }

    /// Tabular view sizes, 10 per page by default.
    pub fn tabular() -> Self {
        Self::new(TABLE_PAGE_SIZES, 10)
    }

    pub fn contains(&self, size: u32) -> bool {
        self.allowed.contains(&size)
    }

    pub fn default_size(&self) -> u32 {
        self.default
    }

    pub fn allowed(&self) -> &[u32] {
        &self.allowed
    }

    /// Pagination at page 1 with the default size.
    pub fn initial_state(&self) -> PaginationState {
        PaginationState::new(self.default)
    }
}

impl Default for PageSizes {
    fn default() -> Self {
        Self::listing()
    }
}

/// Current page and page size. The offset is always derived, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    page: u32,
    page_size: u32,
}

impl PaginationState {
    /// Page 1 with the given size.
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// A specific page. Pages are 1-based; 0 is treated as 1, and pages past
    /// [`max_page`](Self::max_page) are clamped to it.
    pub fn at(page: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            page: page.clamp(1, Self::max_page(page_size)),
            page_size,
        }
    }

    /// Last page whose offset still fits in a `u32`.
    pub fn max_page(page_size: u32) -> u32 {
        (u32::MAX / page_size.max(1)).saturating_add(1)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `(page - 1) * page_size`. Pages never exceed
    /// [`max_page`](Self::max_page), so this cannot overflow.
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }

    /// Move to a page. Pages past [`max_page`](Self::max_page) are ignored.
    /// Returns whether anything changed.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page > Self::max_page(self.page_size) {
            return false;
        }
        let changed = self.page != page;
        self.page = page;
        changed
    }

    /// Change the page size, resetting to page 1. Returns whether anything changed.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }

    /// Back to page 1. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        self.set_page(1)
    }

    /// Number of pages needed for `total` items.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_size))
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        PageSizes::default().initial_state()
    }
}
