//! Page/per-page pagination primitives shared by listing endpoints.
//!
//! A [`PageRequest`] validates the caller-supplied page coordinates once, at
//! the edge, so repositories only ever see well-formed offsets and limits. A
//! [`Paginated`] envelope carries one page of results together with the
//! totals clients need to render pagers.

use serde::{Deserialize, Serialize};

/// Default page size applied when the caller omits `perPage`.
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Upper bound on the page size a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Validation errors raised when constructing a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Pages are numbered from one.
    #[error("page numbers start at 1")]
    PageZero,
    /// A page must hold at least one item.
    #[error("page size must be at least 1")]
    PerPageZero,
    /// Page size exceeds the service-wide ceiling.
    #[error("page size must not exceed {max}")]
    PerPageTooLarge {
        /// The configured ceiling.
        max: u32,
    },
}

/// Validated page coordinates for a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Build a request from explicit coordinates.
    pub fn new(page: u32, per_page: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::PageZero);
        }
        if per_page == 0 {
            return Err(PageRequestError::PerPageZero);
        }
        if per_page > MAX_PER_PAGE {
            return Err(PageRequestError::PerPageTooLarge { max: MAX_PER_PAGE });
        }
        Ok(Self { page, per_page })
    }

    /// Build a request from optional query parameters, applying defaults.
    pub fn from_params(page: Option<u32>, per_page: Option<u32>) -> Result<Self, PageRequestError> {
        Self::new(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PER_PAGE))
    }

    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Row offset for the underlying query.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Row limit for the underlying query.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// One-based page number echoed back to the caller.
    pub page: u32,
    /// Total number of pages for the query.
    pub pages: u64,
    /// Total number of matching items across all pages.
    pub total: u64,
}

impl<T> Paginated<T> {
    /// Wrap a page of items in the envelope.
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            pages: total.div_ceil(u64::from(request.per_page())),
            total,
        }
    }

    /// Map the items while preserving the pager totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            pages: self.pages,
            total: self.total,
        }
    }
}
