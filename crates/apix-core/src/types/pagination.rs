//! Pagination types for list operations.
//!
//! A listing comes back either as a [`LengthAwarePage`], which knows the
//! total number of matches, or as a cheaper [`SimplePage`], which only knows
//! whether another page follows.

use serde::{Deserialize, Serialize};

/// Default page size.
const DEFAULT_PAGE_SIZE: u64 = 15;
/// Maximum page size.
const MAX_PAGE_SIZE: u64 = 100;

/// How a listing is paginated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Count all matches and report totals.
    LengthAware,
    /// Report only whether more results follow.
    Simple,
}

impl PaginationMode {
    /// Map a `with_pages` flag to a mode.
    pub fn from_with_pages(with_pages: bool) -> Self {
        if with_pages {
            Self::LengthAware
        } else {
            Self::Simple
        }
    }
}

/// Position and size of a requested page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_page_size")]
    pub per_page: u64,
}

impl PageRequest {
    /// Create a new page request, clamped to the default maximum size.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self::bounded(page, per_page, MAX_PAGE_SIZE)
    }

    /// Create a new page request with an explicit maximum size.
    pub fn bounded(page: u64, per_page: u64, max_per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, max_per_page.max(1)),
        }
    }

    /// Number of items to skip.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Number of items to take.
    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A page that carries the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthAwarePage<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl<T> LengthAwarePage<T> {
    /// Create a page from its items and the total match count.
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(request.per_page)
        };
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_items,
            total_pages,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }

    /// Create an empty page.
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }
}

/// A page without totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplePage<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
    /// Whether at least one more item exists after this page.
    pub has_more: bool,
}

impl<T> SimplePage<T> {
    /// Build a page from up to `per_page + 1` fetched items.
    ///
    /// The extra item, if present, only signals that more results follow
    /// and is dropped.
    pub fn from_lookahead(mut items: Vec<T>, request: &PageRequest) -> Self {
        let limit = usize::try_from(request.per_page).unwrap_or(usize::MAX);
        let has_more = items.len() > limit;
        items.truncate(limit);
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            has_more,
        }
    }
}

/// Result of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pagination", rename_all = "snake_case")]
pub enum Page<T> {
    /// Page with totals.
    LengthAware(LengthAwarePage<T>),
    /// Page without totals.
    Simple(SimplePage<T>),
}

impl<T> Page<T> {
    /// The mode this page was produced with.
    pub fn mode(&self) -> PaginationMode {
        match self {
            Self::LengthAware(_) => PaginationMode::LengthAware,
            Self::Simple(_) => PaginationMode::Simple,
        }
    }

    /// The items on this page.
    pub fn items(&self) -> &[T] {
        match self {
            Self::LengthAware(p) => &p.items,
            Self::Simple(p) => &p.items,
        }
    }

    /// Consume the page, returning its items.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::LengthAware(p) => p.items,
            Self::Simple(p) => p.items,
        }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Whether this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Total match count, when known.
    pub fn total_items(&self) -> Option<u64> {
        match self {
            Self::LengthAware(p) => Some(p.total_items),
            Self::Simple(_) => None,
        }
    }

    /// Whether another page follows.
    pub fn has_more(&self) -> bool {
        match self {
            Self::LengthAware(p) => p.has_next,
            Self::Simple(p) => p.has_more,
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_clamped() {
        let req = PageRequest::bounded(0, 500, 50);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 50);
        assert_eq!(PageRequest::new(3, 0).per_page, 1);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_length_aware_totals() {
        let req = PageRequest::new(2, 10);
        let page = LengthAwarePage::new(vec![1, 2, 3], &req, 23);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_previous);

        let empty = LengthAwarePage::<u8>::empty(&PageRequest::default());
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_simple_page_lookahead() {
        let req = PageRequest::new(1, 2);
        let page = SimplePage::from_lookahead(vec!['a', 'b', 'c'], &req);
        assert_eq!(page.items, vec!['a', 'b']);
        assert!(page.has_more);

        let last = SimplePage::from_lookahead(vec!['a'], &req);
        assert!(!last.has_more);
    }

    #[test]
    fn test_page_accessors() {
        let page = Page::Simple(SimplePage::from_lookahead(vec![1], &PageRequest::default()));
        assert_eq!(page.mode(), PaginationMode::Simple);
        assert_eq!(page.total_items(), None);
        assert_eq!(page.len(), 1);
        assert!(!page.has_more());
    }
}
