//! Page-number pagination over LIMIT/OFFSET.

use serde::Serialize;

/// A page request turned into LIMIT/OFFSET.
///
/// # Example
/// ```ignore
/// use repodb::PageRequest;
///
/// // Page 3 with 5 items per page
/// let request = PageRequest::new(3, Some(5));
/// assert_eq!(request.limit(), Some(5));
/// assert_eq!(request.offset(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    pack: Option<u64>,
}

impl PageRequest {
    /// Page numbers start at 1; smaller values are clamped. `pack` is the page
    /// size, `None` (or zero) for a single unlimited page.
    pub fn new(page: u64, pack: Option<u64>) -> Self {
        Self {
            page: page.max(1),
            pack: pack.filter(|pack| *pack > 0),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn pack(&self) -> Option<u64> {
        self.pack
    }

    /// LIMIT, if the request is bounded.
    pub fn limit(&self) -> Option<u64> {
        self.pack
    }

    /// OFFSET of the first item of the page.
    pub fn offset(&self) -> u64 {
        self.pack.map_or(0, |pack| (self.page - 1).saturating_mul(pack))
    }

    /// Wrap fetched items.
    pub fn into_page<T>(self, items: Vec<T>, total: Option<u64>) -> Page<T> {
        let pages = match (total, self.pack) {
            (Some(total), Some(pack)) => Some(total.div_ceil(pack)),
            (Some(_), None) => Some(1),
            (None, _) => None,
        };
        Page {
            items,
            page: self.page,
            pack: self.pack,
            total,
            pages,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub pack: Option<u64>,
    /// Number of items across all pages, when counted.
    pub total: Option<u64>,
    /// Number of pages, when the total is known.
    pub pages: Option<u64>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            pack: self.pack,
            total: self.total,
            pages: self.pages,
        }
    }
}
