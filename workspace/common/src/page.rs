use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One page of a filtered, sorted collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Number of items matching the filter across all pages
    pub total: u64,
    /// 1-based page number
    pub page: u64,
    /// Maximum number of items per page
    pub page_size: u64,
    /// Number of pages available for `total`
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Converts the items while keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}
