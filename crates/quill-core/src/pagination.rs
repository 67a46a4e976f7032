//! Page/limit contract shared by every list endpoint
//!
//! `skip = (page - 1) * limit`, `take = limit`. The envelope reports the
//! size of the filtered set, never the size of the whole collection.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Resolved page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Build from optional query values. Missing values take the defaults;
    /// zero is raised to one and the limit is capped at `max_limit`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self::with_bounds(page, limit, DEFAULT_LIMIT, MAX_LIMIT)
    }

    pub fn with_bounds(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    pub fn skip(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    pub fn take(&self) -> usize {
        self.limit as usize
    }

    /// Slice an already filtered and sorted set into one page
    pub fn apply<T>(&self, items: Vec<T>) -> Paginated<T> {
        let total_count = items.len() as u64;
        let data = items.into_iter().skip(self.skip()).take(self.take()).collect();
        Paginated::new(data, total_count, *self)
    }
}

/// Pagination metadata returned alongside every list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(total_count: u64, params: PageParams) -> Self {
        let limit = params.limit.max(1) as u64;
        Self {
            page: params.page,
            limit: params.limit,
            total_pages: total_count.div_ceil(limit),
            total_count,
            has_next_page: (params.page as u64) * limit < total_count,
            has_previous_page: params.page > 1,
        }
    }
}

/// List response envelope: `{ data, pagination }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total_count: u64, params: PageParams) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(total_count, params),
        }
    }

    /// Convert every item while keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::new(None, None);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.skip(), 0);
        assert_eq!(params.take(), 10);
    }

    #[test]
    fn test_zero_and_oversized_values_are_clamped() {
        let params = PageParams::new(Some(0), Some(0));
        assert_eq!(params, PageParams { page: 1, limit: 1 });

        let params = PageParams::new(Some(2), Some(10_000));
        assert_eq!(params.limit, MAX_LIMIT);
    }

    #[test]
    fn test_meta_arithmetic() {
        let meta = PaginationMeta::new(23, PageParams::new(Some(2), Some(5)));
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_next_page);
        assert!(meta.has_previous_page);

        let last = PaginationMeta::new(23, PageParams::new(Some(5), Some(5)));
        assert!(!last.has_next_page);

        let empty = PaginationMeta::new(0, PageParams::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_previous_page);
    }

    #[test]
    fn test_apply_slices_page() {
        let items: Vec<u32> = (0..12).collect();
        let page = PageParams::new(Some(2), Some(5)).apply(items);
        assert_eq!(page.data, vec![5, 6, 7, 8, 9]);
        assert_eq!(page.pagination.total_count, 12);

        let beyond = PageParams::new(Some(9), Some(5)).apply((0..12).collect::<Vec<u32>>());
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.pagination.total_count, 12);
    }

    #[test]
    fn test_envelope_serialization() {
        let page = PageParams::default().apply(vec!["a", "b"]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["totalPages"], 1);
        assert_eq!(json["pagination"]["hasNextPage"], false);
        assert_eq!(json["pagination"]["hasPreviousPage"], false);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_envelope_matches_contract(total in 0usize..500, page in 1u32..40, limit in 1u32..=MAX_LIMIT) {
            let params = PageParams::new(Some(page), Some(limit));
            let result = params.apply((0..total).collect::<Vec<_>>());
            let meta = result.pagination;

            prop_assert!(result.data.len() <= limit as usize);
            prop_assert_eq!(meta.total_count, total as u64);
            prop_assert_eq!(meta.total_pages, (total as u64 + limit as u64 - 1) / limit as u64);
            prop_assert_eq!(meta.has_next_page, (page as u64) * (limit as u64) < total as u64);
            prop_assert_eq!(meta.has_previous_page, page > 1);
        }
    }
}
