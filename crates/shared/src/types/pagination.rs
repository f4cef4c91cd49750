//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Largest page size a client may request.
pub const MAX_LIMIT: u64 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Returns a copy with page >= 1 and 1 <= limit <= `MAX_LIMIT`.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        let page = self.normalized();
        (page.page - 1) * page.limit
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.normalized().limit
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page number.
    pub current_page: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let request = request.normalized();
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(request.limit)
        };

        Self {
            data,
            meta: PageMeta {
                current_page: request.page,
                total_pages,
                total_items,
            },
        }
    }

    /// Maps the items while keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 20, 0)]
    #[case(2, 20, 20)]
    #[case(3, 50, 100)]
    #[case(0, 20, 0)]
    #[case(2, 500, 100)]
    fn test_offset(#[case] page: u64, #[case] limit: u64, #[case] expected: u64) {
        assert_eq!(PageRequest { page, limit }.offset(), expected);
    }

    #[test]
    fn test_limit_is_capped() {
        assert_eq!(PageRequest { page: 1, limit: 1000 }.limit(), MAX_LIMIT);
        assert_eq!(PageRequest { page: 1, limit: 0 }.limit(), 1);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(20, 1)]
    #[case(21, 2)]
    #[case(100, 5)]
    fn test_total_pages(#[case] total: u64, #[case] pages: u64) {
        let response = PageResponse::new(Vec::<u8>::new(), &PageRequest::default(), total);
        assert_eq!(response.meta.total_pages, pages);
        assert_eq!(response.meta.total_items, total);
        assert_eq!(response.meta.current_page, 1);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let response = PageResponse::new(vec![1, 2], &PageRequest::default(), 2);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["meta"]["currentPage"], 1);
        assert_eq!(json["meta"]["totalPages"], 1);
        assert_eq!(json["meta"]["totalItems"], 2);
    }
}
