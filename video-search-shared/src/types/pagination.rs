//! Page/perPage pagination shared by the read surface and the query engine.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;
/// Deepest result position a search backend serves (`from + size`).
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Builds a pagination from optional inputs, applying defaults and validating ranges.
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Result<Self, String> {
        let pagination = Self {
            page: page.unwrap_or(DEFAULT_PAGE),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE),
        };
        pagination.validate()?;
        Ok(pagination)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be greater than or equal to 1".to_string());
        }
        if self.per_page < 1 || self.per_page > MAX_PER_PAGE {
            return Err(format!(
                "perPage must be between 1 and {}",
                MAX_PER_PAGE
            ));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    /// Whether the requested page lies inside the window a backend can serve. Pages past it
    /// are answered empty.
    pub fn within_result_window(&self) -> bool {
        self.offset().saturating_add(self.limit()) <= MAX_RESULT_WINDOW
    }

    /// Number of pages needed to hold `total_hits` results.
    pub fn total_pages(&self, total_hits: u64) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        total_hits.div_ceil(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::new(None, None).unwrap();
        assert_eq!(p, Pagination::default());
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_offset_and_total_pages() {
        let p = Pagination::new(Some(3), Some(10)).unwrap();
        assert_eq!(p.offset(), 20);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(21), 3);
    }

    #[test]
    fn test_result_window() {
        assert!(Pagination::new(Some(100), Some(100)).unwrap().within_result_window());
        assert!(!Pagination::new(Some(101), Some(100)).unwrap().within_result_window());
        assert!(!Pagination::new(Some(u64::MAX), Some(100)).unwrap().within_result_window());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert!(Pagination::new(None, Some(101)).is_err());
        assert!(Pagination::new(None, Some(100)).is_ok());
    }
}
