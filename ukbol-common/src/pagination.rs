//! Pagination utilities
//!
//! Pages are 1-indexed. Out-of-range `page` and `per_page` values are clamped
//! rather than rejected.

/// Page size used when the caller does not ask for one
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest page size a caller may request
pub const MAX_PER_PAGE: i64 = 100;

/// Sanitized paging window for a LIMIT/OFFSET query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page after clamping
    pub per_page: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

impl Pagination {
    /// Build a paging window from optional caller parameters
    ///
    /// # Examples
    /// ```
    /// use ukbol_common::pagination::Pagination;
    ///
    /// // page 3 of size 2 starts at zero-based offset 4
    /// let p = Pagination::new(Some(3), Some(2));
    /// assert_eq!(p.offset, 4);
    ///
    /// // oversized pages are clamped
    /// let p = Pagination::new(None, Some(5000));
    /// assert_eq!(p.page, 1);
    /// assert_eq!(p.per_page, 100);
    /// ```
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = clamp(per_page.unwrap_or(DEFAULT_PER_PAGE), 1, MAX_PER_PAGE);
        Self {
            page,
            per_page,
            offset: (page - 1).saturating_mul(per_page),
        }
    }
}

/// Clamp `value` into `[minimum, maximum]`
pub fn clamp(value: i64, minimum: i64, maximum: i64) -> i64 {
    value.min(maximum).max(minimum)
}
