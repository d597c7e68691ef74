//! Pagination bounds for list endpoints
//!
//! Query strings carry signed integers; the window is validated here, at the
//! HTTP boundary, before the query engine sees it.

use crate::error::ApiError;

/// Items per page when `limit` is not given
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest accepted `limit`
pub const MAX_LIMIT: i64 = 100;

/// Validated `skip`/`limit` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: usize,
    pub limit: usize,
}

impl PageWindow {
    /// Accepts `skip >= 0` and `1 <= limit <= MAX_LIMIT`
    ///
    /// # Examples
    /// ```
    /// use dongjeop_api::pagination::PageWindow;
    ///
    /// let w = PageWindow::new(40, 20).unwrap();
    /// assert_eq!(w.skip, 40);
    /// assert_eq!(w.limit, 20);
    ///
    /// assert!(PageWindow::new(0, 0).is_err());
    /// assert!(PageWindow::new(-1, 10).is_err());
    /// ```
    pub fn new(skip: i64, limit: i64) -> Result<Self, ApiError> {
        if skip < 0 {
            return Err(ApiError::BadRequest(format!(
                "skip must be >= 0 (got {})",
                skip
            )));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {} (got {})",
                MAX_LIMIT, limit
            )));
        }

        Ok(Self {
            skip: skip as usize,
            limit: limit as usize,
        })
    }
}
