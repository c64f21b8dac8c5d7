//! Limit/offset pagination

use serde::Deserialize;

/// Maximum items per page
const MAX_LIMIT: i64 = 100;

/// Default items per page
const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Limit is clamped to 1..=100, offset to at least 0.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset: offset.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Query parameters for pagination
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<PaginationParams> for Pagination {
    fn from(p: PaginationParams) -> Self {
        Self::new(p.limit.unwrap_or(DEFAULT_LIMIT), p.offset.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_values() {
        assert_eq!(Pagination::new(0, -5), Pagination { limit: 1, offset: 0 });
        assert_eq!(Pagination::new(500, 40).limit, 100);
    }

    #[test]
    fn defaults() {
        let page = Pagination::from(PaginationParams::default());
        assert_eq!(page, Pagination::default());
        assert_eq!(page.limit, 20);
    }
}
