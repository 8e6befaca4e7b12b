use mindnest_types::api::Pagination;

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;
/// Highest page whose offset still fits SQLite's signed 64-bit OFFSET.
const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    /// `page` is clamped to `1..=MAX_PAGE`; `limit` is clamped to `1..=100`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = (page.unwrap_or(1).max(1) as u64).min(MAX_PAGE);
        let limit = limit
            .map(|l| l.clamp(1, MAX_LIMIT as i64) as u64)
            .unwrap_or(DEFAULT_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination {
            total,
            page: self.page,
            pages: total.div_ceil(self.limit),
        }
    }
}
