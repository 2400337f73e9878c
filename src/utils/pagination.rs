use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::Attendance;
use crate::model::leave_request::LeaveRequest;

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;
/// Keeps `page * per_page` within a MySQL signed OFFSET.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PER_PAGE;

/// 1-based page window clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Whether another page exists after this one, for infinite scroll.
    pub fn has_more(&self, total: i64) -> bool {
        let total = u64::try_from(total).unwrap_or(0);
        self.page.saturating_mul(self.per_page) < total
    }

    pub fn into_page<T>(self, data: Vec<T>, total: i64) -> Page<T> {
        Page {
            has_more: self.has_more(total),
            data,
            page: self.page,
            per_page: self.per_page,
            total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(LeavePage = Page<LeaveRequest>, AttendancePage = Page<Attendance>)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_inputs() {
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, per_page: 10 });
        assert_eq!(Pagination::new(Some(0), Some(0)), Pagination { page: 1, per_page: 1 });
        assert_eq!(Pagination::new(Some(3), Some(500)).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn huge_page_numbers_are_capped() {
        let p = Pagination::new(Some(u64::MAX), Some(MAX_PER_PAGE));
        assert_eq!(p.page, MAX_PAGE);
        assert!(p.offset() <= i64::MAX as u64);
        assert!(!p.has_more(5));

        let p = Pagination::new(Some(u64::MAX / 2), Some(100));
        assert!(!p.has_more(5));
    }

    #[test]
    fn offset_and_has_more() {
        let p = Pagination::new(Some(3), Some(10));
        assert_eq!(p.offset(), 20);
        assert!(p.has_more(31));
        assert!(!p.has_more(30));
        assert!(!p.has_more(-1));
    }

    #[test]
    fn builds_page() {
        let page = Pagination::new(Some(1), Some(2)).into_page(vec![1, 2], 5);
        assert_eq!(page.data, vec![1, 2]);
        assert!(page.has_more);
    }
}
