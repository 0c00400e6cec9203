use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: i64 = 12;
pub const MAX_LIMIT: i64 = 100;

/// Validated paging window: `page >= 1`, `limit` clamped to `[1, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub limit: i64,
    pub skip: u64,
}

impl PageParams {
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE as i64).max(1) as u64;
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        PageParams {
            page,
            limit,
            // page comes straight from the query string; an absurd value
            // must saturate, not wrap
            skip: (page - 1).saturating_mul(limit as u64),
        }
    }
}

/// Pagination envelope block, serialized alongside `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(total_items: u64, params: PageParams) -> Self {
        let total_pages = total_items.div_ceil(params.limit as u64);
        PaginationMeta {
            current_page: params.page,
            total_pages,
            total_items,
            items_per_page: params.limit,
            has_next_page: params.page < total_pages,
            has_previous_page: params.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let p = PageParams::from_query(None, None);
        assert_eq!(p, PageParams { page: 1, limit: 12, skip: 0 });
    }

    #[test]
    fn limit_clamped_to_bounds() {
        assert_eq!(PageParams::from_query(None, Some(500)).limit, 100);
        assert_eq!(PageParams::from_query(None, Some(0)).limit, 1);
        assert_eq!(PageParams::from_query(None, Some(-3)).limit, 1);
    }

    #[test]
    fn page_below_one_is_treated_as_one() {
        let p = PageParams::from_query(Some(0), Some(10));
        assert_eq!(p.page, 1);
        assert_eq!(p.skip, 0);
        assert_eq!(PageParams::from_query(Some(-2), Some(10)).page, 1);
    }

    #[test]
    fn skip_is_page_minus_one_times_limit() {
        let p = PageParams::from_query(Some(3), Some(25));
        assert_eq!(p.skip, 50);
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let p = PageParams::from_query(Some(i64::MAX), Some(100));
        assert_eq!(p.page, i64::MAX as u64);
        assert_eq!(p.skip, u64::MAX);
    }

    #[test]
    fn metadata_flags() {
        let m = PaginationMeta::new(25, PageParams::from_query(Some(2), Some(10)));
        assert_eq!(m.total_pages, 3);
        assert!(m.has_next_page);
        assert!(m.has_previous_page);

        let last = PaginationMeta::new(25, PageParams::from_query(Some(3), Some(10)));
        assert!(!last.has_next_page);

        let empty = PaginationMeta::new(0, PageParams::from_query(None, None));
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_previous_page);
    }
}
