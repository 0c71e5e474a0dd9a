use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

#[allow(dead_code)]
impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }

    pub fn err(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            data: None,
        }
    }
}

/// Pagination envelope. Field names are part of the API contract.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(page, limit, total),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_basic() {
        let p = Pagination::new(1, 20, 100);
        assert_eq!(p.total_pages, 5);
    }

    #[test]
    fn total_pages_with_remainder() {
        let p = Pagination::new(1, 20, 101);
        assert_eq!(p.total_pages, 6);
    }

    #[test]
    fn total_pages_zero_limit() {
        let p = Pagination::new(1, 0, 10);
        assert_eq!(p.total_pages, 0);
    }

    #[test]
    fn first_page_has_no_prev() {
        let p = Pagination::new(1, 20, 100);
        assert!(p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn last_page_has_no_next() {
        let p = Pagination::new(5, 20, 100);
        assert!(!p.has_next_page);
        assert!(p.has_prev_page);
    }

    #[test]
    fn middle_page_has_both() {
        let p = Pagination::new(3, 20, 100);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(2, 10, 35)).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["totalPages"], 4);
        assert_eq!(json["totalItems"], 35);
        assert_eq!(json["itemsPerPage"], 10);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPrevPage"], true);
    }
}
