use serde::Serialize;
use utoipa::ToSchema;

/// Pagination metadata attached to list responses.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Meta {
    pub fn paged(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta: None,
        }
    }

    pub fn paged(message: impl Into<String>, data: T, meta: Meta) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta: Some(meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paged_meta_rounds_total_pages_up() {
        assert_eq!(Meta::paged(1, 20, 41).total_pages, 3);
        assert_eq!(Meta::paged(2, 20, 40).total_pages, 2);
        assert_eq!(Meta::paged(1, 20, 0).total_pages, 0);
    }

    #[test]
    fn plain_response_carries_no_meta() {
        let resp = ApiResponse::ok("Created", serde_json::json!({ "id": 1 }));
        let body = serde_json::to_value(&resp).unwrap();
        assert_eq!(body["message"], "Created");
        assert_eq!(body["data"]["id"], 1);
        assert!(body["meta"].is_null());
    }
}
