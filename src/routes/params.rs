use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

impl ProductSortBy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ProductSortBy::CreatedAt => "created_at",
            ProductSortBy::Price => "price",
            ProductSortBy::Name => "name",
        }
    }
}

// The pagination fields are declared inline rather than flattened from
// Pagination: serde's flatten buffers query values as strings, which the
// urlencoded deserializer then refuses to parse back into integers.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;

    use super::*;

    #[test]
    fn product_query_parses_pagination_and_filters() {
        let uri: Uri = "/api/products?page=2&per_page=10&q=widget&min_price=1.50&sort_by=price&sort_order=asc"
            .parse()
            .unwrap();
        let Query(query) = Query::<ProductQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(10));
        assert_eq!(query.q.as_deref(), Some("widget"));
        assert_eq!(query.min_price, Some(Decimal::new(150, 2)));
        assert!(matches!(query.sort_by, Some(ProductSortBy::Price)));
        assert!(matches!(query.sort_order, Some(SortOrder::Asc)));

        let (page, per_page, offset) = query.pagination().normalize();
        assert_eq!((page, per_page, offset), (2, 10, 10));
    }

    #[test]
    fn product_query_parses_with_no_parameters() {
        let uri: Uri = "/api/products".parse().unwrap();
        let Query(query) = Query::<ProductQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, None);
        assert_eq!(query.per_page, None);
        assert!(query.q.is_none());

        let (page, per_page, offset) = query.pagination().normalize();
        assert_eq!((page, per_page, offset), (1, 20, 0));
    }

    #[test]
    fn pagination_normalize_clamps_bounds() {
        let pagination = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(pagination.normalize(), (1, 100, 0));
    }
}
