use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Discount, Product, ProductImage};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    // An omitted description keeps the stored value, an explicit null clears
    // it; a single Option cannot tell the two apart.
    #[serde(default, deserialize_with = "nested_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[schema(value_type = Option<String>, example = "100.00")]
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<Uuid>,
}

fn nested_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReduceStockRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddImageRequest {
    pub image_url: String,
}

/// A product as returned to clients: the stored record plus the price after
/// discount resolution at request time.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    #[schema(value_type = String, example = "90.00")]
    pub effective_price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn from_product(product: Product, effective_price: Decimal) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            effective_price,
            stock_quantity: product.stock_quantity,
            category_id: product.category_id,
            created_by: product.created_by,
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub images: Vec<ProductImage>,
    pub discounts: Vec<Discount>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductResponse>)]
    pub items: Vec<ProductResponse>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ImageList {
    #[schema(value_type = Vec<ProductImage>)]
    pub items: Vec<ProductImage>,
}
