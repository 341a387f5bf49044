use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddWishListRequest {
    pub product_id: Uuid,
}

/// A wishlist entry joined with the product it points at.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct WishListEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct WishList {
    #[schema(value_type = Vec<WishListEntry>)]
    pub items: Vec<WishListEntry>,
}
