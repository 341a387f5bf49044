use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Discount;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    pub name: String,
    /// `percentage` or `fixed`.
    pub discount_type: String,
    #[schema(value_type = String, example = "10.00")]
    pub value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDiscountRequest {
    pub name: Option<String>,
    pub discount_type: Option<String>,
    #[schema(value_type = Option<String>, example = "10.00")]
    pub value: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct DiscountList {
    #[schema(value_type = Vec<Discount>)]
    pub items: Vec<Discount>,
}
