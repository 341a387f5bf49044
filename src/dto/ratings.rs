use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Rating;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRatingRequest {
    /// Star rating, 1 through 5.
    pub rating: i32,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRatingRequest {
    pub rating: i32,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct RatingList {
    #[schema(value_type = Vec<Rating>)]
    pub items: Vec<Rating>,
}
