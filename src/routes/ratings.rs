use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    dto::ratings::{CreateRatingRequest, RatingList, UpdateRatingRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Rating,
    response::ApiResponse,
    routes::params::Pagination,
    services::rating_service,
    state::AppState,
};

// Mounted under /api/products/{id}/ratings by the products router.

#[utoipa::path(
    get,
    path = "/api/products/{id}/ratings",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List ratings, newest first", body = ApiResponse<RatingList>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Ratings"
)]
pub async fn list_ratings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<RatingList>>> {
    let resp = rating_service::list_ratings(&state, id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/ratings",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = CreateRatingRequest,
    responses(
        (status = 200, description = "Rating created", body = ApiResponse<Rating>),
        (status = 400, description = "Out of range or already rated"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn create_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateRatingRequest>,
) -> AppResult<Json<ApiResponse<Rating>>> {
    let resp = rating_service::create_rating(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/ratings",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateRatingRequest,
    responses(
        (status = 200, description = "Rating updated", body = ApiResponse<Rating>),
        (status = 404, description = "No rating by this user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn update_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRatingRequest>,
) -> AppResult<Json<ApiResponse<Rating>>> {
    let resp = rating_service::update_rating(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/ratings",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Rating deleted"),
        (status = 404, description = "No rating by this user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn delete_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = rating_service::delete_rating(&state, &user, id).await?;
    Ok(Json(resp))
}
