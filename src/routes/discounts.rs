use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{patch, put},
};
use uuid::Uuid;

use crate::{
    dto::discounts::{CreateDiscountRequest, DiscountList, UpdateDiscountRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Discount,
    response::ApiResponse,
    services::discount_service,
    state::AppState,
};

// List/create live under /api/products/{id}/discounts (see the products
// router); lifecycle operations on a discount itself live here.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(update_discount).delete(delete_discount))
        .route(
            "/{id}/products/{product_id}",
            put(attach_product).delete(detach_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/discounts",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Discounts associated with the product", body = ApiResponse<DiscountList>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Discounts"
)]
pub async fn list_product_discounts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    let resp = discount_service::list_product_discounts(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/discounts",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = CreateDiscountRequest,
    responses(
        (status = 200, description = "Discount created and attached", body = ApiResponse<Discount>),
        (status = 400, description = "Invalid type, value or window"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn create_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateDiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::create_discount(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/discounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Discount ID")
    ),
    request_body = UpdateDiscountRequest,
    responses(
        (status = 200, description = "Discount updated", body = ApiResponse<Discount>),
        (status = 400, description = "Invalid type, value or window"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Discount not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn update_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::update_discount(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/discounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Discount ID")
    ),
    responses(
        (status = 200, description = "Discount deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Discount not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = discount_service::delete_discount(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/discounts/{id}/products/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Discount ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Discount attached to product"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Discount or product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn attach_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = discount_service::attach_product(&state, &user, id, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/discounts/{id}/products/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Discount ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Discount detached from product"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Association not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn detach_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = discount_service::detach_product(&state, &user, id, product_id).await?;
    Ok(Json(resp))
}
