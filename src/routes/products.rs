use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::products::{
        AddImageRequest, CreateProductRequest, ImageList, ProductDetail, ProductList,
        ReduceStockRequest, UpdateProductRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Product, ProductImage},
    response::ApiResponse,
    routes::params::ProductQuery,
    routes::{discounts, ratings},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/stock/reduce", post(reduce_stock))
        .route("/{id}/images", get(list_images).post(add_image))
        .route("/{id}/images/{image_id}", axum::routing::delete(delete_image))
        .route(
            "/{id}/ratings",
            get(ratings::list_ratings)
                .post(ratings::create_rating)
                .put(ratings::update_rating)
                .delete(ratings::delete_rating),
        )
        .route(
            "/{id}/discounts",
            get(discounts::list_product_discounts).post(discounts::create_discount),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name and description"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("min_price" = Option<String>, Query, description = "Minimum list price"),
        ("max_price" = Option<String>, Query, description = "Maximum list price"),
        ("sort_by" = Option<String>, Query, description = "created_at, price or name"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "List products with effective prices", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product with effective price, images and discounts", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/stock/reduce",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ReduceStockRequest,
    responses(
        (status = 200, description = "Stock reduced", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn reduce_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReduceStockRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::reduce_stock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/images",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "List product images", body = ApiResponse<ImageList>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ImageList>>> {
    let resp = product_service::list_images(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/images",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = AddImageRequest,
    responses(
        (status = 200, description = "Image added", body = ApiResponse<ProductImage>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn add_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddImageRequest>,
) -> AppResult<Json<ApiResponse<ProductImage>>> {
    let resp = product_service::add_image(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/images/{image_id}",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("image_id" = Uuid, Path, description = "Image ID"),
    ),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Image not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_image(&state, &user, id, image_id).await?;
    Ok(Json(resp))
}
