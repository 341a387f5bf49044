use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::wishlist::{AddWishListRequest, WishList, WishListEntry},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::WishListItem,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WishList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, WishListEntry>(
        r#"
        SELECT w.id, w.product_id, p.name AS product_name, w.created_at
        FROM wishlist_items w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM wishlist_items WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::paged(page, limit, total.0);
    Ok(ApiResponse::paged("Wishlist", WishList { items }, meta))
}

/// Entries are only ever created for the authenticated requester; the target
/// user never comes from the payload.
pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: AddWishListRequest,
) -> AppResult<ApiResponse<WishListItem>> {
    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;

    if product_exists.is_none() {
        return Err(AppError::BadRequest("Product not found".into()));
    }

    // Re-adding the same product is a no-op returning the existing entry.
    let existing: Option<WishListItem> = sqlx::query_as(
        "SELECT * FROM wishlist_items WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user.user_id)
    .bind(payload.product_id)
    .fetch_optional(&state.pool)
    .await?;

    let item = if let Some(item) = existing {
        item
    } else {
        sqlx::query_as::<_, WishListItem>(
            r#"
            INSERT INTO wishlist_items (id, user_id, product_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(payload.product_id)
        .fetch_one(&state.pool)
        .await?
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "wishlist_add",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": payload.product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Added to wishlist",
        item,
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "wishlist_remove",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Removed from wishlist",
        serde_json::json!({}),
    ))
}
