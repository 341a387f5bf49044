use uuid::Uuid;

use crate::{
    dto::ratings::{CreateRatingRequest, RatingList, UpdateRatingRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Rating,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service::fetch_product,
    state::AppState,
};

pub async fn list_ratings(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<RatingList>> {
    fetch_product(&state.pool, product_id).await?;
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, Rating>(
        r#"
        SELECT * FROM ratings
        WHERE product_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM ratings WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::paged(page, limit, total.0);
    Ok(ApiResponse::paged("Ratings", RatingList { items }, meta))
}

pub async fn create_rating(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateRatingRequest,
) -> AppResult<ApiResponse<Rating>> {
    fetch_product(&state.pool, product_id).await?;
    validate_stars(payload.rating)?;

    // The (product, user) pair is unique; a second rating by the same user
    // is rejected rather than silently replacing the first.
    let rating = sqlx::query_as::<_, Rating>(
        r#"
        INSERT INTO ratings (id, product_id, user_id, rating, description)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (product_id, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(payload.description)
    .fetch_optional(&state.pool)
    .await?;

    let rating = match rating {
        Some(r) => r,
        None => {
            return Err(AppError::BadRequest(
                "You have already rated this product".into(),
            ));
        }
    };

    Ok(ApiResponse::ok(
        "Rating created",
        rating,
    ))
}

pub async fn update_rating(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateRatingRequest,
) -> AppResult<ApiResponse<Rating>> {
    validate_stars(payload.rating)?;

    let rating = sqlx::query_as::<_, Rating>(
        r#"
        UPDATE ratings
        SET rating = $3, description = $4
        WHERE product_id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(payload.description)
    .fetch_optional(&state.pool)
    .await?;

    let rating = match rating {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::ok("Updated", rating))
}

pub async fn delete_rating(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM ratings WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::ok(
        "Deleted",
        serde_json::json!({}),
    ))
}

fn validate_stars(rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}
