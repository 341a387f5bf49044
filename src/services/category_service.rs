use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories ORDER BY name LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM categories")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::paged(page, limit, total.0);
    Ok(ApiResponse::paged("Categories", CategoryList { items }, meta))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let category = match category {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::ok("Category", category))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name cannot be empty".into()));
    }

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind(name.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Category name already exists".into()));
    }

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, created_by) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Category created",
        category,
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name cannot be empty".into()));
    }

    let taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM categories WHERE name = $1 AND id <> $2")
            .bind(name.as_str())
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Category name already exists".into()));
    }

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(&state.pool)
    .await?;
    let category = match category {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_update",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok("Updated", category))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Deleted",
        serde_json::json!({}),
    ))
}
