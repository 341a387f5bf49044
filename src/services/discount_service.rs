use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::discounts::{CreateDiscountRequest, DiscountList, UpdateDiscountRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Discount,
    pricing,
    response::ApiResponse,
    services::product_service::{discounts_for_product, fetch_product},
    state::AppState,
};

pub async fn list_product_discounts(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<DiscountList>> {
    fetch_product(&state.pool, product_id).await?;
    let items = discounts_for_product(&state.pool, product_id).await?;
    Ok(ApiResponse::ok("Discounts", DiscountList { items }))
}

pub async fn create_discount(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;
    fetch_product(&state.pool, product_id).await?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Discount name cannot be empty".into()));
    }
    validate_discount(
        state,
        &payload.discount_type,
        payload.value,
        payload.start_date,
        payload.end_date,
    )?;

    let mut txn = state.pool.begin().await?;

    let discount = sqlx::query_as::<_, Discount>(
        r#"
        INSERT INTO discounts (id, name, discount_type, value, start_date, end_date, active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.discount_type)
    .bind(payload.value)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.active.unwrap_or(true))
    .fetch_one(&mut *txn)
    .await?;

    sqlx::query("INSERT INTO product_discounts (discount_id, product_id) VALUES ($1, $2)")
        .bind(discount.id)
        .bind(product_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_create",
        Some("discounts"),
        Some(serde_json::json!({ "discount_id": discount.id, "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Discount created",
        discount,
    ))
}

pub async fn update_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;
    let existing = sqlx::query_as::<_, Discount>("SELECT * FROM discounts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = match existing {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };

    let name = payload.name.unwrap_or(existing.name);
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Discount name cannot be empty".into()));
    }
    let discount_type = payload.discount_type.unwrap_or(existing.discount_type);
    let value = payload.value.unwrap_or(existing.value);
    let start_date = payload.start_date.unwrap_or(existing.start_date);
    let end_date = payload.end_date.unwrap_or(existing.end_date);
    let active = payload.active.unwrap_or(existing.active);

    // The merged record is validated as a whole, a PATCH cannot leave a
    // discount in a state creation would have rejected.
    validate_discount(state, &discount_type, value, start_date, end_date)?;

    let discount = sqlx::query_as::<_, Discount>(
        r#"
        UPDATE discounts
        SET name = $2, discount_type = $3, value = $4, start_date = $5, end_date = $6, active = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(discount_type)
    .bind(value)
    .bind(start_date)
    .bind(end_date)
    .bind(active)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_update",
        Some("discounts"),
        Some(serde_json::json!({ "discount_id": discount.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok("Updated", discount))
}

pub async fn delete_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = sqlx::query("DELETE FROM discounts WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_delete",
        Some("discounts"),
        Some(serde_json::json!({ "discount_id": id })),
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

/// Associate an existing discount with another product. Idempotent.
pub async fn attach_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM discounts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }
    fetch_product(&state.pool, product_id).await?;

    sqlx::query(
        r#"
        INSERT INTO product_discounts (discount_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(id)
    .bind(product_id)
    .execute(&state.pool)
    .await?;

    Ok(ApiResponse::ok(
        "Discount attached",
        serde_json::json!({}),
    ))
}

pub async fn detach_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result =
        sqlx::query("DELETE FROM product_discounts WHERE discount_id = $1 AND product_id = $2")
            .bind(id)
            .bind(product_id)
            .execute(&state.pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::ok(
        "Discount detached",
        serde_json::json!({}),
    ))
}

fn validate_discount(
    state: &AppState,
    discount_type: &str,
    value: Decimal,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> AppResult<()> {
    if !pricing::is_valid_discount_type(discount_type) {
        return Err(AppError::BadRequest(
            "Discount type must be 'percentage' or 'fixed'".into(),
        ));
    }
    if value < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Discount value cannot be negative".into(),
        ));
    }
    if discount_type == pricing::PERCENTAGE && value > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(
            "Percentage discount cannot exceed 100".into(),
        ));
    }
    if discount_type == pricing::FIXED && value > state.config.max_fixed_discount {
        return Err(AppError::BadRequest(format!(
            "Fixed discount cannot exceed {}",
            state.config.max_fixed_discount
        )));
    }
    if start_date > end_date {
        return Err(AppError::BadRequest(
            "Discount start date must not be after its end date".into(),
        ));
    }
    Ok(())
}
