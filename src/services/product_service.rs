use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{
        AddImageRequest, CreateProductRequest, ImageList, ProductDetail, ProductList,
        ProductResponse, ReduceStockRequest, UpdateProductRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{Discount, Product, ProductImage},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let ProductQuery {
        q,
        category_id,
        min_price,
        max_price,
        sort_by,
        sort_order,
        ..
    } = query;

    let push_filters = |qb: &mut QueryBuilder<Postgres>| {
        if let Some(search) = q.as_ref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(min_price) = min_price {
            qb.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = max_price {
            qb.push(" AND price <= ").push_bind(max_price);
        }
    };

    let mut count_qb = QueryBuilder::new("SELECT count(*) FROM products WHERE 1=1");
    push_filters(&mut count_qb);
    let total: (i64,) = count_qb
        .build_query_as()
        .fetch_one(&state.pool)
        .await?;

    let sort_by = sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = sort_order.unwrap_or(SortOrder::Desc);

    let mut qb = QueryBuilder::new("SELECT * FROM products WHERE 1=1");
    push_filters(&mut qb);
    // Sort column and direction come from a closed enum, never from raw input.
    qb.push(" ORDER BY ")
        .push(sort_by.as_sql())
        .push(" ")
        .push(sort_order.as_sql())
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let products: Vec<Product> = qb.build_query_as().fetch_all(&state.pool).await?;

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut discounts_by_product = discounts_for_products(&state.pool, &ids).await?;

    let now = Utc::now();
    let items = products
        .into_iter()
        .map(|product| {
            let discounts = discounts_by_product
                .remove(&product.id)
                .unwrap_or_default();
            let effective = pricing::effective_price(product.price, &discounts, now);
            ProductResponse::from_product(product, effective)
        })
        .collect();

    let meta = Meta::paged(page, limit, total.0);
    Ok(ApiResponse::paged("Products", ProductList { items }, meta))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = fetch_product(&state.pool, id).await?;
    let discounts = discounts_for_product(&state.pool, id).await?;
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = $1 ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    let effective = pricing::effective_price(product.price, &discounts, Utc::now());
    let detail = ProductDetail {
        product: ProductResponse::from_product(product, effective),
        images,
        discounts,
    };
    Ok(ApiResponse::ok("Product", detail))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    validate_name(&payload.name)?;
    validate_price(payload.price)?;
    validate_stock(payload.stock_quantity)?;

    let category: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(payload.category_id)
        .fetch_optional(&state.pool)
        .await?;
    if category.is_none() {
        return Err(AppError::BadRequest("Category not found".into()));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, name, description, price, stock_quantity, category_id, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.stock_quantity)
    .bind(payload.category_id)
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Product created",
        product,
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = fetch_product(&state.pool, id).await?;
    ensure_owner_or_admin(user, existing.created_by)?;

    let name = payload.name.unwrap_or(existing.name);
    validate_name(&name)?;
    let description = payload.description.unwrap_or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    validate_price(price)?;
    let stock_quantity = payload.stock_quantity.unwrap_or(existing.stock_quantity);
    validate_stock(stock_quantity)?;
    let category_id = payload.category_id.unwrap_or(existing.category_id);

    let category: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(&state.pool)
        .await?;
    if category.is_none() {
        return Err(AppError::BadRequest("Category not found".into()));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, stock_quantity = $5, category_id = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(stock_quantity)
    .bind(category_id)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok("Updated", product))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = fetch_product(&state.pool, id).await?;
    ensure_owner_or_admin(user, existing.created_by)?;

    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
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

/// Decrement stock as a single conditional UPDATE so that concurrent
/// reductions against the same product cannot oversell: the store either
/// applies the whole decrement or none of it.
pub async fn reduce_stock(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReduceStockRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be positive".into()));
    }

    let updated = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - $2
        WHERE id = $1 AND stock_quantity >= $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.quantity)
    .fetch_optional(&state.pool)
    .await?;

    let product = match updated {
        Some(p) => p,
        None => {
            // Either the product does not exist or the stock was short;
            // a second read distinguishes the two for the caller.
            let current = fetch_product(&state.pool, id).await?;
            return Err(AppError::InsufficientStock {
                available: current.stock_quantity,
            });
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "stock_reduce",
        Some("products"),
        Some(serde_json::json!({ "product_id": id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Stock reduced",
        product,
    ))
}

pub async fn list_images(state: &AppState, product_id: Uuid) -> AppResult<ApiResponse<ImageList>> {
    fetch_product(&state.pool, product_id).await?;
    let items = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = $1 ORDER BY created_at",
    )
    .bind(product_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok("Images", ImageList { items }))
}

pub async fn add_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AddImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    let product = fetch_product(&state.pool, product_id).await?;
    ensure_owner_or_admin(user, product.created_by)?;

    if payload.image_url.trim().is_empty() {
        return Err(AppError::BadRequest("Image URL cannot be empty".into()));
    }

    let image = sqlx::query_as::<_, ProductImage>(
        "INSERT INTO product_images (id, product_id, image_url) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(payload.image_url)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::ok(
        "Image added",
        image,
    ))
}

pub async fn delete_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    image_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = fetch_product(&state.pool, product_id).await?;
    ensure_owner_or_admin(user, product.created_by)?;

    let result = sqlx::query("DELETE FROM product_images WHERE id = $1 AND product_id = $2")
        .bind(image_id)
        .bind(product_id)
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

pub async fn fetch_product(pool: &DbPool, id: Uuid) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    product.ok_or(AppError::NotFound)
}

pub async fn discounts_for_product(pool: &DbPool, product_id: Uuid) -> AppResult<Vec<Discount>> {
    let discounts = sqlx::query_as::<_, Discount>(
        r#"
        SELECT d.*
        FROM discounts d
        JOIN product_discounts pd ON pd.discount_id = d.id
        WHERE pd.product_id = $1
        ORDER BY d.id
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(discounts)
}

async fn discounts_for_products(
    pool: &DbPool,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Discount>>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    #[derive(sqlx::FromRow)]
    struct Row {
        product_id: Uuid,
        #[sqlx(flatten)]
        discount: Discount,
    }

    let rows = sqlx::query_as::<_, Row>(
        r#"
        SELECT pd.product_id, d.*
        FROM discounts d
        JOIN product_discounts pd ON pd.discount_id = d.id
        WHERE pd.product_id = ANY($1)
        "#,
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Discount>> = HashMap::new();
    for row in rows {
        grouped.entry(row.product_id).or_default().push(row.discount);
    }
    Ok(grouped)
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Product name cannot be empty or whitespace".into(),
        ));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> AppResult<()> {
    if price < Decimal::ZERO {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    Ok(())
}

fn validate_stock(stock_quantity: i32) -> AppResult<()> {
    if stock_quantity < 0 {
        return Err(AppError::BadRequest(
            "Stock quantity cannot be less than zero".into(),
        ));
    }
    Ok(())
}
