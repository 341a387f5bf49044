use rust_decimal::Decimal;
use uuid::Uuid;

use axum_storefront_api::{
    config::AppConfig,
    db::create_pool,
    dto::products::ReduceStockRequest,
    error::AppError,
    middleware::auth::AuthUser,
    services::product_service,
    state::AppState,
};

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run the stock race test."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-test-secret".into(),
        max_fixed_discount: Decimal::from(99_999),
    };

    Ok(Some(AppState { pool, config }))
}

async fn seed_product(state: &AppState, stock: i32) -> anyhow::Result<(AuthUser, Uuid)> {
    let user_id = Uuid::new_v4();
    let suffix = &user_id.to_string()[..8];
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role) VALUES ($1, $2, $3, 'x', 'admin')",
    )
    .bind(user_id)
    .bind(format!("racer-{suffix}"))
    .bind(format!("racer-{suffix}@example.com"))
    .execute(&state.pool)
    .await?;

    let category_id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name, created_by) VALUES ($1, $2, $3)")
        .bind(category_id)
        .bind(format!("Race {suffix}"))
        .bind(user_id)
        .execute(&state.pool)
        .await?;

    let product_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO products (id, name, price, stock_quantity, category_id, created_by)
        VALUES ($1, 'Contended widget', $2, $3, $4, $5)
        "#,
    )
    .bind(product_id)
    .bind(Decimal::from(10))
    .bind(stock)
    .bind(category_id)
    .bind(user_id)
    .execute(&state.pool)
    .await?;

    Ok((
        AuthUser {
            user_id,
            role: "admin".into(),
        },
        product_id,
    ))
}

// Concurrent reductions whose quantities sum to the available stock must all
// succeed and drain the stock exactly; nothing may oversell.
#[tokio::test]
async fn concurrent_reductions_do_not_oversell() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let (user, product_id) = seed_product(&state, 100).await?;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let state = state.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            product_service::reduce_stock(&state, &user, product_id, ReduceStockRequest {
                quantity: 5,
            })
            .await
        }));
    }

    for handle in handles {
        handle.await??;
    }

    let remaining: (i32,) =
        sqlx::query_as("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(remaining.0, 0);

    let extra = product_service::reduce_stock(&state, &user, product_id, ReduceStockRequest {
        quantity: 1,
    })
    .await;
    assert!(matches!(extra, Err(AppError::InsufficientStock { .. })));

    Ok(())
}

// More contenders than stock: exactly `stock` of them may win.
#[tokio::test]
async fn oversubscribed_reductions_fail_cleanly() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let (user, product_id) = seed_product(&state, 10).await?;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let state = state.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            product_service::reduce_stock(&state, &user, product_id, ReduceStockRequest {
                quantity: 1,
            })
            .await
        }));
    }

    let mut won = 0;
    let mut lost = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => won += 1,
            Err(AppError::InsufficientStock { .. }) => lost += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(won, 10);
    assert_eq!(lost, 15);

    let remaining: (i32,) =
        sqlx::query_as("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(remaining.0, 0);

    Ok(())
}
