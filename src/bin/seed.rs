use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use axum_storefront_api::{config::AppConfig, db::create_pool, pricing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user", "user@example.com", "user123", "user").await?;
    seed_catalog(&pool, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn seed_catalog(pool: &sqlx::PgPool, admin_id: Uuid) -> anyhow::Result<()> {
    let category_id: Uuid = {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name, created_by)
            VALUES ($1, 'Electronics', $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(admin_id)
        .fetch_one(pool)
        .await?;
        row.0
    };

    let existing: (i64,) = sqlx::query_as("SELECT count(*) FROM products")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        return Ok(());
    }

    let product_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO products (id, name, description, price, stock_quantity, category_id, created_by)
        VALUES ($1, 'Demo Widget', 'A widget for trying the API', $2, 300, $3, $4)
        "#,
    )
    .bind(product_id)
    .bind(Decimal::from(100))
    .bind(category_id)
    .bind(admin_id)
    .execute(pool)
    .await?;

    let discount_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO discounts (id, name, discount_type, value, start_date, end_date, active)
        VALUES ($1, 'Launch promo', $2, $3, $4, $5, true)
        "#,
    )
    .bind(discount_id)
    .bind(pricing::PERCENTAGE)
    .bind(Decimal::from(10))
    .bind(Utc::now() - Duration::days(1))
    .bind(Utc::now() + Duration::days(30))
    .execute(pool)
    .await?;

    sqlx::query("INSERT INTO product_discounts (discount_id, product_id) VALUES ($1, $2)")
        .bind(discount_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(())
}
