use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use axum_storefront_api::{
    config::AppConfig,
    db::create_pool,
    dto::{
        auth::{LoginRequest, RegisterRequest},
        categories::CreateCategoryRequest,
        discounts::{CreateDiscountRequest, UpdateDiscountRequest},
        products::{CreateProductRequest, ReduceStockRequest, UpdateProductRequest},
        ratings::CreateRatingRequest,
        wishlist::AddWishListRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{
        auth_service, category_service, discount_service, product_service, rating_service,
        wishlist_service,
    },
    state::AppState,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
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

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let suffix = &id.to_string()[..8];
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role) VALUES ($1, $2, $3, 'x', $4)",
    )
    .bind(id)
    .bind(format!("{role}-{suffix}"))
    .bind(format!("{role}-{suffix}@example.com"))
    .bind(role)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

async fn create_category(state: &AppState, admin: &AuthUser) -> anyhow::Result<Uuid> {
    let resp = category_service::create_category(
        state,
        admin,
        CreateCategoryRequest {
            name: format!("Category {}", Uuid::new_v4()),
        },
    )
    .await?;
    Ok(resp.data.unwrap().id)
}

async fn create_product(
    state: &AppState,
    owner: &AuthUser,
    category_id: Uuid,
    price: &str,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let resp = product_service::create_product(
        state,
        owner,
        CreateProductRequest {
            name: format!("Product {}", Uuid::new_v4()),
            description: Some("integration test product".into()),
            price: dec(price),
            stock_quantity: stock,
            category_id,
        },
    )
    .await?;
    Ok(resp.data.unwrap().id)
}

fn promo(discount_type: &str, value: &str) -> CreateDiscountRequest {
    CreateDiscountRequest {
        name: "promo".into(),
        discount_type: discount_type.into(),
        value: dec(value),
        start_date: Utc::now() - Duration::hours(1),
        end_date: Utc::now() + Duration::hours(1),
        active: Some(true),
    }
}

#[tokio::test]
async fn register_and_login_round_trip() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let suffix = &Uuid::new_v4().to_string()[..8];
    let username = format!("alice-{suffix}");
    let resp = auth_service::register_user(
        &state,
        RegisterRequest {
            username: username.clone(),
            email: format!("{username}@example.com"),
            password: "s3cret-pass".into(),
        },
    )
    .await?;
    let user = resp.data.unwrap();
    assert_eq!(user.username, username);
    assert_eq!(user.role, "user");

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            username: username.clone(),
            password: "s3cret-pass".into(),
        },
    )
    .await?;
    assert!(login.data.unwrap().token.starts_with("Bearer "));

    let bad = auth_service::login_user(
        &state,
        LoginRequest {
            username,
            password: "wrong".into(),
        },
    )
    .await;
    assert!(matches!(bad, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn effective_price_reflects_discount_lifecycle() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let admin = create_user(&state, "admin").await?;
    let category_id = create_category(&state, &admin).await?;
    let product_id = create_product(&state, &admin, category_id, "100.00", 10).await?;

    // No discount yet.
    let detail = product_service::get_product(&state, product_id).await?;
    assert_eq!(detail.data.unwrap().product.effective_price, dec("100.00"));

    // Active 10% discount inside its window.
    let discount = discount_service::create_discount(
        &state,
        &admin,
        product_id,
        promo("percentage", "10"),
    )
    .await?;
    let discount_id = discount.data.unwrap().id;

    let detail = product_service::get_product(&state, product_id).await?;
    assert_eq!(detail.data.unwrap().product.effective_price, dec("90.00"));

    // Toggling the discount inactive restores the list price; the discount
    // itself is never deleted.
    discount_service::update_discount(
        &state,
        &admin,
        discount_id,
        UpdateDiscountRequest {
            name: None,
            discount_type: None,
            value: None,
            start_date: None,
            end_date: None,
            active: Some(false),
        },
    )
    .await?;

    let detail = product_service::get_product(&state, product_id).await?;
    let detail = detail.data.unwrap();
    assert_eq!(detail.product.effective_price, dec("100.00"));
    assert_eq!(detail.discounts.len(), 1);

    Ok(())
}

#[tokio::test]
async fn fixed_discount_larger_than_price_floors_at_zero() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let admin = create_user(&state, "admin").await?;
    let category_id = create_category(&state, &admin).await?;
    let product_id = create_product(&state, &admin, category_id, "100.00", 10).await?;

    discount_service::create_discount(&state, &admin, product_id, promo("fixed", "150")).await?;

    let detail = product_service::get_product(&state, product_id).await?;
    assert_eq!(detail.data.unwrap().product.effective_price, dec("0.00"));

    Ok(())
}

#[tokio::test]
async fn discount_validation_rejects_bad_input() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let admin = create_user(&state, "admin").await?;
    let user = create_user(&state, "user").await?;
    let category_id = create_category(&state, &admin).await?;
    let product_id = create_product(&state, &admin, category_id, "100.00", 10).await?;

    let over_100 =
        discount_service::create_discount(&state, &admin, product_id, promo("percentage", "101"))
            .await;
    assert!(matches!(over_100, Err(AppError::BadRequest(_))));

    let bad_type =
        discount_service::create_discount(&state, &admin, product_id, promo("bogo", "10")).await;
    assert!(matches!(bad_type, Err(AppError::BadRequest(_))));

    let mut inverted = promo("percentage", "10");
    inverted.start_date = Utc::now() + Duration::hours(2);
    inverted.end_date = Utc::now() + Duration::hours(1);
    let inverted = discount_service::create_discount(&state, &admin, product_id, inverted).await;
    assert!(matches!(inverted, Err(AppError::BadRequest(_))));

    // Non-admins cannot create discounts at all.
    let forbidden =
        discount_service::create_discount(&state, &user, product_id, promo("percentage", "10"))
            .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    Ok(())
}

#[tokio::test]
async fn product_update_clears_description_only_on_explicit_null() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let admin = create_user(&state, "admin").await?;
    let category_id = create_category(&state, &admin).await?;
    let product_id = create_product(&state, &admin, category_id, "100.00", 10).await?;

    // An update that omits the description leaves it alone.
    let untouched = product_service::update_product(
        &state,
        &admin,
        product_id,
        UpdateProductRequest {
            name: None,
            description: None,
            price: Some(dec("120.00")),
            stock_quantity: None,
            category_id: None,
        },
    )
    .await?;
    let untouched = untouched.data.unwrap();
    assert_eq!(untouched.price, dec("120.00"));
    assert_eq!(
        untouched.description.as_deref(),
        Some("integration test product")
    );

    // An explicit null clears it.
    let cleared = product_service::update_product(
        &state,
        &admin,
        product_id,
        UpdateProductRequest {
            name: None,
            description: Some(None),
            price: None,
            stock_quantity: None,
            category_id: None,
        },
    )
    .await?;
    assert_eq!(cleared.data.unwrap().description, None);

    Ok(())
}

#[tokio::test]
async fn stock_reduction_enforces_available_quantity() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let admin = create_user(&state, "admin").await?;
    let category_id = create_category(&state, &admin).await?;
    let product_id = create_product(&state, &admin, category_id, "100.00", 300).await?;

    let resp =
        product_service::reduce_stock(&state, &admin, product_id, ReduceStockRequest {
            quantity: 300,
        })
        .await?;
    assert_eq!(resp.data.unwrap().stock_quantity, 0);

    let short = product_service::reduce_stock(&state, &admin, product_id, ReduceStockRequest {
        quantity: 1,
    })
    .await;
    match short {
        Err(AppError::InsufficientStock { available }) => assert_eq!(available, 0),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // The failed reduction must not have touched the stored quantity.
    let detail = product_service::get_product(&state, product_id).await?;
    assert_eq!(detail.data.unwrap().product.stock_quantity, 0);

    Ok(())
}

#[tokio::test]
async fn one_rating_per_user_per_product() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let admin = create_user(&state, "admin").await?;
    let user = create_user(&state, "user").await?;
    let category_id = create_category(&state, &admin).await?;
    let product_id = create_product(&state, &admin, category_id, "100.00", 10).await?;

    let first = rating_service::create_rating(
        &state,
        &user,
        product_id,
        CreateRatingRequest {
            rating: 4,
            description: Some("nice".into()),
        },
    )
    .await?;
    assert_eq!(first.data.unwrap().rating, 4);

    let second = rating_service::create_rating(
        &state,
        &user,
        product_id,
        CreateRatingRequest {
            rating: 5,
            description: None,
        },
    )
    .await;
    assert!(matches!(second, Err(AppError::BadRequest(_))));

    let out_of_range = rating_service::create_rating(
        &state,
        &admin,
        product_id,
        CreateRatingRequest {
            rating: 6,
            description: None,
        },
    )
    .await;
    assert!(matches!(out_of_range, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn wishlist_add_is_idempotent_and_scoped_to_requester() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let admin = create_user(&state, "admin").await?;
    let user = create_user(&state, "user").await?;
    let category_id = create_category(&state, &admin).await?;
    let product_id = create_product(&state, &admin, category_id, "100.00", 10).await?;

    let first = wishlist_service::add_to_wishlist(
        &state,
        &user,
        AddWishListRequest { product_id },
    )
    .await?;
    let second = wishlist_service::add_to_wishlist(
        &state,
        &user,
        AddWishListRequest { product_id },
    )
    .await?;
    assert_eq!(first.data.unwrap().id, second.data.unwrap().id);

    let list = wishlist_service::list_wishlist(
        &state,
        &user,
        axum_storefront_api::routes::params::Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?;
    assert_eq!(list.data.unwrap().items.len(), 1);

    // Another user's wishlist is untouched.
    let other_list = wishlist_service::list_wishlist(
        &state,
        &admin,
        axum_storefront_api::routes::params::Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?;
    assert!(other_list.data.unwrap().items.is_empty());

    wishlist_service::remove_from_wishlist(&state, &user, product_id).await?;
    let gone = wishlist_service::remove_from_wishlist(&state, &user, product_id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    Ok(())
}
