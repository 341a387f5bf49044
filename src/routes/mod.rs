use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod discounts;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod ratings;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/discounts", discounts::router())
        .nest("/wishlist", wishlist::router())
}
