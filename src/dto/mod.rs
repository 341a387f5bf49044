pub mod auth;
pub mod categories;
pub mod discounts;
pub mod products;
pub mod ratings;
pub mod wishlist;
