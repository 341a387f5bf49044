pub mod auth_service;
pub mod category_service;
pub mod discount_service;
pub mod product_service;
pub mod rating_service;
pub mod wishlist_service;
