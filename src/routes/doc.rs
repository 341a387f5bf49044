use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth as auth_dto, categories as category_dto, discounts as discount_dto,
        products as product_dto, ratings as rating_dto, wishlist as wishlist_dto,
    },
    models::{Category, Discount, Product, ProductImage, Rating, User, WishListItem},
    response::{ApiResponse, Meta},
    routes::{auth, categories, discounts, health, params, products, ratings, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::reduce_stock,
        products::list_images,
        products::add_image,
        products::delete_image,
        ratings::list_ratings,
        ratings::create_rating,
        ratings::update_rating,
        ratings::delete_rating,
        discounts::list_product_discounts,
        discounts::create_discount,
        discounts::update_discount,
        discounts::delete_discount,
        discounts::attach_product,
        discounts::detach_product,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            Discount,
            ProductImage,
            Rating,
            WishListItem,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            category_dto::CreateCategoryRequest,
            category_dto::UpdateCategoryRequest,
            category_dto::CategoryList,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::ReduceStockRequest,
            product_dto::AddImageRequest,
            product_dto::ProductResponse,
            product_dto::ProductDetail,
            product_dto::ProductList,
            product_dto::ImageList,
            discount_dto::CreateDiscountRequest,
            discount_dto::UpdateDiscountRequest,
            discount_dto::DiscountList,
            rating_dto::CreateRatingRequest,
            rating_dto::UpdateRatingRequest,
            rating_dto::RatingList,
            wishlist_dto::AddWishListRequest,
            wishlist_dto::WishListEntry,
            wishlist_dto::WishList,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<product_dto::ProductList>,
            ApiResponse<product_dto::ProductDetail>,
            ApiResponse<category_dto::CategoryList>,
            ApiResponse<discount_dto::DiscountList>,
            ApiResponse<rating_dto::RatingList>,
            ApiResponse<wishlist_dto::WishList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product, stock and image endpoints"),
        (name = "Discounts", description = "Discount endpoints"),
        (name = "Ratings", description = "Rating endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
