//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /api/products                 - Product list (?category=, ?featured=true)
//! GET    /api/products/{slug}          - Product detail with reviews
//! GET    /api/product                  - Product list
//! POST   /api/product                  - Validate a product submission
//! POST   /api/products/{id}/reviews    - Add a review
//! PATCH  /api/reviews/{id}             - Edit a review
//! DELETE /api/reviews/{id}             - Delete a review
//!
//! # Cart and wishlist (session)
//! GET    /api/cart                     - Cart
//! DELETE /api/cart                     - Clear cart
//! POST   /api/cart/items               - Add line
//! PATCH  /api/cart/items/{id}          - Set quantity
//! DELETE /api/cart/items/{id}          - Remove line
//! GET    /api/wishlist                 - Wishlist
//! POST   /api/wishlist/items           - Save product
//! DELETE /api/wishlist/items/{id}      - Remove product
//!
//! # Checkout (stricter rate limit)
//! POST   /api/orders                   - Place order
//! POST   /api/checkout                 - Create payment session
//! GET    /api/checkout/success         - Confirm payment
//!
//! # Other
//! POST   /api/update-stock             - Take units out of stock
//! POST   /api/verify-identity          - Identity hash
//! POST   /api/shipengine/get-rates     - Rate quote
//! POST   /api/shipengine/create-label  - Buy label
//! GET    /api/shipengine/tracking/{id} - Tracking
//! GET    /api/blog                     - Blog posts
//! GET    /api/blog/{slug}              - Blog post
//! ```

pub mod blog;
pub mod cart;
pub mod checkout;
pub mod identity;
pub mod inventory;
pub mod products;
pub mod shipping;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::middleware::{api_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the catalog and review routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route("/product", get(products::index).post(products::create))
        .route("/products/{id}/reviews", post(products::create_review))
        .route(
            "/reviews/{id}",
            patch(products::update_review).delete(products::delete_review),
        )
}

/// Create the session cart and wishlist routes router.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route("/cart/items/{id}", patch(cart::update).delete(cart::remove))
        .route("/wishlist", get(wishlist::show))
        .route("/wishlist/items", post(wishlist::add))
        .route("/wishlist/items/{id}", delete(wishlist::remove))
}

/// Create the order and payment routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(checkout::place_order))
        .route("/checkout", post(checkout::create_session))
        .route("/checkout/success", get(checkout::success))
}

/// Create the remaining API routes router.
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/update-stock", post(inventory::update_stock))
        .route("/verify-identity", post(identity::verify_identity))
        .route("/shipengine/get-rates", post(shipping::get_rates))
        .route("/shipengine/create-label", post(shipping::create_label))
        .route("/shipengine/tracking/{label_id}", get(shipping::tracking))
        .route("/blog", get(blog::index))
        .route("/blog/{slug}", get(blog::show))
}

/// Create all `/api` routes for the storefront.
///
/// With `rate_limited`, checkout routes get the strict limiter and the rest
/// the general one. Tests leave it off.
pub fn routes(rate_limited: bool) -> Router<AppState> {
    let mut checkout = checkout_routes();
    let mut general = catalog_routes()
        .merge(session_routes())
        .merge(service_routes());

    if rate_limited {
        checkout = checkout.layer(checkout_rate_limiter());
        general = general.layer(api_rate_limiter());
    }

    Router::new().nest("/api", checkout.merge(general))
}
