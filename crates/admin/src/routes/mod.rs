//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/login                 - Password login, sets the auth cookie
//! POST   /api/logout                - Clears the auth cookie
//! GET    /api/check-auth            - { isAuthenticated }
//! POST   /api/change-password       - Change the admin password
//!
//! # Dashboard (cookie required from here down)
//! GET    /api/dashboard             - Totals and recent orders
//! GET    /api/profile               - Signed-in admin and store counts
//!
//! # Catalog and orders
//! GET    /api/products              - Products
//! PATCH  /api/products/{id}         - Edit product
//! DELETE /api/products/{id}         - Delete product
//! GET    /api/orders                - Orders (?status=Pending)
//! PATCH  /api/orders/{id}           - Edit order
//! DELETE /api/orders/{id}           - Delete order
//! GET    /api/customers             - Customers derived from orders
//! PATCH  /api/customers/{email}     - Edit a customer across their orders
//!
//! # Analytics
//! GET    /api/analytics/sales       - Monthly sales
//! GET    /api/analytics/inventory   - Stock levels
//!
//! # Live views (server-sent events)
//! GET    /api/live/{feed}           - orders, products, customers, sales, inventory
//! ```

pub mod analytics;
pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod live;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the login and session routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/check-auth", get(auth::check_auth))
        .route("/change-password", post(auth::change_password))
}

/// Create the management routes router.
pub fn management_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .route("/profile", get(dashboard::profile))
        .route("/products", get(products::index))
        .route(
            "/products/{id}",
            patch(products::update).delete(products::destroy),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", patch(orders::update).delete(orders::destroy))
        .route("/customers", get(customers::index))
        .route("/customers/{email}", patch(customers::update))
        .route("/analytics/sales", get(analytics::sales))
        .route("/analytics/inventory", get(analytics::inventory))
        .route("/live/{feed}", get(live::feed))
}

/// Create all `/api` routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", auth_routes().merge(management_routes()))
}
