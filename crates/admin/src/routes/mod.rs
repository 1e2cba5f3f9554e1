//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Health check (mounted in main)
//!
//! # Auth
//! POST /auth/login                 - Staff sign-in
//! POST /auth/logout                - End the session
//!
//! # Dashboard
//! GET  /dashboard                  - Catalog and order statistics
//!
//! # Products (full catalog, including hidden)
//! GET    /products                 - Listing with filters
//! POST   /products                 - Create (multipart, optional image)
//! GET    /products/{id}            - Detail
//! PUT    /products/{id}            - Partial update (multipart)
//! POST   /products/{id}/status     - Show or hide
//! DELETE /products/{id}            - Delete product and its image
//!
//! # Orders
//! GET    /orders                   - Listing with filters
//! GET    /orders/{id}              - Detail with history
//! POST   /orders/{id}/status       - Advance the status machine
//! POST   /orders/{id}/cancel       - Cancel (restores stock)
//! DELETE /orders/{id}              - Delete (restores stock if open)
//!
//! # Customers
//! GET  /customers                  - Profile listing
//!
//! # Settings
//! GET  /settings                   - Current store settings
//! PUT  /settings                   - Partial update
//! ```

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{login_rate_limiter, staff_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/status", post(products::set_status))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show).delete(orders::delete))
        .route("/{id}/status", post(orders::set_status))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create all routes for the admin API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::index))
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .route("/customers", get(customers::index))
        .route("/settings", get(settings::show).put(settings::update))
        .layer(staff_rate_limiter())
        .nest("/auth", auth_routes().layer(login_rate_limiter()))
}
