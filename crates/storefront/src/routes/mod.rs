//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check (mounted in main)
//!
//! # Products (public, active products only)
//! GET  /products               - Product listing with filters
//! GET  /products/{id}          - Product detail
//!
//! # Cart (session-backed)
//! GET  /cart                   - Cart contents
//! POST /cart/add               - Add a product
//! POST /cart/update            - Set a line quantity (0 removes)
//! POST /cart/remove            - Remove a line
//!
//! # Checkout
//! POST /checkout               - Place an order (multipart, receipt image)
//!
//! # Auth
//! POST /auth/register          - Create an account
//! POST /auth/login             - Password sign-in
//! POST /auth/federated         - Federated token sign-in
//! POST /auth/guest             - Start a guest session
//! POST /auth/logout            - End the session identity
//!
//! # Account (requires auth)
//! GET  /account                - Profile overview
//! GET  /account/orders         - Order history
//! POST /account/favorites/{id} - Toggle a favorite product
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/federated", post(auth::federated))
        .route("/guest", post(auth::guest))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/favorites/{id}", post(account::toggle_favorite))
}

/// Create all routes for the storefront.
///
/// Auth endpoints sit behind the strict per-IP limiter; everything
/// else gets the relaxed API limiter.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .nest("/account", account_routes())
        .layer(api_rate_limiter())
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
}
