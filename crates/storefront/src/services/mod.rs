//! Storefront services.

pub mod auth;

pub use auth::{AuthError, AuthFlow};
