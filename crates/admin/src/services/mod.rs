//! Admin-side services.

pub mod auth;

pub use auth::{AdminAuth, AdminAuthError};
