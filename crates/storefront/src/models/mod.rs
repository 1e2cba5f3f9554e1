//! Session-scoped models for the storefront.

pub mod session;

pub use session::{Cart, CartItem, CurrentUser, session_keys};
