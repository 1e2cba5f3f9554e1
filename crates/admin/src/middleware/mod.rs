//! HTTP middleware stack for the admin API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID middleware
//! 4. Session layer (tower-sessions, SameSite=Strict)
//! 5. Security headers
//! 6. Per-IP rate limiting on the routed subtrees
//! 7. Auth extractors on protected routes

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, clear_current_admin, set_current_admin};
pub use rate_limit::{login_rate_limiter, staff_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
