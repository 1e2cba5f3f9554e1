//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding; backend detail never reaches
//! the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use mirra_backend::services::{CatalogError, OrderError, ProfileError, SettingsError};
use mirra_backend::store::StoreError;

use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Settings operation failed.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Profile operation failed.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Session(_) | Self::Internal(_) => true,
            Self::Catalog(CatalogError::Store(_) | CatalogError::Blob(_))
            | Self::Order(OrderError::Store(_) | OrderError::Receipt(_))
            | Self::Settings(SettingsError::Store(_))
            | Self::Profile(ProfileError::Store(_)) => true,
            Self::Auth(err) => err.is_server_error(),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(err) => match err {
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Blob(_) | CatalogError::Store(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Order(err) => match err {
                OrderError::Validation(_) | OrderError::Phone(_) => StatusCode::BAD_REQUEST,
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::ProductUnavailable(_) | OrderError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                OrderError::Receipt(_) | OrderError::Store(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Settings(err) => match err {
                SettingsError::Validation(_) => StatusCode::BAD_REQUEST,
                SettingsError::Store(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Profile(err) => match err {
                ProfileError::NotFound(_) | ProfileError::UnknownEmail(_) => StatusCode::NOT_FOUND,
                ProfileError::Store(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Auth(err) => err.status(),
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-safe message. Server-side failures collapse into generic
    /// phrases so store internals never leak.
    fn message(&self) -> String {
        if self.is_server_error() {
            return match self {
                Self::Catalog(_) | Self::Order(_) | Self::Settings(_) | Self::Profile(_) => {
                    "Service temporarily unavailable".to_owned()
                }
                Self::Auth(_) => "Authentication error".to_owned(),
                _ => "Internal server error".to_owned(),
            };
        }
        match self {
            Self::Auth(err) => err.client_message(),
            Self::Order(OrderError::ProductUnavailable(_)) => {
                "One of the products is no longer available".to_owned()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "error": self.message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after authentication.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirra_core::{OrderStatus, ProductId};

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("x".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Unauthorized("x".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Catalog(CatalogError::Validation("x".to_owned()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Order(OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Cancelled,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn server_errors_hide_detail() {
        let err = AppError::Order(OrderError::ProductUnavailable(ProductId::new("p1")));
        assert_eq!(
            err.message(),
            "One of the products is no longer available"
        );

        let internal = AppError::Internal("gateway exploded at 03:12".to_owned());
        assert_eq!(internal.message(), "Internal server error");
    }
}
