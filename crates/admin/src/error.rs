//! Unified error handling for the admin API.
//!
//! Staff see more detail than storefront customers do: validation and
//! transition errors come back verbatim, since the audience is trusted.
//! Store failures still collapse to a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use mirra_backend::services::{CatalogError, OrderError, ProfileError, SettingsError};

use crate::services::AdminAuthError;

/// Application-level error type for the admin API.
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

    /// Staff authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Session(_) => true,
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
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        if self.is_server_error() {
            return match self {
                Self::Auth(_) => "Authentication error".to_owned(),
                _ => "Service temporarily unavailable".to_owned(),
            };
        }
        match self {
            Self::Auth(err) => err.client_message(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use mirra_core::{OrderStatus, ProductId};

    #[test]
    fn staff_see_transition_detail() {
        let err = AppError::Order(OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.message().contains("delivered"));
    }

    #[test]
    fn not_found_shows_the_id() {
        let err = AppError::Catalog(CatalogError::NotFound(ProductId::new("p1")));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.message().contains("p1"));
    }

    #[test]
    fn store_failures_stay_generic() {
        let err = AppError::Catalog(CatalogError::Store(
            mirra_backend::store::StoreError::PermissionDenied,
        ));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), "Service temporarily unavailable");
    }
}
