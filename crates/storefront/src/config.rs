//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MIRRA_DOCUMENT_API_URL` - Base URL of the hosted document API
//! - `MIRRA_BLOB_API_URL` - Base URL of the hosted blob API
//! - `MIRRA_IDENTITY_API_URL` - Base URL of the hosted identity API
//! - `MIRRA_API_KEY` - Project API key for the hosted services
//! - `STOREFRONT_BASE_URL` - Public URL of the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;

use mirra_backend::BackendConfig;
use mirra_backend::config::CacheTtls;
use mirra_backend::env::{self, ConfigError};

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the storefront
    pub base_url: String,
    /// Session secret, validated at startup. Reserved for a signing or
    /// encrypting session store; the in-memory store does not consume it.
    pub session_secret: SecretString,
    /// Hosted backend connection settings
    pub backend: BackendConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid,
    /// or if secrets fail the placeholder and entropy checks.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = env::or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_owned(), e.to_string()))?;
        let port = env::or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_owned(), e.to_string()))?;
        let base_url = env::required("STOREFRONT_BASE_URL")?;
        let session_secret = env::session_secret("STOREFRONT_SESSION_SECRET")?;

        let backend = BackendConfig {
            document_api_url: env::required("MIRRA_DOCUMENT_API_URL")?,
            blob_api_url: env::required("MIRRA_BLOB_API_URL")?,
            identity_api_url: env::required("MIRRA_IDENTITY_API_URL")?,
            api_key: env::validated_secret("MIRRA_API_KEY")?,
            cache: CacheTtls::default(),
        };

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            backend,
            sentry_dsn: env::optional("SENTRY_DSN"),
            sentry_environment: env::optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
