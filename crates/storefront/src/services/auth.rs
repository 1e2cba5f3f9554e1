//! Customer authentication flows.
//!
//! Sign-in attempts are rate limited per email address on top of the
//! per-IP layer, so a distributed guesser burning many IPs still gets
//! throttled on the account it is attacking.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::http::StatusCode;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use thiserror::Error;
use tracing::{info, instrument, warn};

use mirra_core::Email;
use mirra_backend::identity::{IdentityError, IdentityProvider};
use mirra_backend::models::UserProfile;
use mirra_backend::services::ProfileService;

use crate::models::CurrentUser;

/// Sign-in attempts allowed per email per minute.
const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 5;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] mirra_core::EmailError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("too many attempts for this account")]
    RateLimited,

    #[error("profile error: {0}")]
    Profile(#[from] mirra_backend::services::ProfileError),
}

impl AuthError {
    /// True for failures the client did not cause.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Identity(err) => matches!(
                err,
                IdentityError::Network(_)
                    | IdentityError::Backend { .. }
                    | IdentityError::InvalidUrl(_)
            ),
            Self::Profile(_) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            Self::Identity(err) => match err {
                IdentityError::EmailInUse => StatusCode::CONFLICT,
                IdentityError::WeakPassword => StatusCode::BAD_REQUEST,
                IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Profile(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// What the client is told. Never echoes provider detail.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email address".to_owned(),
            Self::Identity(err) => match err {
                IdentityError::EmailInUse => {
                    "An account with this email already exists".to_owned()
                }
                IdentityError::WeakPassword => err.to_string(),
                _ => "Invalid email or password".to_owned(),
            },
            Self::RateLimited => "Too many attempts, try again shortly".to_owned(),
            Self::Profile(_) => "Authentication error".to_owned(),
        }
    }
}

type EmailLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Registration, login, and guest flows.
pub struct AuthFlow {
    identity: Arc<dyn IdentityProvider>,
    profiles: ProfileService,
    login_limiter: EmailLimiter,
}

impl AuthFlow {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: ProfileService) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(LOGIN_ATTEMPTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN),
        );
        Self {
            identity,
            profiles,
            login_limiter: RateLimiter::keyed(quota),
        }
    }

    /// Register a password account and resolve its profile.
    ///
    /// # Errors
    ///
    /// Surfaces identity-provider rejections (duplicate email, weak
    /// password) and store failures.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let auth = self.identity.sign_up(&email, password).await?;
        let profile = self.profiles.resolve(&auth).await?;
        info!(uid = %profile.id, "registered account");
        Ok(current_user(profile))
    }

    /// Verify a password credential and resolve the profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RateLimited`] when the per-email budget is
    /// spent; the limiter is charged before the provider is asked, so
    /// failed guesses burn budget too.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        if self
            .login_limiter
            .check_key(&email.as_str().to_owned())
            .is_err()
        {
            warn!(email = %email, "login attempts rate limited");
            return Err(AuthError::RateLimited);
        }

        let auth = self.identity.sign_in(&email, password).await?;
        let profile = self.profiles.resolve(&auth).await?;
        Ok(current_user(profile))
    }

    /// Exchange a federated sign-in token for a session identity.
    ///
    /// # Errors
    ///
    /// Surfaces token rejection and store failures.
    #[instrument(skip(self, token))]
    pub async fn federated(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let auth = self.identity.verify_federated(token).await?;
        let profile = self.profiles.resolve(&auth).await?;
        Ok(current_user(profile))
    }

    /// Fabricate a guest identity. Nothing durable is created.
    #[must_use]
    pub fn guest(&self) -> CurrentUser {
        CurrentUser::guest()
    }
}

fn current_user(profile: UserProfile) -> CurrentUser {
    CurrentUser::account(profile.id, profile.email, profile.role)
}
