//! Staff sign-in.
//!
//! Same identity provider as the storefront, but only accounts whose
//! profile carries a staff role get in. The rejection for a valid
//! customer credential is indistinguishable from a bad password, so
//! probing which emails belong to staff yields nothing.

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
use mirra_backend::services::{ProfileError, ProfileService};

use crate::models::CurrentAdmin;

/// Sign-in attempts allowed per email per minute.
const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 5;

/// Staff authentication errors.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] mirra_core::EmailError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The credential is valid but the account has no staff role.
    #[error("account has no staff access")]
    NotStaff,

    #[error("too many attempts for this account")]
    RateLimited,

    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),
}

impl AdminAuthError {
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
            Self::NotStaff => StatusCode::UNAUTHORIZED,
            Self::Identity(err) => match err {
                IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                IdentityError::EmailInUse | IdentityError::WeakPassword => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Profile(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// What the client is told. A non-staff account gets the same
    /// message as a wrong password.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email address".to_owned(),
            Self::NotStaff | Self::Identity(_) => "Invalid email or password".to_owned(),
            Self::RateLimited => "Too many attempts, try again shortly".to_owned(),
            Self::Profile(_) => "Authentication error".to_owned(),
        }
    }
}

type EmailLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Staff sign-in flow.
pub struct AdminAuth {
    identity: Arc<dyn IdentityProvider>,
    profiles: ProfileService,
    login_limiter: EmailLimiter,
}

impl AdminAuth {
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

    /// Verify a staff credential.
    ///
    /// # Errors
    ///
    /// Returns [`AdminAuthError::NotStaff`] for valid customer
    /// credentials and [`AdminAuthError::RateLimited`] when the
    /// per-email budget is spent.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentAdmin, AdminAuthError> {
        let email = Email::parse(email)?;
        if self
            .login_limiter
            .check_key(&email.as_str().to_owned())
            .is_err()
        {
            warn!(email = %email, "staff login attempts rate limited");
            return Err(AdminAuthError::RateLimited);
        }

        let auth = self.identity.sign_in(&email, password).await?;
        let profile = self.profiles.resolve(&auth).await?;
        if !profile.role.is_admin() {
            warn!(uid = %profile.id, "non-staff account attempted admin login");
            return Err(AdminAuthError::NotStaff);
        }

        info!(uid = %profile.id, role = %profile.role, "staff signed in");
        Ok(CurrentAdmin {
            id: profile.id,
            email: profile.email,
            role: profile.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirra_backend::Gateway;
    use mirra_backend::config::CacheTtls;
    use mirra_backend::identity::MemoryIdentityProvider;
    use mirra_backend::store::MemoryStore;
    use mirra_core::Role;

    async fn auth_with_account(role: Option<Role>) -> AdminAuth {
        let gateway = Gateway::new(Arc::new(MemoryStore::new()), CacheTtls::default());
        let profiles = ProfileService::new(gateway);
        let identity = Arc::new(MemoryIdentityProvider::new());

        let account = identity
            .sign_up(
                &Email::parse("staff@mirrabeauty.store").expect("valid email"),
                "hunter24",
            )
            .await
            .expect("sign up");
        profiles.resolve(&account).await.expect("resolve");
        if let Some(role) = role {
            profiles
                .grant_role("staff@mirrabeauty.store", role)
                .await
                .expect("grant");
        }

        AdminAuth::new(identity, profiles)
    }

    #[tokio::test]
    async fn staff_roles_get_in() {
        let auth = auth_with_account(Some(Role::Manager)).await;
        let admin = auth
            .login("staff@mirrabeauty.store", "hunter24")
            .await
            .expect("login");
        assert_eq!(admin.role, Role::Manager);
    }

    #[tokio::test]
    async fn customers_are_rejected_like_bad_passwords() {
        let auth = auth_with_account(None).await;
        let err = auth
            .login("staff@mirrabeauty.store", "hunter24")
            .await
            .expect_err("must reject");
        assert!(matches!(err, AdminAuthError::NotStaff));
        assert_eq!(err.client_message(), "Invalid email or password");
    }

    #[tokio::test]
    async fn login_attempts_are_limited() {
        let auth = auth_with_account(Some(Role::Admin)).await;
        for _ in 0..LOGIN_ATTEMPTS_PER_MINUTE {
            let _ = auth.login("staff@mirrabeauty.store", "wrong").await;
        }
        assert!(matches!(
            auth.login("staff@mirrabeauty.store", "hunter24").await,
            Err(AdminAuthError::RateLimited)
        ));
    }
}
