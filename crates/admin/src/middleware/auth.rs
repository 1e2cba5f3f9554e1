//! Staff authentication extractor.
//!
//! The role gate runs at login time, and this extractor re-reads the
//! profile's role on every protected request. Role changes written
//! through the services invalidate the users cache, so a demotion locks
//! the account out on its next request rather than at session expiry.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in staff member.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Rejection when the session carries no staff identity.
pub struct AdminRejection;

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Staff authentication required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Session is put into extensions by SessionManagerLayer.
        let session = parts.extensions.get::<Session>().ok_or(AdminRejection)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminRejection)?;

        // The session only proves who signed in; the role that gates
        // access comes from the profile document as it is right now.
        let state = AppState::from_ref(state);
        let profile = state
            .profiles()
            .get(&admin.id)
            .await
            .map_err(|_| AdminRejection)?;

        if !profile.role.is_admin() {
            return Err(AdminRejection);
        }

        Ok(Self(CurrentAdmin {
            id: admin.id,
            email: admin.email,
            role: profile.role,
        }))
    }
}

/// Store the staff identity in the session after sign-in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Clear the staff identity from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use secrecy::SecretString;
    use tower_sessions::{MemoryStore as SessionMemoryStore, Session};

    use mirra_backend::config::{BackendConfig, CacheTtls};
    use mirra_backend::identity::{IdentityProvider, MemoryIdentityProvider};
    use mirra_backend::{Gateway, blob::MemoryBlobStore, store::MemoryStore};
    use mirra_core::{Email, Role};

    use super::*;
    use crate::config::AdminConfig;

    fn test_config() -> AdminConfig {
        AdminConfig {
            host: "127.0.0.1".parse().expect("addr"),
            port: 3001,
            base_url: "http://127.0.0.1:3001".to_owned(),
            session_secret: SecretString::from("0123456789abcdef0123456789abcdef"),
            backend: BackendConfig {
                document_api_url: "http://127.0.0.1:9100".to_owned(),
                blob_api_url: "http://127.0.0.1:9101".to_owned(),
                identity_api_url: "http://127.0.0.1:9102".to_owned(),
                api_key: SecretString::from("test-key"),
                cache: CacheTtls::default(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    async fn state_with_manager() -> (AppState, CurrentAdmin) {
        let identity = Arc::new(MemoryIdentityProvider::new());
        let gateway = Gateway::new(Arc::new(MemoryStore::new()), CacheTtls::default());
        let state = AppState::new(
            test_config(),
            gateway,
            Arc::new(MemoryBlobStore::new()),
            identity.clone(),
        );

        let account = identity
            .sign_up(
                &Email::parse("staff@mirrabeauty.store").expect("valid email"),
                "hunter24",
            )
            .await
            .expect("sign up");
        let profile = state.profiles().resolve(&account).await.expect("resolve");
        state
            .profiles()
            .grant_role("staff@mirrabeauty.store", Role::Manager)
            .await
            .expect("grant");

        let admin = CurrentAdmin {
            id: profile.id,
            email: profile.email,
            role: Role::Manager,
        };
        (state, admin)
    }

    async fn parts_with_session(admin: &CurrentAdmin) -> Parts {
        let session = Session::new(None, Arc::new(SessionMemoryStore::default()), None);
        set_current_admin(&session, admin).await.expect("store");

        let (mut parts, ()) = Request::builder()
            .uri("/dashboard")
            .body(())
            .expect("request")
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    #[tokio::test]
    async fn staff_session_passes() {
        let (state, admin) = state_with_manager().await;
        let mut parts = parts_with_session(&admin).await;

        let Ok(RequireAdmin(current)) =
            RequireAdmin::from_request_parts(&mut parts, &state).await
        else {
            panic!("manager must pass");
        };
        assert_eq!(current.role, Role::Manager);
    }

    #[tokio::test]
    async fn demotion_locks_out_the_live_session() {
        let (state, admin) = state_with_manager().await;

        state
            .profiles()
            .grant_role("staff@mirrabeauty.store", Role::User)
            .await
            .expect("demote");

        let mut parts = parts_with_session(&admin).await;
        assert!(
            RequireAdmin::from_request_parts(&mut parts, &state)
                .await
                .is_err(),
            "a demoted account must not keep admin access"
        );
    }

    #[tokio::test]
    async fn anonymous_session_is_rejected() {
        let (state, _) = state_with_manager().await;

        let session = Session::new(None, Arc::new(SessionMemoryStore::default()), None);
        let (mut parts, ()) = Request::builder()
            .uri("/dashboard")
            .body(())
            .expect("request")
            .into_parts();
        parts.extensions.insert(session);

        assert!(
            RequireAdmin::from_request_parts(&mut parts, &state)
                .await
                .is_err()
        );
    }
}
