//! Staff authentication handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::state::AppState;

/// Body for staff login.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Value>> {
    let admin = state
        .auth()
        .login(&credentials.email, &credentials.password)
        .await?;

    // Rotate the session ID so a fixated pre-login session never
    // becomes a staff session.
    session.cycle_id().await?;
    set_current_admin(&session, &admin).await?;

    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin.id.to_string()),
            email: Some(admin.email.as_str().to_owned()),
            ..Default::default()
        }));
    });

    Ok(Json(json!({
        "id": admin.id,
        "email": admin.email,
        "role": admin.role,
    })))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_admin(&session).await?;
    sentry::configure_scope(|scope| scope.set_user(None));
    Ok(Json(json!({ "ok": true })))
}
