//! Authentication route handlers.
//!
//! Successful sign-ins rotate the session ID before storing the
//! identity, so a fixated pre-login session never becomes an
//! authenticated one.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Body for register and login.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body for federated sign-in.
#[derive(Debug, Deserialize)]
pub struct FederatedToken {
    pub token: String,
}

fn user_json(user: &CurrentUser) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "role": user.role,
        "guest": user.guest,
    })
}

async fn establish(session: &Session, user: &CurrentUser) -> Result<()> {
    session.cycle_id().await?;
    set_current_user(session, user).await?;
    set_sentry_user(&user.id, user.email.as_ref().map(|e| e.as_str()));
    Ok(())
}

/// POST /auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Value>> {
    let user = state
        .auth()
        .register(&credentials.email, &credentials.password)
        .await?;
    establish(&session, &user).await?;
    Ok(Json(user_json(&user)))
}

/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Value>> {
    let user = state
        .auth()
        .login(&credentials.email, &credentials.password)
        .await?;
    establish(&session, &user).await?;
    Ok(Json(user_json(&user)))
}

/// POST /auth/federated
#[instrument(skip_all)]
pub async fn federated(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<FederatedToken>,
) -> Result<Json<Value>> {
    let user = state.auth().federated(&body.token).await?;
    establish(&session, &user).await?;
    Ok(Json(user_json(&user)))
}

/// POST /auth/guest
pub async fn guest(State(state): State<AppState>, session: Session) -> Result<Json<Value>> {
    let user = state.auth().guest();
    establish(&session, &user).await?;
    Ok(Json(user_json(&user)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "ok": true })))
}
