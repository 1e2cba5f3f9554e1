//! Store settings handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use mirra_backend::models::StoreSettings;
use mirra_backend::services::SettingsUpdate;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// GET /settings
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<StoreSettings>> {
    let settings = state.settings().get().await?;
    Ok(Json(settings))
}

/// PUT /settings
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<StoreSettings>> {
    let settings = state.settings().update(update).await?;
    Ok(Json(settings))
}
