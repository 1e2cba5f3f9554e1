//! Dashboard handler: one call, both stats documents.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// GET /dashboard
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let products = state.catalog().stats().await?;
    let orders = state.orders().stats().await?;
    Ok(Json(json!({
        "products": products,
        "orders": orders,
    })))
}
