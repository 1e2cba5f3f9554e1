//! Account route handlers, all behind [`RequireAuth`].
//!
//! Guests get a profile-less overview; their orders are keyed by the
//! throwaway guest ID and vanish with the session.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use mirra_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// GET /account
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    if user.guest {
        return Ok(Json(json!({
            "id": user.id,
            "guest": true,
        })));
    }

    let profile = state.profiles().get(&user.id).await?;
    Ok(Json(json!({
        "id": profile.id,
        "email": profile.email,
        "display_name": profile.display_name,
        "role": profile.role,
        "phone": profile.phone,
        "address": profile.address,
        "favorites": profile.favorites,
        "order_count": profile.order_count,
        "total_spent": profile.total_spent,
        "guest": false,
    })))
}

/// GET /account/orders
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let orders = state.orders().list_for_user(&user.id).await?;
    let views: Vec<Value> = orders
        .iter()
        .map(|order| {
            json!({
                "id": order.id,
                "number": order.number,
                "items": order.items,
                "subtotal": order.subtotal,
                "shipping": order.shipping,
                "total": order.total,
                "status": order.status,
                "payment_status": order.payment_status,
                "created_at": order.created_at,
            })
        })
        .collect();
    Ok(Json(json!({ "orders": views })))
}

/// POST /account/favorites/{id}
pub async fn toggle_favorite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Value>> {
    let favorite = state
        .profiles()
        .toggle_favorite(&user.id, &product_id)
        .await?;
    Ok(Json(json!({ "product_id": product_id, "favorite": favorite })))
}
