//! Checkout handler.
//!
//! Takes the session cart plus customer details and a payment receipt
//! image as multipart form data, places the order, then clears the
//! cart. Quantities are re-validated against fresh stock inside the
//! order service; the cart's snapshotted prices are only advisory.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument};

use mirra_backend::blob::ImageUpload;
use mirra_backend::services::{CheckoutItem, CheckoutRequest};
use mirra_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, session_keys};
use crate::routes::cart;
use crate::state::AppState;

/// Collected multipart fields.
#[derive(Default)]
struct CheckoutForm {
    name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    email: Option<String>,
    notes: Option<String>,
    receipt: Option<ImageUpload>,
}

async fn read_form(mut multipart: Multipart) -> Result<CheckoutForm> {
    let mut form = CheckoutForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("Malformed form data: {err}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        match name.as_str() {
            "receipt" => {
                let filename = field
                    .file_name()
                    .unwrap_or("receipt")
                    .to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("Failed to read receipt: {err}")))?;
                form.receipt = Some(ImageUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("Malformed field: {err}")))?;
                match other {
                    "name" => form.name = Some(value),
                    "phone" => form.phone = Some(value),
                    "address" => form.address = Some(value),
                    "email" => form.email = Some(value),
                    "notes" => form.notes = Some(value),
                    _ => {}
                }
            }
        }
    }
    Ok(form)
}

fn require(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

/// POST /checkout
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    multipart: Multipart,
) -> Result<Json<Value>> {
    let form = read_form(multipart).await?;

    let session_cart = session
        .get::<crate::models::Cart>(session_keys::CART)
        .await?
        .unwrap_or_default();
    if session_cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_owned()));
    }

    let email = match form.email.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(raw) => Some(
            Email::parse(raw).map_err(|err| AppError::BadRequest(format!("Invalid email: {err}")))?,
        ),
    };
    let receipt = form
        .receipt
        .ok_or_else(|| AppError::BadRequest("A payment receipt image is required".to_owned()))?;

    let request = CheckoutRequest {
        user_id: user.as_ref().filter(|u| !u.guest).map(|u| u.id.clone()),
        customer_name: require(form.name, "name")?,
        phone: require(form.phone, "phone")?,
        address: require(form.address, "address")?,
        email,
        items: session_cart
            .items
            .iter()
            .map(|line| CheckoutItem {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            })
            .collect(),
        notes: form.notes.filter(|n| !n.trim().is_empty()),
        receipt,
    };

    let order = state.orders().checkout(request).await?;
    cart::clear(&session).await?;

    if let Some(CurrentUser { id, guest: false, .. }) = user {
        state.profiles().record_order(&id, order.total).await;
    }

    info!(order = %order.number, "order placed");
    Ok(Json(json!({
        "order_id": order.id,
        "order_number": order.number,
        "subtotal": order.subtotal,
        "shipping": order.shipping,
        "total": order.total,
        "status": order.status,
    })))
}
