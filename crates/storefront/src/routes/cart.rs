//! Session cart handlers.
//!
//! The cart lives entirely in the session. Prices are snapshotted at
//! add time and re-priced during checkout, so a stale cart can never
//! buy at an old price.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use mirra_core::{Money, ProductId};

use crate::error::{AppError, Result};
use crate::models::{Cart, CartItem, session_keys};
use crate::state::AppState;

/// Body for cart mutations.
#[derive(Debug, Deserialize)]
pub struct CartInput {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Cart summary returned from every cart endpoint.
#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub subtotal: Money,
    pub count: u32,
}

impl From<Cart> for CartSummary {
    fn from(cart: Cart) -> Self {
        Self {
            subtotal: cart.subtotal(),
            count: cart.count(),
            items: cart.items,
        }
    }
}

async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// GET /cart
pub async fn show(session: Session) -> Result<Json<CartSummary>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartSummary::from(cart)))
}

/// POST /cart/add
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CartInput>,
) -> Result<Json<CartSummary>> {
    if input.quantity == 0 {
        return Err(AppError::BadRequest("Quantity must be positive".to_owned()));
    }

    let product = state.catalog().get(&input.product_id).await?;
    if !product.active || product.stock == 0 {
        return Err(AppError::NotFound("Product is not available".to_owned()));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(CartItem {
        product_id: input.product_id,
        name: product.name,
        price: product.price,
        quantity: input.quantity,
    });
    save_cart(&session, &cart).await?;
    Ok(Json(CartSummary::from(cart)))
}

/// POST /cart/update
pub async fn update(
    session: Session,
    Json(input): Json<CartInput>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(&input.product_id, input.quantity);
    save_cart(&session, &cart).await?;
    Ok(Json(CartSummary::from(cart)))
}

/// POST /cart/remove
pub async fn remove(
    session: Session,
    Json(input): Json<Value>,
) -> Result<Json<CartSummary>> {
    let product_id = input
        .get("product_id")
        .and_then(Value::as_str)
        .map(ProductId::new)
        .ok_or_else(|| AppError::BadRequest("product_id is required".to_owned()))?;

    let mut cart = load_cart(&session).await?;
    cart.remove(&product_id);
    save_cart(&session, &cart).await?;
    Ok(Json(CartSummary::from(cart)))
}

/// Drop the cart after a successful checkout.
pub async fn clear(session: &Session) -> Result<()> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(())
}
