//! Order administration handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use mirra_backend::models::Order;
use mirra_backend::services::{OrderFilter, Page};
use mirra_core::{OrderId, OrderStatus};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Query parameters for the order listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<OrderStatus>,
    /// Matches order number, customer name, or phone.
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Body for POST /orders/{id}/status.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
    pub note: Option<String>,
}

/// Body for POST /orders/{id}/cancel.
#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    pub note: Option<String>,
}

/// An order as served to staff, with its ID attached.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    #[serde(flatten)]
    pub order: Order,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.clone(),
            order,
        }
    }
}

fn actor(admin: &crate::models::CurrentAdmin) -> String {
    admin.email.as_str().to_owned()
}

/// GET /orders
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<OrderView>>> {
    let filter = OrderFilter {
        status: params.status,
        search: params.search,
        page: params.page,
        page_size: params.page_size,
    };
    let page = state.orders().list(&filter).await?;
    Ok(Json(Page {
        items: page.items.into_iter().map(OrderView::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

/// GET /orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = state.orders().get(&id).await?;
    Ok(Json(OrderView::from(order)))
}

/// POST /orders/{id}/status
#[instrument(skip_all, fields(order = %id, to = %body.status))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<OrderView>> {
    let order = state
        .orders()
        .set_status(&id, body.status, &actor(&admin), body.note)
        .await?;
    Ok(Json(OrderView::from(order)))
}

/// POST /orders/{id}/cancel
#[instrument(skip_all, fields(order = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<OrderView>> {
    let note = body.and_then(|Json(b)| b.note);
    let order = state.orders().cancel(&id, &actor(&admin), note).await?;
    Ok(Json(OrderView::from(order)))
}

/// DELETE /orders/{id}
#[instrument(skip_all, fields(order = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>> {
    state.orders().delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
