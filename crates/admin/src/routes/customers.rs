//! Customer listing handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use mirra_backend::models::UserProfile;
use mirra_backend::services::Page;
use mirra_core::UserId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Query parameters for the customer listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// A profile as served to staff, with its ID attached.
#[derive(Debug, Serialize)]
pub struct CustomerView {
    pub id: UserId,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl From<UserProfile> for CustomerView {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            profile,
        }
    }
}

/// GET /customers
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<CustomerView>>> {
    let page = state.profiles().list(params.page, params.page_size).await?;
    Ok(Json(Page {
        items: page.items.into_iter().map(CustomerView::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}
