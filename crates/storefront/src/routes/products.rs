//! Public product listing and detail handlers.
//!
//! The public surface only ever shows active products; hidden and
//! out-of-catalog items are indistinguishable from absent ones.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use mirra_backend::models::Product;
use mirra_backend::services::{CatalogError, Page, ProductFilter, ProductSort};
use mirra_core::{Category, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<Category>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// A product as served to clients. Documents carry the ID as their key,
/// so the model skips it during serialization; the view adds it back.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    #[serde(flatten)]
    pub product: Product,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.clone(),
            product,
        }
    }
}

/// GET /products
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<ProductView>>> {
    let filter = ProductFilter {
        category: params.category,
        active: Some(true),
        search: params.search,
        sort: params.sort,
        page: params.page,
        page_size: params.page_size,
    };
    let page = state.catalog().list(&filter).await?;
    Ok(Json(Page {
        items: page.items.into_iter().map(ProductView::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

/// GET /products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = state.catalog().get(&id).await?;
    if !product.active {
        // Hidden products look exactly like missing ones.
        return Err(AppError::Catalog(CatalogError::NotFound(id)));
    }
    Ok(Json(ProductView::from(product)))
}
