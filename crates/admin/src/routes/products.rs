//! Catalog administration handlers.
//!
//! Create and update take multipart form data so the product image can
//! ride along with the fields. All handlers sit behind [`RequireAdmin`].

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use mirra_backend::blob::ImageUpload;
use mirra_backend::models::Product;
use mirra_backend::services::{NewProduct, Page, ProductFilter, ProductSort, UpdateProduct};
use mirra_core::{Category, Money, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<Category>,
    /// Unlike the storefront, absent means every product.
    pub active: Option<bool>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Body for POST /products/{id}/status.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub active: bool,
}

/// A product as served to staff. Documents carry the ID as their key,
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

/// Collected multipart fields for create and update.
#[derive(Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<Money>,
    category: Option<Category>,
    stock: Option<u32>,
    sku: Option<String>,
    active: Option<bool>,
    image: Option<ImageUpload>,
}

async fn read_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("Malformed form data: {err}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        if name == "image" {
            let filename = field.file_name().unwrap_or("image").to_owned();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(format!("Failed to read image: {err}")))?;
            form.image = Some(ImageUpload {
                filename,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| AppError::BadRequest(format!("Malformed field: {err}")))?;
        match name.as_str() {
            "name" => form.name = Some(value),
            "description" => form.description = Some(value),
            "price" => {
                let amount = value.parse::<Decimal>().map_err(|_| {
                    AppError::BadRequest(format!("Invalid price: {value}"))
                })?;
                form.price = Some(Money::new(amount));
            }
            "category" => {
                let category = value.parse::<Category>().map_err(|err| {
                    AppError::BadRequest(err.to_string())
                })?;
                form.category = Some(category);
            }
            "stock" => {
                let stock = value.parse::<u32>().map_err(|_| {
                    AppError::BadRequest(format!("Invalid stock: {value}"))
                })?;
                form.stock = Some(stock);
            }
            "sku" => form.sku = Some(value),
            "active" => {
                let active = value.parse::<bool>().map_err(|_| {
                    AppError::BadRequest(format!("Invalid active flag: {value}"))
                })?;
                form.active = Some(active);
            }
            _ => {}
        }
    }
    Ok(form)
}

fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

/// GET /products
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<ProductView>>> {
    let filter = ProductFilter {
        category: params.category,
        active: params.active,
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
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = state.catalog().get(&id).await?;
    Ok(Json(ProductView::from(product)))
}

/// POST /products
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Json<ProductView>> {
    let form = read_form(multipart).await?;
    let input = NewProduct {
        name: require(form.name, "name")?,
        description: form.description.unwrap_or_default(),
        price: require(form.price, "price")?,
        category: require(form.category, "category")?,
        stock: require(form.stock, "stock")?,
        sku: form.sku,
        image: form.image,
    };
    let product = state.catalog().create(input).await?;
    Ok(Json(ProductView::from(product)))
}

/// PUT /products/{id}
#[instrument(skip_all, fields(product = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<ProductView>> {
    let form = read_form(multipart).await?;
    let input = UpdateProduct {
        name: form.name,
        description: form.description,
        price: form.price,
        category: form.category,
        stock: form.stock,
        active: form.active,
        image: form.image,
    };
    let product = state.catalog().update(&id, input).await?;
    Ok(Json(ProductView::from(product)))
}

/// POST /products/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ProductView>> {
    let product = state.catalog().set_active(&id, body.active).await?;
    Ok(Json(ProductView::from(product)))
}

/// DELETE /products/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    state.catalog().delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
