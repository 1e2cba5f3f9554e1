//! Catalog service: product CRUD, imagery, and aggregate stats.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument, warn};

use mirra_core::limits::{
    MAX_PRODUCT_PRICE, MAX_PRODUCT_STOCK, MIN_PRODUCT_NAME_LEN, MIN_PRODUCT_PRICE,
};
use mirra_core::{Category, Money, ProductId};

use crate::Gateway;
use crate::blob::{BlobError, BlobStore, ImageUpload};
use crate::models::{Product, ProductStats};
use crate::services::Page;
use crate::store::{StoreError, collections};

const IMAGE_FOLDER: &str = "products";
const STATS_DOC: &str = "products";

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid product: {0}")]
    Validation(String),

    #[error("product not found: {0}")]
    NotFound(ProductId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    pub stock: u32,
    pub sku: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<Category>,
    pub stock: Option<u32>,
    pub active: Option<bool>,
    pub image: Option<ImageUpload>,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

/// Listing filter, applied client-side over the cached collection read.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Service over the products collection.
#[derive(Clone)]
pub struct CatalogService {
    gateway: Gateway,
    blobs: Arc<dyn BlobStore>,
}

impl CatalogService {
    #[must_use]
    pub fn new(gateway: Gateway, blobs: Arc<dyn BlobStore>) -> Self {
        Self { gateway, blobs }
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for absent IDs.
    pub async fn get(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let doc = self
            .gateway
            .get_doc(collections::PRODUCTS, id.as_str())
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        Ok(Product::from_document(&doc)?)
    }

    /// List products with filters, sorting, and pagination.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Page<Product>, CatalogError> {
        let docs = self
            .gateway
            .list(collections::PRODUCTS, &crate::store::Query::all())
            .await?;
        let mut products = Vec::with_capacity(docs.len());
        for doc in &docs {
            products.push(Product::from_document(doc)?);
        }

        products.retain(|p| {
            filter.category.is_none_or(|c| p.category == c)
                && filter.active.is_none_or(|a| p.active == a)
                && filter.search.as_deref().is_none_or(|needle| {
                    let needle = needle.to_lowercase();
                    p.name.to_lowercase().contains(&needle)
                        || p.description.to_lowercase().contains(&needle)
                        || p.sku.to_lowercase().contains(&needle)
                })
        });

        match filter.sort {
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSort::NameAsc => products.sort_by(|a, b| a.name.cmp(&b.name)),
        }

        Ok(Page::slice(products, filter.page, filter.page_size))
    }

    /// Validate and create a product; uploads the image first so a
    /// failed upload leaves no document behind.
    ///
    /// # Errors
    ///
    /// Validation errors fire before any side effect.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewProduct) -> Result<Product, CatalogError> {
        validate_fields(&input.name, input.price, input.stock)?;

        let (image_url, image_path) = match input.image {
            Some(upload) => {
                let blob = self.blobs.upload(IMAGE_FOLDER, upload).await?;
                (blob.url, blob.path)
            }
            None => (String::new(), String::new()),
        };

        let now = Utc::now();
        let product = Product {
            id: ProductId::default(),
            name: input.name.trim().to_owned(),
            description: input.description,
            price: input.price,
            category: input.category,
            stock: input.stock,
            active: input.stock > 0,
            sku: input.sku.unwrap_or_else(generate_sku),
            image_url,
            image_path,
            created_at: now,
            updated_at: now,
        };

        let id = self
            .gateway
            .create(collections::PRODUCTS, product.to_value()?)
            .await?;
        info!(%id, "created product");

        self.recompute_stats().await;
        Ok(Product {
            id: ProductId::new(id),
            ..product
        })
    }

    /// Apply a partial update. A new image replaces and deletes the old
    /// blob; deleting the old blob is best-effort.
    ///
    /// # Errors
    ///
    /// Validation errors fire before any side effect.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: &ProductId,
        update: UpdateProduct,
    ) -> Result<Product, CatalogError> {
        if let Some(name) = &update.name
            && name.trim().len() < MIN_PRODUCT_NAME_LEN
        {
            return Err(CatalogError::Validation(format!(
                "name must be at least {MIN_PRODUCT_NAME_LEN} characters"
            )));
        }
        if let Some(price) = update.price {
            validate_price(price)?;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
        }

        let mut product = self.get(id).await?;
        let old_image_path = product.image_path.clone();

        if let Some(name) = update.name {
            product.name = name.trim().to_owned();
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
            product.active = stock > 0;
        }
        if let Some(active) = update.active {
            product.active = active && product.stock > 0;
        }

        let mut replaced_image = false;
        if let Some(upload) = update.image {
            let blob = self.blobs.upload(IMAGE_FOLDER, upload).await?;
            product.image_url = blob.url;
            product.image_path = blob.path;
            replaced_image = true;
        }
        product.updated_at = Utc::now();

        self.gateway
            .update(collections::PRODUCTS, id.as_str(), product.to_value()?)
            .await?;

        if replaced_image && !old_image_path.is_empty() {
            if let Err(err) = self.blobs.delete(&old_image_path).await {
                warn!(path = %old_image_path, error = %err, "failed to delete replaced image");
            }
        }

        self.recompute_stats().await;
        Ok(product)
    }

    /// Flip a product's visibility. A product with zero stock stays
    /// inactive no matter what the caller asks for.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for absent IDs.
    pub async fn set_active(&self, id: &ProductId, active: bool) -> Result<Product, CatalogError> {
        self.update(
            id,
            UpdateProduct {
                active: Some(active),
                ..UpdateProduct::default()
            },
        )
        .await
    }

    /// Delete a product and, best-effort, its image.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for absent IDs.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        let product = self.get(id).await?;
        self.gateway
            .delete(collections::PRODUCTS, id.as_str())
            .await?;

        if !product.image_path.is_empty()
            && let Err(err) = self.blobs.delete(&product.image_path).await
        {
            warn!(path = %product.image_path, error = %err, "failed to delete product image");
        }

        self.recompute_stats().await;
        Ok(())
    }

    /// Current aggregate counters.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn stats(&self) -> Result<ProductStats, CatalogError> {
        let doc = self.gateway.get_doc(collections::STATS, STATS_DOC).await?;
        match doc {
            Some(doc) => Ok(serde_json::from_value(doc.data).map_err(StoreError::from)?),
            None => Ok(ProductStats::default()),
        }
    }

    /// Re-read the collection and rewrite `stats/products`. Failures are
    /// logged and swallowed; counters lag rather than block a mutation.
    pub async fn recompute_stats(&self) {
        if let Err(err) = self.try_recompute_stats().await {
            warn!(error = %err, "failed to recompute product stats");
        }
    }

    async fn try_recompute_stats(&self) -> Result<(), CatalogError> {
        let docs = self
            .gateway
            .list(collections::PRODUCTS, &crate::store::Query::all())
            .await?;
        let mut stats = ProductStats {
            total: docs.len() as u64,
            updated_at: Some(Utc::now()),
            ..ProductStats::default()
        };
        for doc in &docs {
            let product = Product::from_document(doc)?;
            if product.active {
                stats.active += 1;
            }
            if product.stock == 0 {
                stats.out_of_stock += 1;
            }
        }
        self.gateway
            .set(
                collections::STATS,
                STATS_DOC,
                serde_json::to_value(&stats).map_err(StoreError::from)?,
            )
            .await?;
        Ok(())
    }
}

fn validate_fields(name: &str, price: Money, stock: u32) -> Result<(), CatalogError> {
    if name.trim().len() < MIN_PRODUCT_NAME_LEN {
        return Err(CatalogError::Validation(format!(
            "name must be at least {MIN_PRODUCT_NAME_LEN} characters"
        )));
    }
    validate_price(price)?;
    validate_stock(stock)
}

fn validate_price(price: Money) -> Result<(), CatalogError> {
    if price.amount() < MIN_PRODUCT_PRICE || price.amount() > MAX_PRODUCT_PRICE {
        return Err(CatalogError::Validation(format!(
            "price must be between {MIN_PRODUCT_PRICE} and {MAX_PRODUCT_PRICE}"
        )));
    }
    Ok(())
}

fn validate_stock(stock: u32) -> Result<(), CatalogError> {
    if stock > MAX_PRODUCT_STOCK {
        return Err(CatalogError::Validation(format!(
            "stock cannot exceed {MAX_PRODUCT_STOCK}"
        )));
    }
    Ok(())
}

/// SKU for products created without one: `MB-<base36 time>-<base36 rand>`.
fn generate_sku() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: u32 = rand::rng().random_range(0..36_u32.pow(4));
    format!("MB-{}-{}", base36(millis), base36(u64::from(suffix)))
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::config::CacheTtls;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    fn service() -> (Arc<MemoryStore>, Arc<MemoryBlobStore>, CatalogService) {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let gateway = Gateway::new(store.clone(), CacheTtls::default());
        (store.clone(), blobs.clone(), CatalogService::new(gateway, blobs))
    }

    fn new_product(name: &str, price: Money, stock: u32) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: String::new(),
            price,
            category: Category::Perfume,
            stock,
            sku: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_sku_and_activity() {
        let (_, _, service) = service();
        let product = service
            .create(new_product("oud noir", Money::from(120u32), 3))
            .await
            .expect("create");
        assert!(product.sku.starts_with("MB-"));
        assert!(product.active);

        let empty = service
            .create(new_product("sold out balm", Money::from(10u32), 0))
            .await
            .expect("create");
        assert!(!empty.active, "zero stock means inactive");
    }

    #[tokio::test]
    async fn boundary_validation() {
        let (store, _, service) = service();

        // Inside the bounds.
        assert!(service
            .create(new_product("aa", Money::ZERO, 0))
            .await
            .is_ok());
        assert!(service
            .create(new_product("max", Money::new(Decimal::from(1_000_000)), 10_000))
            .await
            .is_ok());

        let writes = store.write_count();

        // Outside the bounds, rejected before any write.
        assert!(matches!(
            service.create(new_product("x", Money::from(10u32), 1)).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            service
                .create(new_product("neg", Money::new(Decimal::NEGATIVE_ONE), 1))
                .await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            service
                .create(new_product("over", Money::from(10u32), 10_001))
                .await,
            Err(CatalogError::Validation(_))
        ));
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn listing_filters_and_sorts() {
        let (_, _, service) = service();
        service
            .create(new_product("amber mist", Money::from(80u32), 5))
            .await
            .expect("a");
        service
            .create(new_product("rose water", Money::from(40u32), 0))
            .await
            .expect("b");
        let mut lipstick = new_product("velvet lipstick", Money::from(25u32), 9);
        lipstick.category = Category::Makeup;
        service.create(lipstick).await.expect("c");

        let perfumes = service
            .list(&ProductFilter {
                category: Some(Category::Perfume),
                ..ProductFilter::default()
            })
            .await
            .expect("list");
        assert_eq!(perfumes.total, 2);

        let active = service
            .list(&ProductFilter {
                active: Some(true),
                sort: ProductSort::PriceAsc,
                ..ProductFilter::default()
            })
            .await
            .expect("list");
        let prices: Vec<_> = active.items.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![Money::from(25u32), Money::from(80u32)]);

        let found = service
            .list(&ProductFilter {
                search: Some("LIP".to_owned()),
                ..ProductFilter::default()
            })
            .await
            .expect("list");
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].name, "velvet lipstick");
    }

    #[tokio::test]
    async fn stats_follow_mutations() {
        let (_, _, service) = service();
        service
            .create(new_product("amber mist", Money::from(80u32), 5))
            .await
            .expect("a");
        let gone = service
            .create(new_product("rose water", Money::from(40u32), 0))
            .await
            .expect("b");

        let stats = service.stats().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.out_of_stock, 1);

        service.delete(&gone.id).await.expect("delete");
        let stats = service.stats().await.expect("stats");
        assert_eq!(stats.total, 1);
        assert_eq!(stats.out_of_stock, 0);
    }

    #[tokio::test]
    async fn replacing_image_deletes_the_old_blob() {
        let (_, blobs, service) = service();
        let image = ImageUpload {
            filename: "a.jpg".to_owned(),
            content_type: "image/jpeg".to_owned(),
            bytes: vec![1, 2, 3],
        };
        let mut input = new_product("amber mist", Money::from(80u32), 5);
        input.image = Some(image.clone());
        let product = service.create(input).await.expect("create");
        assert_eq!(blobs.len(), 1);

        service
            .update(
                &product.id,
                UpdateProduct {
                    image: Some(image),
                    ..UpdateProduct::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(blobs.len(), 1, "old image removed, new one stored");
    }
}
