//! Integration tests for Mirra Beauty.
//!
//! The whole service stack runs against in-memory backends, so these
//! tests exercise real service wiring (gateway caching, atomic batch
//! commits, counter increments) without any network.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mirra-integration-tests
//! ```

use std::sync::Arc;

use mirra_backend::Gateway;
use mirra_backend::blob::{ImageUpload, MemoryBlobStore};
use mirra_backend::config::CacheTtls;
use mirra_backend::identity::MemoryIdentityProvider;
use mirra_backend::models::Product;
use mirra_backend::services::{
    CatalogService, CheckoutItem, CheckoutRequest, NewProduct, OrderService, ProfileService,
    SettingsService,
};
use mirra_backend::store::MemoryStore;
use mirra_core::{Category, Money, UserId};

/// The full backend stack over in-memory stores.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub identity: Arc<MemoryIdentityProvider>,
    pub gateway: Gateway,
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub settings: SettingsService,
    pub profiles: ProfileService,
}

impl TestContext {
    /// Fresh stack with default cache TTLs and seeded settings.
    pub async fn new() -> Self {
        Self::with_ttls(CacheTtls::default()).await
    }

    /// Fresh stack with custom cache TTLs and seeded settings.
    pub async fn with_ttls(ttls: CacheTtls) -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let identity = Arc::new(MemoryIdentityProvider::new());
        let gateway = Gateway::new(store.clone(), ttls);

        let catalog = CatalogService::new(gateway.clone(), blobs.clone());
        let orders = OrderService::new(gateway.clone(), blobs.clone());
        let settings = SettingsService::new(gateway.clone());
        let profiles = ProfileService::new(gateway.clone());

        settings.ensure_defaults().await.expect("seed settings");

        Self {
            store,
            blobs,
            identity,
            gateway,
            catalog,
            orders,
            settings,
            profiles,
        }
    }

    /// Create an active product through the catalog service.
    pub async fn add_product(&self, name: &str, price: u32, stock: u32) -> Product {
        self.catalog
            .create(NewProduct {
                name: name.to_owned(),
                description: format!("{name} description"),
                price: Money::from(price),
                category: Category::Perfume,
                stock,
                sku: None,
                image: None,
            })
            .await
            .expect("create product")
    }

    /// A small valid receipt image.
    #[must_use]
    pub fn receipt() -> ImageUpload {
        ImageUpload {
            filename: "receipt.jpg".to_owned(),
            content_type: "image/jpeg".to_owned(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        }
    }

    /// A checkout request for the given product lines.
    #[must_use]
    pub fn checkout_request(
        user_id: Option<UserId>,
        items: Vec<CheckoutItem>,
    ) -> CheckoutRequest {
        CheckoutRequest {
            user_id,
            customer_name: "Amina Hassan".to_owned(),
            phone: "+249912345678".to_owned(),
            address: "Street 15, Al Amarat, Khartoum".to_owned(),
            email: None,
            items,
            notes: None,
            receipt: Self::receipt(),
        }
    }
}
