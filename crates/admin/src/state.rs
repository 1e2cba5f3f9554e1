//! Application state shared across handlers.

use std::sync::Arc;

use mirra_backend::Gateway;
use mirra_backend::blob::BlobStore;
use mirra_backend::identity::IdentityProvider;
use mirra_backend::services::{CatalogService, OrderService, ProfileService, SettingsService};

use crate::config::AdminConfig;
use crate::services::AdminAuth;

/// Application state shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    catalog: CatalogService,
    orders: OrderService,
    settings: SettingsService,
    profiles: ProfileService,
    auth: AdminAuth,
}

impl AppState {
    /// Assemble the state from a gateway and the hosted-service clients.
    #[must_use]
    pub fn new(
        config: AdminConfig,
        gateway: Gateway,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let profiles = ProfileService::new(gateway.clone());
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(gateway.clone(), blobs.clone()),
                orders: OrderService::new(gateway.clone(), blobs),
                settings: SettingsService::new(gateway),
                auth: AdminAuth::new(identity, profiles.clone()),
                profiles,
                config,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsService {
        &self.inner.settings
    }

    #[must_use]
    pub fn profiles(&self) -> &ProfileService {
        &self.inner.profiles
    }

    #[must_use]
    pub fn auth(&self) -> &AdminAuth {
        &self.inner.auth
    }
}
