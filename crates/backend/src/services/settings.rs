//! Store settings service.
//!
//! Two singleton documents: `settings/general` holds the store profile
//! and shipping policy, `settings/order_counter` holds the last assigned
//! order number. Missing documents are replaced by defaults.

use serde_json::json;
use thiserror::Error;
use tracing::info;

use mirra_core::Money;

use crate::Gateway;
use crate::models::{StoreSettings, ThemePalette};
use crate::store::{StoreError, collections};

pub const GENERAL_DOC: &str = "general";
pub const COUNTER_DOC: &str = "order_counter";
pub const COUNTER_FIELD: &str = "last_order_number";

/// The counter value before any order exists; the first order gets 1001.
pub const COUNTER_SEED: i64 = 1000;

const MIN_STORE_NAME_LEN: usize = 2;

/// Errors from settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fields an admin may change. Absent fields are left as they are.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SettingsUpdate {
    pub store_name: Option<String>,
    pub store_email: Option<String>,
    pub store_phone: Option<String>,
    pub store_address: Option<String>,
    pub store_description: Option<String>,
    pub shipping_cost: Option<Money>,
    pub free_shipping_threshold: Option<Money>,
    pub theme: Option<ThemePalette>,
}

/// Service over the settings documents.
#[derive(Clone)]
pub struct SettingsService {
    gateway: Gateway,
}

impl SettingsService {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Current settings, falling back to defaults when the document is
    /// absent or unreadable in part.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn get(&self) -> Result<StoreSettings, SettingsError> {
        let doc = self
            .gateway
            .get_doc(collections::SETTINGS, GENERAL_DOC)
            .await?;
        match doc {
            Some(doc) => Ok(StoreSettings::from_document(&doc)?),
            None => Ok(StoreSettings::default()),
        }
    }

    /// Write the default documents where they are missing. Invoked by
    /// the seed command; safe to run repeatedly.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn ensure_defaults(&self) -> Result<(), SettingsError> {
        if self
            .gateway
            .get_doc(collections::SETTINGS, GENERAL_DOC)
            .await?
            .is_none()
        {
            let defaults = StoreSettings::default();
            self.gateway
                .set(collections::SETTINGS, GENERAL_DOC, defaults.to_value()?)
                .await?;
            info!("seeded default store settings");
        }

        if self
            .gateway
            .get_doc(collections::SETTINGS, COUNTER_DOC)
            .await?
            .is_none()
        {
            self.gateway
                .set(
                    collections::SETTINGS,
                    COUNTER_DOC,
                    json!({ COUNTER_FIELD: COUNTER_SEED }),
                )
                .await?;
            info!(seed = COUNTER_SEED, "seeded order counter");
        }
        Ok(())
    }

    /// Apply an admin update on top of the current settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] before any write when a
    /// field fails its bounds.
    pub async fn update(&self, update: SettingsUpdate) -> Result<StoreSettings, SettingsError> {
        validate(&update)?;

        let mut settings = self.get().await?;
        if let Some(name) = update.store_name {
            settings.store_name = name.trim().to_owned();
        }
        if let Some(email) = update.store_email {
            settings.store_email = email.trim().to_owned();
        }
        if let Some(phone) = update.store_phone {
            settings.store_phone = phone.trim().to_owned();
        }
        if let Some(address) = update.store_address {
            settings.store_address = address.trim().to_owned();
        }
        if let Some(description) = update.store_description {
            settings.store_description = description;
        }
        if let Some(cost) = update.shipping_cost {
            settings.shipping_cost = cost;
        }
        if let Some(threshold) = update.free_shipping_threshold {
            settings.free_shipping_threshold = threshold;
        }
        if let Some(theme) = update.theme {
            settings.theme = theme;
        }

        self.gateway
            .set(collections::SETTINGS, GENERAL_DOC, settings.to_value()?)
            .await?;
        Ok(settings)
    }

    /// Replace the settings with the defaults.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn reset(&self) -> Result<StoreSettings, SettingsError> {
        let defaults = StoreSettings::default();
        self.gateway
            .set(collections::SETTINGS, GENERAL_DOC, defaults.to_value()?)
            .await?;
        Ok(defaults)
    }
}

fn validate(update: &SettingsUpdate) -> Result<(), SettingsError> {
    if let Some(name) = &update.store_name
        && name.trim().len() < MIN_STORE_NAME_LEN
    {
        return Err(SettingsError::Validation(format!(
            "store name must be at least {MIN_STORE_NAME_LEN} characters"
        )));
    }
    if let Some(cost) = update.shipping_cost
        && cost.is_negative()
    {
        return Err(SettingsError::Validation(
            "shipping cost cannot be negative".to_owned(),
        ));
    }
    if let Some(threshold) = update.free_shipping_threshold
        && threshold.is_negative()
    {
        return Err(SettingsError::Validation(
            "free shipping threshold cannot be negative".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheTtls;
    use crate::store::{DocumentStore, MemoryStore};
    use std::sync::Arc;

    fn service() -> (Arc<MemoryStore>, SettingsService) {
        let store = Arc::new(MemoryStore::new());
        let gateway = Gateway::new(store.clone(), CacheTtls::default());
        (store, SettingsService::new(gateway))
    }

    #[tokio::test]
    async fn missing_document_yields_defaults() {
        let (_, service) = service();
        let settings = service.get().await.expect("get");
        assert_eq!(settings, StoreSettings::default());
    }

    #[tokio::test]
    async fn ensure_defaults_is_idempotent() {
        let (store, service) = service();
        service.ensure_defaults().await.expect("first");
        let writes = store.write_count();
        service.ensure_defaults().await.expect("second");
        assert_eq!(store.write_count(), writes, "no rewrite when present");

        let counter = store
            .get(collections::SETTINGS, COUNTER_DOC)
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(counter.data[COUNTER_FIELD], serde_json::json!(COUNTER_SEED));
    }

    #[tokio::test]
    async fn negative_shipping_cost_rejected_before_write() {
        let (store, service) = service();
        let update = SettingsUpdate {
            shipping_cost: Some(Money::new(rust_decimal::Decimal::NEGATIVE_ONE)),
            ..SettingsUpdate::default()
        };
        assert!(matches!(
            service.update(update).await,
            Err(SettingsError::Validation(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn update_merges_over_current_values() {
        let (_, service) = service();
        let updated = service
            .update(SettingsUpdate {
                store_name: Some("Mirra Beauty KRT".to_owned()),
                shipping_cost: Some(Money::from(20u32)),
                ..SettingsUpdate::default()
            })
            .await
            .expect("update");
        assert_eq!(updated.store_name, "Mirra Beauty KRT");
        assert_eq!(updated.shipping_cost, Money::from(20u32));
        // Untouched fields keep their values.
        assert_eq!(
            updated.free_shipping_threshold,
            StoreSettings::default().free_shipping_threshold
        );
    }
}
