//! Seed the settings document and order counter.
//!
//! Safe to run repeatedly: existing documents are left untouched, so a
//! live counter never gets reset.
//!
//! # Environment Variables
//!
//! - `MIRRA_DOCUMENT_API_URL` - Base URL of the hosted document API
//! - `MIRRA_API_KEY` - Project API key

use std::sync::Arc;

use tracing::info;

use mirra_backend::Gateway;
use mirra_backend::config::CacheTtls;
use mirra_backend::services::SettingsService;
use mirra_backend::store::MemoryStore;

use super::gateway_from_env;

/// Run the seed, against an in-memory store when `dry_run` is set.
///
/// # Errors
///
/// Returns an error when configuration is missing or the store rejects
/// the writes.
pub async fn run(dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = if dry_run {
        info!("dry run: seeding an in-memory store");
        Gateway::new(Arc::new(MemoryStore::new()), CacheTtls::default())
    } else {
        gateway_from_env()?
    };

    let settings = SettingsService::new(gateway);
    settings.ensure_defaults().await?;

    let current = settings.get().await?;
    info!(
        store = %current.store_name,
        shipping = %current.shipping_cost,
        "seed complete"
    );
    Ok(())
}
