//! CLI command implementations.

pub mod admin;
pub mod seed;

use std::sync::Arc;

use mirra_backend::Gateway;
use mirra_backend::config::CacheTtls;
use mirra_backend::env;
use mirra_backend::store::HttpStore;

/// Build a gateway over the hosted document API from the environment.
///
/// # Errors
///
/// Returns an error when `MIRRA_DOCUMENT_API_URL` or `MIRRA_API_KEY`
/// is missing or the URL is invalid.
pub fn gateway_from_env() -> Result<Gateway, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let url = env::required("MIRRA_DOCUMENT_API_URL")?;
    let api_key = env::validated_secret("MIRRA_API_KEY")?;
    let store = HttpStore::new(&url, api_key)?;
    Ok(Gateway::new(Arc::new(store), CacheTtls::default()))
}
