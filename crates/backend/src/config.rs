//! Backend connection configuration.
//!
//! The binaries load these values from their own environment-variable
//! config and hand them over when constructing the gateway and clients.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;

use crate::store::collections;

/// Connection settings for the hosted backend service.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the document API (e.g. `https://api.example.dev/v1`).
    pub document_api_url: String,
    /// Base URL of the blob/media API.
    pub blob_api_url: String,
    /// Base URL of the identity API.
    pub identity_api_url: String,
    /// Project API key sent with every request.
    pub api_key: SecretString,
    /// Cache TTLs per collection.
    pub cache: CacheTtls,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("document_api_url", &self.document_api_url)
            .field("blob_api_url", &self.blob_api_url)
            .field("identity_api_url", &self.identity_api_url)
            .field("api_key", &"[REDACTED]")
            .field("cache", &self.cache)
            .finish()
    }
}

/// Per-collection time-to-live for cached reads.
///
/// Orders change most often and products less so; settings are nearly
/// static. Anything unlisted falls back to [`CacheTtls::DEFAULT_TTL`].
#[derive(Debug, Clone)]
pub struct CacheTtls {
    ttls: HashMap<String, Duration>,
}

impl CacheTtls {
    /// TTL for collections without an explicit entry.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    /// Look up the TTL for a collection.
    #[must_use]
    pub fn ttl_for(&self, collection: &str) -> Duration {
        self.ttls
            .get(collection)
            .copied()
            .unwrap_or(Self::DEFAULT_TTL)
    }

    /// Override the TTL for one collection.
    #[must_use]
    pub fn with_ttl(mut self, collection: &str, ttl: Duration) -> Self {
        self.ttls.insert(collection.to_owned(), ttl);
        self
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        let mut ttls = HashMap::new();
        ttls.insert(collections::STATS.to_owned(), Duration::from_secs(5 * 60));
        ttls.insert(collections::PRODUCTS.to_owned(), Duration::from_secs(2 * 60));
        ttls.insert(collections::ORDERS.to_owned(), Duration::from_secs(60));
        ttls.insert(collections::SETTINGS.to_owned(), Duration::from_secs(10 * 60));
        Self { ttls }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttls_match_collection_volatility() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.ttl_for(collections::STATS), Duration::from_secs(300));
        assert_eq!(ttls.ttl_for(collections::PRODUCTS), Duration::from_secs(120));
        assert_eq!(ttls.ttl_for(collections::ORDERS), Duration::from_secs(60));
        assert_eq!(ttls.ttl_for(collections::SETTINGS), Duration::from_secs(600));
        assert_eq!(ttls.ttl_for("notifications"), CacheTtls::DEFAULT_TTL);
    }

    #[test]
    fn ttl_override() {
        let ttls = CacheTtls::default().with_ttl(collections::PRODUCTS, Duration::from_millis(50));
        assert_eq!(
            ttls.ttl_for(collections::PRODUCTS),
            Duration::from_millis(50)
        );
    }
}
