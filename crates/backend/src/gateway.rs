//! Read-through cached gateway over the document store.
//!
//! Every read goes through a `moka` cache keyed by document or query
//! signature, with a per-collection TTL. Every write invalidates the
//! whole touched collection, so a write followed by a read never serves
//! the pre-write value. Failed reads are not cached and failed writes
//! do not invalidate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::CacheTtls;
use crate::store::{Document, DocumentStore, Query, StoreError, WriteOp};

const CACHE_CAPACITY: u64 = 10_000;

/// Cache key: a single document or a query over a collection.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Doc { collection: String, id: String },
    Query { collection: String, signature: String },
}

impl CacheKey {
    fn doc(collection: &str, id: &str) -> Self {
        Self::Doc {
            collection: collection.to_owned(),
            id: id.to_owned(),
        }
    }

    fn query(collection: &str, query: &Query) -> Self {
        Self::Query {
            collection: collection.to_owned(),
            signature: query.signature(),
        }
    }

    /// The collection this entry belongs to.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Doc { collection, .. } | Self::Query { collection, .. } => collection,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    /// A single document; `None` caches a confirmed miss.
    Doc(Option<Document>),
    List(Vec<Document>),
}

/// Per-collection time-to-live, driven by [`CacheTtls`].
struct PerCollectionExpiry {
    ttls: CacheTtls,
}

impl Expiry<CacheKey, Arc<CacheValue>> for PerCollectionExpiry {
    fn expire_after_create(
        &self,
        key: &CacheKey,
        _value: &Arc<CacheValue>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.ttls.ttl_for(key.collection()))
    }
}

/// Cached front door to the document store. Cheap to clone.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    store: Arc<dyn DocumentStore>,
    cache: Cache<CacheKey, Arc<CacheValue>>,
}

impl Gateway {
    /// Wrap a store with a read-through cache using the given TTLs.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, ttls: CacheTtls) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .expire_after(PerCollectionExpiry { ttls })
            .support_invalidation_closures()
            .build();

        Self {
            inner: Arc::new(GatewayInner { store, cache }),
        }
    }

    /// Fetch a document, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Propagates store errors; errors are never cached.
    #[instrument(skip(self))]
    pub async fn get_doc(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let key = CacheKey::doc(collection, id);
        if let Some(value) = self.inner.cache.get(&key).await
            && let CacheValue::Doc(doc) = value.as_ref()
        {
            debug!("cache hit for document");
            return Ok(doc.clone());
        }

        let doc = self.inner.store.get(collection, id).await?;
        self.inner
            .cache
            .insert(key, Arc::new(CacheValue::Doc(doc.clone())))
            .await;
        Ok(doc)
    }

    /// Fetch a document straight from the store, bypassing the cache.
    ///
    /// Stock checks during checkout use this: a stale cached quantity
    /// must not decide whether an order goes through. The fresh value
    /// is cached for subsequent plain reads.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    #[instrument(skip(self))]
    pub async fn get_doc_fresh(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let doc = self.inner.store.get(collection, id).await?;
        self.inner
            .cache
            .insert(
                CacheKey::doc(collection, id),
                Arc::new(CacheValue::Doc(doc.clone())),
            )
            .await;
        Ok(doc)
    }

    /// Run a query, served from cache when an identical query is fresh.
    ///
    /// # Errors
    ///
    /// Propagates store errors; errors are never cached.
    #[instrument(skip(self, query))]
    pub async fn list(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let key = CacheKey::query(collection, query);
        if let Some(value) = self.inner.cache.get(&key).await
            && let CacheValue::List(docs) = value.as_ref()
        {
            debug!("cache hit for query");
            return Ok(docs.clone());
        }

        let docs = self.inner.store.list(collection, query).await?;
        self.inner
            .cache
            .insert(key, Arc::new(CacheValue::List(docs.clone())))
            .await;
        Ok(docs)
    }

    /// Create a document with a store-assigned ID.
    ///
    /// # Errors
    ///
    /// Propagates store errors; on failure the cache is left untouched.
    #[instrument(skip(self, data))]
    pub async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let id = self.inner.store.create(collection, data).await?;
        self.invalidate_collection(collection);
        Ok(id)
    }

    /// Create or merge-write a document at a known ID.
    ///
    /// # Errors
    ///
    /// Propagates store errors; on failure the cache is left untouched.
    #[instrument(skip(self, data))]
    pub async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.inner.store.set(collection, id, data).await?;
        self.invalidate_collection(collection);
        Ok(())
    }

    /// Merge fields into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist;
    /// on failure the cache is left untouched.
    #[instrument(skip(self, data))]
    pub async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.inner.store.update(collection, id, data).await?;
        self.invalidate_collection(collection);
        Ok(())
    }

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Propagates store errors; on failure the cache is left untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.store.delete(collection, id).await?;
        self.invalidate_collection(collection);
        Ok(())
    }

    /// Apply an atomic batch, then invalidate every touched collection.
    ///
    /// # Errors
    ///
    /// Propagates store errors; if the batch fails nothing is invalidated
    /// because nothing was written.
    #[instrument(skip(self, writes), fields(count = writes.len()))]
    pub async fn commit(&self, writes: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut collections: Vec<String> =
            writes.iter().map(|op| op.collection().to_owned()).collect();
        collections.sort_unstable();
        collections.dedup();

        self.inner.store.commit(writes).await?;
        for collection in &collections {
            self.invalidate_collection(collection);
        }
        Ok(())
    }

    /// Atomically add `delta` to a numeric field and return the new value.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    #[instrument(skip(self))]
    pub async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let value = self.inner.store.increment(collection, id, field, delta).await?;
        self.invalidate_collection(collection);
        Ok(value)
    }

    /// Drop every cached entry for a collection, documents and queries.
    pub fn invalidate_collection(&self, collection: &str) {
        let target = collection.to_owned();
        // The predicate registration only fails when invalidation closures
        // were not enabled at build time, which they are.
        if let Err(err) = self
            .inner
            .cache
            .invalidate_entries_if(move |key, _| key.collection() == target)
        {
            tracing::warn!(collection, error = %err, "cache invalidation failed");
        } else {
            debug!(collection, "invalidated cached entries");
        }
    }

    /// Direct access to the underlying store, for callers that need
    /// primitives the cache does not mediate.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, collections};
    use serde_json::json;

    fn gateway_with(store: Arc<MemoryStore>, ttls: CacheTtls) -> Gateway {
        Gateway::new(store, ttls)
    }

    #[tokio::test]
    async fn repeated_reads_hit_the_cache() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(collections::PRODUCTS, "p1", json!({"name": "amber mist"}))
            .await
            .expect("seed");
        let gateway = gateway_with(store.clone(), CacheTtls::default());

        let first = gateway.get_doc(collections::PRODUCTS, "p1").await.expect("read");
        let second = gateway.get_doc(collections::PRODUCTS, "p1").await.expect("read");
        assert_eq!(first, second);
        // Seed write plus one backing read; the second read was cached.
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn misses_are_cached_too() {
        let store = Arc::new(MemoryStore::new());
        let gateway = gateway_with(store.clone(), CacheTtls::default());

        assert!(gateway.get_doc(collections::PRODUCTS, "nope").await.expect("read").is_none());
        assert!(gateway.get_doc(collections::PRODUCTS, "nope").await.expect("read").is_none());
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn write_invalidates_the_collection() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(collections::PRODUCTS, "p1", json!({"stock": 5}))
            .await
            .expect("seed");
        let gateway = gateway_with(store.clone(), CacheTtls::default());

        let before = gateway
            .get_doc(collections::PRODUCTS, "p1")
            .await
            .expect("read")
            .expect("exists");
        assert_eq!(before.data["stock"], json!(5));

        gateway
            .update(collections::PRODUCTS, "p1", json!({"stock": 4}))
            .await
            .expect("update");
        // moka applies invalidation predicates lazily but guarantees they
        // cover entries inserted before registration; run pending tasks so
        // the next read observes it deterministically.
        gateway.inner.cache.run_pending_tasks().await;

        let after = gateway
            .get_doc(collections::PRODUCTS, "p1")
            .await
            .expect("read")
            .expect("exists");
        assert_eq!(after.data["stock"], json!(4));
    }

    #[tokio::test]
    async fn failed_write_keeps_cache_intact() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(collections::PRODUCTS, "p1", json!({"stock": 5}))
            .await
            .expect("seed");
        let gateway = gateway_with(store.clone(), CacheTtls::default());

        gateway.get_doc(collections::PRODUCTS, "p1").await.expect("warm");
        let reads_before = store.read_count();

        store.fail_next_write();
        assert!(
            gateway
                .update(collections::PRODUCTS, "p1", json!({"stock": 0}))
                .await
                .is_err()
        );

        gateway.get_doc(collections::PRODUCTS, "p1").await.expect("read");
        assert_eq!(store.read_count(), reads_before, "cached entry survived");
    }

    #[tokio::test]
    async fn failed_read_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(collections::PRODUCTS, "p1", json!({"stock": 5}))
            .await
            .expect("seed");
        let gateway = gateway_with(store.clone(), CacheTtls::default());

        store.fail_next_read();
        assert!(gateway.get_doc(collections::PRODUCTS, "p1").await.is_err());

        // The retry reaches the store instead of a cached error.
        let doc = gateway
            .get_doc(collections::PRODUCTS, "p1")
            .await
            .expect("read")
            .expect("exists");
        assert_eq!(doc.data["stock"], json!(5));
    }

    #[tokio::test]
    async fn entries_expire_after_collection_ttl() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(collections::PRODUCTS, "p1", json!({"stock": 5}))
            .await
            .expect("seed");
        let ttls = CacheTtls::default().with_ttl(collections::PRODUCTS, Duration::from_millis(20));
        let gateway = gateway_with(store.clone(), ttls);

        gateway.get_doc(collections::PRODUCTS, "p1").await.expect("warm");
        assert_eq!(store.read_count(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        gateway.inner.cache.run_pending_tasks().await;

        gateway.get_doc(collections::PRODUCTS, "p1").await.expect("reread");
        assert_eq!(store.read_count(), 2, "expired entry refetched");
    }

    #[tokio::test]
    async fn fresh_read_bypasses_cache() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(collections::PRODUCTS, "p1", json!({"stock": 5}))
            .await
            .expect("seed");
        let gateway = gateway_with(store.clone(), CacheTtls::default());

        gateway.get_doc(collections::PRODUCTS, "p1").await.expect("warm");
        gateway.get_doc_fresh(collections::PRODUCTS, "p1").await.expect("fresh");
        assert_eq!(store.read_count(), 2);
    }
}
