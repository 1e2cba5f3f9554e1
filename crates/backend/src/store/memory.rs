//! In-memory document store.
//!
//! Backs the integration tests and the CLI `--dry-run` mode. Matches the
//! hosted service's semantics where they matter: batches are atomic,
//! increments are linearizable, and merge-writes deep-merge objects one
//! level at a time the way the real service does.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Document, DocumentStore, FilterOp, Query, StoreError, WriteOp};

#[derive(Default)]
struct Inner {
    collections: BTreeMap<String, BTreeMap<String, Value>>,
}

/// In-memory [`DocumentStore`] with call counting and failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    reads: AtomicU64,
    writes: AtomicU64,
    fail_next_read: AtomicBool,
    fail_next_write: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read operations (get/list) served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    /// Number of write operations applied so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Make the next read fail with a backend error.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, AtomicOrdering::SeqCst);
    }

    /// Make the next write fail with a backend error.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, AtomicOrdering::SeqCst);
    }

    fn check_read_failure(&self) -> Result<(), StoreError> {
        if self.fail_next_read.swap(false, AtomicOrdering::SeqCst) {
            return Err(StoreError::Backend {
                status: 503,
                message: "injected read failure".to_owned(),
            });
        }
        Ok(())
    }

    fn check_write_failure(&self) -> Result<(), StoreError> {
        if self.fail_next_write.swap(false, AtomicOrdering::SeqCst) {
            return Err(StoreError::Backend {
                status: 503,
                message: "injected write failure".to_owned(),
            });
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panicked test thread; the data is still
        // consistent because every mutation completes under the lock.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Merge `patch` into `target`, object fields one level deep.
fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                target_map.insert(key, value);
            }
        }
        (target_slot, patch) => *target_slot = patch,
    }
}

fn matches_filter(data: &Value, field: &str, op: FilterOp, expected: &Value) -> bool {
    let Some(actual) = data.get(field) else {
        return false;
    };
    match op {
        FilterOp::Eq => actual == expected,
        FilterOp::Ge => compare(actual, expected).is_some_and(Ordering::is_ge),
        FilterOp::Le => compare(actual, expected).is_some_and(Ordering::is_le),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_read_failure()?;
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);

        let inner = self.lock();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check_read_failure()?;
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);

        let inner = self.lock();
        let mut docs: Vec<Document> = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| {
                        query
                            .filters
                            .iter()
                            .all(|f| matches_filter(data, &f.field, f.op, &f.value))
                    })
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            docs.sort_by(|a, b| {
                let lhs = a.data.get(&order.field);
                let rhs = b.data.get(&order.field);
                let ord = match (lhs, rhs) {
                    (Some(l), Some(r)) => compare(l, r).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                if order.descending { ord.reverse() } else { ord }
            });
        }

        Ok(docs)
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        self.check_write_failure()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let id = generate_id();
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.check_write_failure()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut inner = self.lock();
        let docs = inner.collections.entry(collection.to_owned()).or_default();
        match docs.get_mut(id) {
            Some(existing) => merge(existing, data),
            None => {
                docs.insert(id.to_owned(), data);
            }
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.check_write_failure()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut inner = self.lock();
        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;
        merge(existing, data);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_write_failure()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut inner = self.lock();
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn commit(&self, writes: Vec<WriteOp>) -> Result<(), StoreError> {
        self.check_write_failure()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut inner = self.lock();

        // Validate every op before mutating anything so the batch is
        // all-or-nothing.
        for op in &writes {
            if let WriteOp::Update { collection, id, .. } = op {
                let exists = inner
                    .collections
                    .get(collection)
                    .is_some_and(|docs| docs.contains_key(id));
                if !exists {
                    return Err(StoreError::NotFound {
                        collection: collection.clone(),
                        id: id.clone(),
                    });
                }
            }
        }

        for op in writes {
            match op {
                WriteOp::Create { collection, id, data } => {
                    inner
                        .collections
                        .entry(collection)
                        .or_default()
                        .insert(id, data);
                }
                WriteOp::Update { collection, id, data } => {
                    if let Some(existing) = inner
                        .collections
                        .get_mut(&collection)
                        .and_then(|docs| docs.get_mut(&id))
                    {
                        merge(existing, data);
                    }
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(docs) = inner.collections.get_mut(&collection) {
                        docs.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        self.check_write_failure()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut inner = self.lock();
        let docs = inner.collections.entry(collection.to_owned()).or_default();
        let doc = docs
            .entry(id.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));

        let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
        let next = current + delta;
        if let Value::Object(map) = doc {
            map.insert(field.to_owned(), Value::from(next));
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_merges_fields() {
        let store = MemoryStore::new();
        store
            .set("products", "p1", json!({"name": "rose oil", "stock": 5}))
            .await
            .expect("set");
        store
            .set("products", "p1", json!({"stock": 3}))
            .await
            .expect("merge");

        let doc = store.get("products", "p1").await.expect("get").expect("exists");
        assert_eq!(doc.data, json!({"name": "rose oil", "stock": 3}));
    }

    #[tokio::test]
    async fn update_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .update("products", "ghost", json!({"stock": 1}))
            .await
            .expect_err("should fail");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .set("products", "p1", json!({"stock": 5}))
            .await
            .expect("seed");

        // Second op targets a missing document; the first must not apply.
        let err = store
            .commit(vec![
                WriteOp::Update {
                    collection: "products".into(),
                    id: "p1".into(),
                    data: json!({"stock": 4}),
                },
                WriteOp::Update {
                    collection: "products".into(),
                    id: "ghost".into(),
                    data: json!({"stock": 1}),
                },
            ])
            .await
            .expect_err("batch must fail");
        assert!(matches!(err, StoreError::NotFound { .. }));

        let doc = store.get("products", "p1").await.expect("get").expect("exists");
        assert_eq!(doc.data["stock"], json!(5));
    }

    #[tokio::test]
    async fn increment_is_cumulative_and_seeds_missing_docs() {
        let store = MemoryStore::new();
        assert_eq!(
            store.increment("settings", "order_counter", "last_order_number", 1000).await.expect("seed"),
            1000
        );
        assert_eq!(
            store.increment("settings", "order_counter", "last_order_number", 1).await.expect("inc"),
            1001
        );
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let store = MemoryStore::new();
        store.set("orders", "a", json!({"status": "pending", "number": 2})).await.expect("a");
        store.set("orders", "b", json!({"status": "shipped", "number": 1})).await.expect("b");
        store.set("orders", "c", json!({"status": "pending", "number": 3})).await.expect("c");

        let query = Query::all().with_eq("status", "pending").order_by("number", true);
        let docs = store.list("orders", &query).await.expect("list");
        let numbers: Vec<_> = docs.iter().map(|d| d.data["number"].as_i64().unwrap()).collect();
        assert_eq!(numbers, vec![3, 2]);
    }

    #[tokio::test]
    async fn failure_injection_is_one_shot() {
        let store = MemoryStore::new();
        store.fail_next_read();
        assert!(store.get("products", "p1").await.is_err());
        assert!(store.get("products", "p1").await.is_ok());
    }
}
