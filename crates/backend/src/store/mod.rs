//! Document store abstraction.
//!
//! The hosted service exposes collections of JSON documents with atomic
//! batched writes and server-side numeric transforms. [`DocumentStore`]
//! captures exactly the surface the rest of the crate needs; [`HttpStore`]
//! talks to the real service and [`MemoryStore`] backs tests and the CLI
//! dry-run mode.

mod http;
mod memory;

pub use http::HttpStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Collection names used throughout the crate.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const USERS: &str = "users";
    pub const SETTINGS: &str = "settings";
    pub const STATS: &str = "stats";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// Errors from document-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or transport failure talking to the hosted service.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The configured base URL is not a valid URL.
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The service rejected the request for permission reasons.
    #[error("permission denied")]
    PermissionDenied,

    /// A write conflicted with concurrent modification.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// The document payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend-reported failure.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },
}

/// A document as returned by the store: its ID plus the JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Build a document in memory.
    #[must_use]
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Comparison operator for a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ge,
    Le,
}

/// A single field predicate.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Sort order for query results.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// A collection query: equality/range predicates plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Query with no predicates (full collection scan).
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality predicate.
    #[must_use]
    pub fn with_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_owned(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Sort by a field, newest-style descending when `descending` is true.
    #[must_use]
    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_owned(),
            descending,
        });
        self
    }

    /// Stable signature used as a cache key component.
    ///
    /// Field order is preserved, so two queries built the same way always
    /// share a signature.
    #[must_use]
    pub fn signature(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One write in an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create a document with a caller-chosen ID.
    Create {
        collection: String,
        id: String,
        data: Value,
    },
    /// Merge fields into an existing document.
    Update {
        collection: String,
        id: String,
        data: Value,
    },
    /// Delete a document.
    Delete { collection: String, id: String },
}

impl WriteOp {
    /// The collection this write touches, for cache invalidation.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }
}

/// The hosted document database surface.
///
/// `commit` is atomic: either every [`WriteOp`] applies or none do.
/// `increment` is a server-side transform; two concurrent calls never
/// observe the same value, which is what makes order numbers unique.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document, `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Run a query against a collection.
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Create a document with a store-assigned ID; returns the ID.
    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError>;

    /// Create or merge-write a document at a known ID.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    /// Merge fields into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Apply a batch of writes atomically.
    async fn commit(&self, writes: Vec<WriteOp>) -> Result<(), StoreError>;

    /// Atomically add `delta` to a numeric field, creating the document
    /// and treating a missing field as `0`. Returns the new value.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_signature_is_stable() {
        let a = Query::all().with_eq("status", "pending").order_by("created_at", true);
        let b = Query::all().with_eq("status", "pending").order_by("created_at", true);
        assert_eq!(a.signature(), b.signature());

        let c = Query::all().with_eq("status", "shipped");
        assert_ne!(a.signature(), c.signature());
    }

    #[test]
    fn write_op_reports_collection() {
        let op = WriteOp::Delete {
            collection: collections::ORDERS.to_owned(),
            id: "o1".to_owned(),
        };
        assert_eq!(op.collection(), "orders");
    }
}
