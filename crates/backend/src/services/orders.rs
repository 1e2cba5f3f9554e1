//! Order service: checkout, the status machine, listings, and stats.
//!
//! Checkout is the one place where money, stock, and the order counter
//! meet. The sequence is strict: validate, upload the receipt, take a
//! number from the atomic counter, then commit the order document and
//! every stock decrement in a single batch. Nothing after the batch can
//! fail the order.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};

use mirra_core::limits::{MAX_ADDRESS_LEN, MAX_NOTES_LEN};
use mirra_core::{
    Email, Money, OrderId, OrderNumber, OrderStatus, PaymentStatus, Phone, PhoneError, ProductId,
    UserId,
};

use crate::Gateway;
use crate::blob::{BlobError, BlobStore, ImageUpload};
use crate::models::{
    CustomerSnapshot, Notification, Order, OrderItem, OrderStats, Product, StatusChange,
    StoreSettings,
};
use crate::services::Page;
use crate::services::profiles::ProfileService;
use crate::services::settings::{COUNTER_DOC, COUNTER_FIELD};
use crate::store::{Query, StoreError, WriteOp, collections};

const RECEIPT_FOLDER: &str = "receipts";
const STATS_DOC: &str = "orders";

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid order: {0}")]
    Validation(String),

    #[error("invalid phone number")]
    Phone(#[from] PhoneError),

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("product not available: {0}")]
    ProductUnavailable(ProductId),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("receipt upload failed: {0}")]
    Receipt(#[from] BlobError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One requested line of a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Everything the storefront collects before placing an order.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub email: Option<Email>,
    pub items: Vec<CheckoutItem>,
    pub notes: Option<String>,
    pub receipt: ImageUpload,
}

/// Listing filter for the back office.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Service over the orders collection.
#[derive(Clone)]
pub struct OrderService {
    gateway: Gateway,
    blobs: Arc<dyn BlobStore>,
    profiles: ProfileService,
}

impl OrderService {
    #[must_use]
    pub fn new(gateway: Gateway, blobs: Arc<dyn BlobStore>) -> Self {
        let profiles = ProfileService::new(gateway.clone());
        Self {
            gateway,
            blobs,
            profiles,
        }
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Validation and receipt failures abort before any durable write;
    /// a failed batch leaves neither the order nor any stock change.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<Order, OrderError> {
        let phone = Phone::parse(&request.phone)?;
        validate_request(&request)?;

        let settings = self.load_settings().await?;

        // Fresh stock reads: a stale cached quantity must not accept an
        // order the store cannot fill.
        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let doc = self
                .gateway
                .get_doc_fresh(collections::PRODUCTS, item.product_id.as_str())
                .await?
                .ok_or_else(|| OrderError::ProductUnavailable(item.product_id.clone()))?;
            let product = Product::from_document(&doc)?;
            if !product.active || product.stock == 0 {
                return Err(OrderError::ProductUnavailable(item.product_id.clone()));
            }
            lines.push((product, item.quantity));
        }

        let receipt = self.blobs.upload(RECEIPT_FOLDER, request.receipt).await?;

        // The counter transform is atomic on the server, so concurrent
        // checkouts always draw distinct numbers.
        let counter = self
            .gateway
            .increment(collections::SETTINGS, COUNTER_DOC, COUNTER_FIELD, 1)
            .await?;
        let number = OrderNumber::from_counter(counter);

        let subtotal: Money = lines
            .iter()
            .map(|(product, qty)| product.price * *qty)
            .sum();
        let shipping = if subtotal >= settings.free_shipping_threshold {
            Money::ZERO
        } else {
            settings.shipping_cost
        };
        let total = subtotal + shipping;

        let now = Utc::now();
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|(product, qty)| OrderItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                quantity: *qty,
            })
            .collect();

        let order = Order {
            id: OrderId::new(uuid::Uuid::new_v4().simple().to_string()),
            number,
            user_id: request.user_id.clone(),
            customer: CustomerSnapshot {
                name: request.customer_name.trim().to_owned(),
                phone: phone.clone(),
                address: request.address.trim().to_owned(),
                email: request.email.clone(),
            },
            items,
            subtotal,
            shipping,
            total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            receipt_url: receipt.url,
            receipt_path: receipt.path,
            notes: request.notes,
            history: vec![StatusChange {
                status: OrderStatus::Pending,
                actor: "storefront".to_owned(),
                note: None,
                at: now,
            }],
            stock_restored: false,
            created_at: now,
            updated_at: now,
        };

        // Order creation and every stock decrement land together or not
        // at all.
        let mut writes = vec![WriteOp::Create {
            collection: collections::ORDERS.to_owned(),
            id: order.id.as_str().to_owned(),
            data: order.to_value()?,
        }];
        for (product, qty) in &lines {
            let new_stock = product.stock.saturating_sub(*qty);
            writes.push(WriteOp::Update {
                collection: collections::PRODUCTS.to_owned(),
                id: product.id.as_str().to_owned(),
                data: json!({ "stock": new_stock, "active": new_stock > 0 }),
            });
        }
        self.gateway.commit(writes).await?;
        info!(number = %order.number, total = %order.total, "order placed");

        self.after_checkout(&order, &phone).await;
        Ok(order)
    }

    /// Post-commit bookkeeping. None of it can fail the placed order.
    async fn after_checkout(&self, order: &Order, phone: &Phone) {
        if let Some(user_id) = &order.user_id {
            self.profiles
                .sync_contact(user_id, phone, &order.customer.address)
                .await;
        }

        let notification = Notification::new_order(order.id.clone(), &order.number);
        match serde_json::to_value(&notification) {
            Ok(data) => {
                if let Err(err) = self.gateway.create(collections::NOTIFICATIONS, data).await {
                    warn!(error = %err, "failed to write order notification");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode order notification"),
        }

        self.recompute_stats().await;
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for absent IDs.
    pub async fn get(&self, id: &OrderId) -> Result<Order, OrderError> {
        let doc = self
            .gateway
            .get_doc(collections::ORDERS, id.as_str())
            .await?
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;
        Ok(Order::from_document(&doc)?)
    }

    /// List orders, newest first, with filters and pagination.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Page<Order>, OrderError> {
        let docs = self
            .gateway
            .list(
                collections::ORDERS,
                &Query::all().order_by("created_at", true),
            )
            .await?;
        let mut orders = Vec::with_capacity(docs.len());
        for doc in &docs {
            orders.push(Order::from_document(doc)?);
        }

        orders.retain(|o| {
            filter.status.is_none_or(|s| o.status == s)
                && filter.search.as_deref().is_none_or(|needle| {
                    let needle = needle.to_lowercase();
                    o.number.as_str().to_lowercase().contains(&needle)
                        || o.customer.name.to_lowercase().contains(&needle)
                        || o.customer.phone.as_str().contains(&needle)
                })
        });

        Ok(Page::slice(orders, filter.page, filter.page_size))
    }

    /// Orders belonging to one customer, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderError> {
        let docs = self
            .gateway
            .list(
                collections::ORDERS,
                &Query::all()
                    .with_eq("user_id", user_id.as_str())
                    .order_by("created_at", true),
            )
            .await?;
        docs.iter()
            .map(|doc| Order::from_document(doc).map_err(OrderError::from))
            .collect()
    }

    /// Move an order to a new status, applying the entry effects.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] when the machine
    /// forbids the move; nothing is written in that case.
    #[instrument(skip(self, note))]
    pub async fn set_status(
        &self,
        id: &OrderId,
        to: OrderStatus,
        actor: &str,
        note: Option<String>,
    ) -> Result<Order, OrderError> {
        let mut order = self.get(id).await?;
        let from = order.status;
        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }

        order.status = to;
        order.updated_at = Utc::now();
        order.history.push(StatusChange {
            status: to,
            actor: actor.to_owned(),
            note,
            at: order.updated_at,
        });

        match to {
            OrderStatus::Delivered => {
                order.payment_status = PaymentStatus::Completed;
            }
            OrderStatus::Cancelled | OrderStatus::Refunded => {
                order.payment_status = PaymentStatus::Refunded;
            }
            _ => {}
        }

        let mut writes = Vec::new();
        if to == OrderStatus::Cancelled && !order.stock_restored {
            writes = self.stock_restore_writes(&order).await?;
            order.stock_restored = true;
        }
        writes.push(WriteOp::Update {
            collection: collections::ORDERS.to_owned(),
            id: id.as_str().to_owned(),
            data: order.to_value()?,
        });
        self.gateway.commit(writes).await?;
        info!(number = %order.number, %from, %to, "order status changed");

        self.recompute_stats().await;
        Ok(order)
    }

    /// Cancel an order, restoring its stock.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_status`].
    pub async fn cancel(
        &self,
        id: &OrderId,
        actor: &str,
        note: Option<String>,
    ) -> Result<Order, OrderError> {
        self.set_status(id, OrderStatus::Cancelled, actor, note).await
    }

    /// Delete an order outright, restoring stock unless a cancel
    /// already did.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for absent IDs.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &OrderId) -> Result<(), OrderError> {
        let order = self.get(id).await?;

        let mut writes = Vec::new();
        if !order.stock_restored && !order.status.is_terminal() {
            writes = self.stock_restore_writes(&order).await?;
        }
        writes.push(WriteOp::Delete {
            collection: collections::ORDERS.to_owned(),
            id: id.as_str().to_owned(),
        });
        self.gateway.commit(writes).await?;

        if !order.receipt_path.is_empty()
            && let Err(err) = self.blobs.delete(&order.receipt_path).await
        {
            warn!(path = %order.receipt_path, error = %err, "failed to delete order receipt");
        }

        self.recompute_stats().await;
        Ok(())
    }

    /// Stock restore writes for every line still resolvable. Products
    /// deleted since the order simply drop out.
    async fn stock_restore_writes(&self, order: &Order) -> Result<Vec<WriteOp>, OrderError> {
        let mut writes = Vec::new();
        for item in &order.items {
            let Some(doc) = self
                .gateway
                .get_doc_fresh(collections::PRODUCTS, item.product_id.as_str())
                .await?
            else {
                continue;
            };
            let product = Product::from_document(&doc)?;
            let new_stock = product.stock + item.quantity;
            writes.push(WriteOp::Update {
                collection: collections::PRODUCTS.to_owned(),
                id: item.product_id.as_str().to_owned(),
                data: json!({ "stock": new_stock, "active": true }),
            });
        }
        Ok(writes)
    }

    /// Current aggregate counters.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn stats(&self) -> Result<OrderStats, OrderError> {
        let doc = self.gateway.get_doc(collections::STATS, STATS_DOC).await?;
        match doc {
            Some(doc) => Ok(serde_json::from_value(doc.data).map_err(StoreError::from)?),
            None => Ok(OrderStats::default()),
        }
    }

    /// Re-read the collection and rewrite `stats/orders`. Failures are
    /// logged and swallowed.
    pub async fn recompute_stats(&self) {
        if let Err(err) = self.try_recompute_stats().await {
            warn!(error = %err, "failed to recompute order stats");
        }
    }

    async fn try_recompute_stats(&self) -> Result<(), OrderError> {
        let docs = self.gateway.list(collections::ORDERS, &Query::all()).await?;
        let mut stats = OrderStats {
            total: docs.len() as u64,
            updated_at: Some(Utc::now()),
            ..OrderStats::default()
        };
        let mut revenue = Money::ZERO;
        let mut delivered = 0u64;
        for doc in &docs {
            let order = Order::from_document(doc)?;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Confirmed => stats.confirmed += 1,
                OrderStatus::Processing => stats.processing += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => {
                    stats.delivered += 1;
                    delivered += 1;
                    revenue = revenue + order.total;
                }
                OrderStatus::Cancelled => stats.cancelled += 1,
                OrderStatus::Refunded => stats.refunded += 1,
            }
        }
        stats.revenue = revenue;
        if delivered > 0 {
            stats.average_order_value = Money::new(
                revenue.amount() / rust_decimal::Decimal::from(delivered),
            );
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

    async fn load_settings(&self) -> Result<StoreSettings, OrderError> {
        let doc = self
            .gateway
            .get_doc(collections::SETTINGS, crate::services::settings::GENERAL_DOC)
            .await?;
        match doc {
            Some(doc) => Ok(StoreSettings::from_document(&doc)?),
            None => Ok(StoreSettings::default()),
        }
    }
}

fn validate_request(request: &CheckoutRequest) -> Result<(), OrderError> {
    if request.customer_name.trim().len() < 2 {
        return Err(OrderError::Validation("customer name too short".to_owned()));
    }
    if request.address.trim().is_empty() {
        return Err(OrderError::Validation("address is required".to_owned()));
    }
    if request.address.len() > MAX_ADDRESS_LEN {
        return Err(OrderError::Validation(format!(
            "address cannot exceed {MAX_ADDRESS_LEN} characters"
        )));
    }
    if request
        .notes
        .as_deref()
        .is_some_and(|n| n.len() > MAX_NOTES_LEN)
    {
        return Err(OrderError::Validation(format!(
            "notes cannot exceed {MAX_NOTES_LEN} characters"
        )));
    }
    if request.items.is_empty() {
        return Err(OrderError::Validation(
            "order must contain at least one item".to_owned(),
        ));
    }
    if request.items.iter().any(|item| item.quantity == 0) {
        return Err(OrderError::Validation(
            "item quantities must be positive".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::config::CacheTtls;
    use crate::store::{DocumentStore, MemoryStore};

    fn receipt() -> ImageUpload {
        ImageUpload {
            filename: "receipt.jpg".to_owned(),
            content_type: "image/jpeg".to_owned(),
            bytes: vec![0xff, 0xd8],
        }
    }

    fn request(items: Vec<CheckoutItem>) -> CheckoutRequest {
        CheckoutRequest {
            user_id: None,
            customer_name: "Amina Hassan".to_owned(),
            phone: "0912345678".to_owned(),
            address: "Khartoum, Alamarat St 15".to_owned(),
            email: None,
            items,
            notes: None,
            receipt: receipt(),
        }
    }

    async fn seed_product(store: &MemoryStore, id: &str, price: u32, stock: u32) {
        store
            .set(
                collections::PRODUCTS,
                id,
                serde_json::json!({
                    "name": format!("product {id}"),
                    "description": "",
                    "price": price.to_string(),
                    "category": "perfume",
                    "stock": stock,
                    "active": stock > 0,
                    "sku": format!("MB-{id}"),
                    "image_url": "",
                    "image_path": "",
                    "created_at": "2026-01-01T00:00:00Z",
                    "updated_at": "2026-01-01T00:00:00Z",
                }),
            )
            .await
            .expect("seed product");
    }

    fn service_over(store: Arc<MemoryStore>) -> OrderService {
        let gateway = Gateway::new(store, CacheTtls::default());
        OrderService::new(gateway, Arc::new(MemoryBlobStore::new()))
    }

    #[tokio::test]
    async fn checkout_commits_order_and_stock_together() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 100, 5).await;
        let service = service_over(store.clone());

        let order = service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 2,
            }]))
            .await
            .expect("checkout");

        // 2 x 100 = 200 hits the free-shipping threshold exactly.
        assert_eq!(order.subtotal, Money::from(200u32));
        assert_eq!(order.shipping, Money::ZERO);
        assert_eq!(order.total, Money::from(200u32));
        assert_eq!(order.status, OrderStatus::Pending);

        let product = store
            .get(collections::PRODUCTS, "p1")
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(product.data["stock"], serde_json::json!(3));
        assert_eq!(product.data["active"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn below_threshold_pays_shipping() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 50, 5).await;
        let service = service_over(store);

        let order = service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 1,
            }]))
            .await
            .expect("checkout");
        assert_eq!(order.shipping, Money::from(15u32));
        assert_eq!(order.total, Money::from(65u32));
    }

    #[tokio::test]
    async fn oversell_floors_stock_and_deactivates() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 10, 2).await;
        let service = service_over(store.clone());

        service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 5,
            }]))
            .await
            .expect("checkout");

        let product = store
            .get(collections::PRODUCTS, "p1")
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(product.data["stock"], serde_json::json!(0));
        assert_eq!(product.data["active"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn failed_receipt_upload_leaves_no_trace() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 100, 5).await;
        let blobs = Arc::new(MemoryBlobStore::new());
        let gateway = Gateway::new(store.clone(), CacheTtls::default());
        let service = OrderService::new(gateway, blobs.clone());

        blobs.fail_next_upload();
        let writes_before = store.write_count();
        assert!(matches!(
            service
                .checkout(request(vec![CheckoutItem {
                    product_id: ProductId::new("p1"),
                    quantity: 1,
                }]))
                .await,
            Err(OrderError::Receipt(_))
        ));
        assert_eq!(store.write_count(), writes_before, "no order, no decrement");
    }

    #[tokio::test]
    async fn validation_fires_before_side_effects() {
        let store = Arc::new(MemoryStore::new());
        let service = service_over(store.clone());

        let mut bad_phone = request(vec![CheckoutItem {
            product_id: ProductId::new("p1"),
            quantity: 1,
        }]);
        bad_phone.phone = "12345".to_owned();
        assert!(matches!(
            service.checkout(bad_phone).await,
            Err(OrderError::Phone(_))
        ));

        assert!(matches!(
            service.checkout(request(vec![])).await,
            Err(OrderError::Validation(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_checkouts_draw_distinct_numbers() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 10, 10_000).await;
        store
            .set(
                collections::SETTINGS,
                COUNTER_DOC,
                serde_json::json!({ COUNTER_FIELD: 1000 }),
            )
            .await
            .expect("seed counter");
        let service = service_over(store);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .checkout(request(vec![CheckoutItem {
                        product_id: ProductId::new("p1"),
                        quantity: 1,
                    }]))
                    .await
                    .expect("checkout")
                    .number
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.expect("join"));
        }
        numbers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        numbers.dedup();
        assert_eq!(numbers.len(), 8, "every order got its own number");
        assert_eq!(numbers.first().map(OrderNumber::as_str), Some("MB-001001"));
        assert_eq!(numbers.last().map(OrderNumber::as_str), Some("MB-001008"));
    }

    #[tokio::test]
    async fn delivered_completes_payment() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 100, 5).await;
        let service = service_over(store);

        let order = service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 1,
            }]))
            .await
            .expect("checkout");

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            service
                .set_status(&order.id, status, "admin", None)
                .await
                .expect("transition");
        }

        let delivered = service.get(&order.id).await.expect("get");
        assert_eq!(delivered.payment_status, PaymentStatus::Completed);
        assert_eq!(delivered.history.len(), 5, "pending plus four transitions");

        // Delivered is final for cancellation.
        assert!(matches!(
            service.cancel(&order.id, "admin", None).await,
            Err(OrderError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn cancel_restores_stock_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 100, 5).await;
        let service = service_over(store.clone());

        let order = service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 2,
            }]))
            .await
            .expect("checkout");

        let cancelled = service
            .cancel(&order.id, "admin", Some("customer request".to_owned()))
            .await
            .expect("cancel");
        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);

        let product = store
            .get(collections::PRODUCTS, "p1")
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(product.data["stock"], serde_json::json!(5));

        // A second cancel must not run, let alone restore again.
        assert!(matches!(
            service.cancel(&order.id, "admin", None).await,
            Err(OrderError::InvalidTransition { .. })
        ));

        // Deleting the cancelled order must not restore either.
        service.delete(&order.id).await.expect("delete");
        let product = store
            .get(collections::PRODUCTS, "p1")
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(product.data["stock"], serde_json::json!(5));
    }

    #[tokio::test]
    async fn delete_of_open_order_restores_stock() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 100, 5).await;
        let service = service_over(store.clone());

        let order = service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 3,
            }]))
            .await
            .expect("checkout");
        service.delete(&order.id).await.expect("delete");

        let product = store
            .get(collections::PRODUCTS, "p1")
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(product.data["stock"], serde_json::json!(5));
        assert!(matches!(
            service.get(&order.id).await,
            Err(OrderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stats_track_revenue_over_delivered_orders() {
        let store = Arc::new(MemoryStore::new());
        seed_product(&store, "p1", 250, 100).await;
        let service = service_over(store);

        let a = service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 1,
            }]))
            .await
            .expect("a");
        service
            .checkout(request(vec![CheckoutItem {
                product_id: ProductId::new("p1"),
                quantity: 1,
            }]))
            .await
            .expect("b");

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            service.set_status(&a.id, status, "admin", None).await.expect("move");
        }

        let stats = service.stats().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.revenue, Money::from(250u32));
        assert_eq!(stats.average_order_value, Money::from(250u32));
    }
}
