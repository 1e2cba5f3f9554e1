//! Stored document shapes.
//!
//! Every struct here mirrors one document (or embedded object) in the
//! hosted store. IDs are carried out-of-band by the store, so they are
//! `#[serde(skip)]` and attached by `from_document`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use mirra_core::{
    Category, CurrencyCode, Email, Money, OrderId, OrderNumber, OrderStatus, PaymentStatus, Phone,
    ProductId, Role, UserId,
};

use crate::store::{Document, StoreError};

fn attach<T: DeserializeOwned>(doc: &Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(doc.data.clone())?)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(value)?)
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    #[serde(skip)]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub category: Category,
    pub stock: u32,
    pub active: bool,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Decode a stored document, attaching its ID.
    ///
    /// # Errors
    ///
    /// Fails when the payload does not match the product shape.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut product: Self = attach(doc)?;
        product.id = ProductId::new(&doc.id);
        Ok(product)
    }

    /// Encode for storage (the ID stays out of the payload).
    ///
    /// # Errors
    ///
    /// Serialization failures only.
    pub fn to_value(&self) -> Result<Value, StoreError> {
        encode(self)
    }
}

/// One line of an order, with the unit price copied at purchase time.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
}

impl OrderItem {
    /// Line total at the captured unit price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// Customer details frozen into the order at checkout.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: Phone,
    pub address: String,
    #[serde(default)]
    pub email: Option<Email>,
}

/// One entry of the append-only status history.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub actor: String,
    #[serde(default)]
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    #[serde(skip)]
    pub id: OrderId,
    pub number: OrderNumber,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub customer: CustomerSnapshot,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub receipt_url: String,
    #[serde(default)]
    pub receipt_path: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub history: Vec<StatusChange>,
    /// Set once stock has been put back, so a delete after a cancel
    /// does not restore twice.
    #[serde(default)]
    pub stock_restored: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Decode a stored document, attaching its ID.
    ///
    /// # Errors
    ///
    /// Fails when the payload does not match the order shape.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut order: Self = attach(doc)?;
        order.id = OrderId::new(&doc.id);
        Ok(order)
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Serialization failures only.
    pub fn to_value(&self) -> Result<Value, StoreError> {
        encode(self)
    }
}

/// A customer or staff profile under `users/<uid>`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserProfile {
    #[serde(skip)]
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub phone: Option<Phone>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub favorites: Vec<ProductId>,
    #[serde(default)]
    pub order_count: u32,
    #[serde(default)]
    pub total_spent: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Decode a stored document, attaching its ID.
    ///
    /// # Errors
    ///
    /// Fails when the payload does not match the profile shape.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut profile: Self = attach(doc)?;
        profile.id = UserId::new(&doc.id);
        Ok(profile)
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Serialization failures only.
    pub fn to_value(&self) -> Result<Value, StoreError> {
        encode(self)
    }
}

/// Storefront theme palette.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ThemePalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self {
            primary: "#1a1a1a".to_owned(),
            secondary: "#555555".to_owned(),
            accent: "#d4af37".to_owned(),
        }
    }
}

/// The singleton `settings/general` document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoreSettings {
    pub store_name: String,
    pub store_email: String,
    pub store_phone: String,
    pub store_address: String,
    #[serde(default)]
    pub store_description: String,
    pub shipping_cost: Money,
    pub free_shipping_threshold: Money,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub theme: ThemePalette,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "Mirra Beauty".to_owned(),
            store_email: "info@mirrabeauty.store".to_owned(),
            store_phone: "+249123456789".to_owned(),
            store_address: "Khartoum, Sudan".to_owned(),
            store_description: "Perfumes and original cosmetics".to_owned(),
            shipping_cost: Money::from(15u32),
            free_shipping_threshold: Money::from(200u32),
            currency: CurrencyCode::default(),
            theme: ThemePalette::default(),
        }
    }
}

impl StoreSettings {
    /// Decode the stored settings document.
    ///
    /// # Errors
    ///
    /// Fails when the payload does not match the settings shape.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        attach(doc)
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Serialization failures only.
    pub fn to_value(&self) -> Result<Value, StoreError> {
        encode(self)
    }
}

/// Aggregate product counters under `stats/products`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProductStats {
    pub total: u64,
    pub active: u64,
    pub out_of_stock: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Aggregate order counters under `stats/orders`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderStats {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
    pub cancelled: u64,
    pub refunded: u64,
    /// Revenue over delivered orders only.
    #[serde(default)]
    pub revenue: Money,
    #[serde(default)]
    pub average_order_value: Money,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An admin-facing notification document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// A new-order notification for the back office.
    #[must_use]
    pub fn new_order(order_id: OrderId, number: &OrderNumber) -> Self {
        Self {
            kind: "new_order".to_owned(),
            message: format!("New order {number}"),
            order_id: Some(order_id),
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_round_trips_with_external_id() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "oud noir".to_owned(),
            description: String::new(),
            price: Money::from(120u32),
            category: Category::Perfume,
            stock: 7,
            active: true,
            sku: "MB-X1".to_owned(),
            image_url: String::new(),
            image_path: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = product.to_value().expect("encode");
        assert!(value.get("id").is_none(), "id never stored in the payload");

        let doc = Document::new("p1", value);
        let decoded = Product::from_document(&doc).expect("decode");
        assert_eq!(decoded, product);
    }

    #[test]
    fn order_item_line_total() {
        let item = OrderItem {
            product_id: ProductId::new("p1"),
            name: "rose mist".to_owned(),
            price: Money::from(100u32),
            quantity: 2,
        };
        assert_eq!(item.line_total(), Money::from(200u32));
    }

    #[test]
    fn settings_defaults_match_store_policy() {
        let settings = StoreSettings::default();
        assert_eq!(settings.shipping_cost, Money::from(15u32));
        assert_eq!(settings.free_shipping_threshold, Money::from(200u32));
        assert_eq!(settings.currency, CurrencyCode::SDG);
    }

    #[test]
    fn profile_tolerates_sparse_documents() {
        let doc = Document::new(
            "u1",
            json!({
                "email": "amina@example.com",
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z",
            }),
        );
        let profile = UserProfile::from_document(&doc).expect("decode");
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.total_spent, Money::ZERO);
        assert!(profile.favorites.is_empty());
    }
}
