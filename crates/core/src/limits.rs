//! Validation bounds shared by the catalog and order services.
//!
//! These are business limits, not technical ones: a price of a million is
//! assumed to be a data-entry mistake, not a real product.

use rust_decimal::Decimal;

/// Minimum length of a product name, in characters.
pub const MIN_PRODUCT_NAME_LEN: usize = 2;

/// Minimum product price.
pub const MIN_PRODUCT_PRICE: Decimal = Decimal::ZERO;

/// Maximum product price (1,000,000 in store currency).
pub const MAX_PRODUCT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Minimum stock level.
pub const MIN_PRODUCT_STOCK: u32 = 0;

/// Maximum stock level.
pub const MAX_PRODUCT_STOCK: u32 = 10_000;

/// Maximum customer address length accepted at checkout.
pub const MAX_ADDRESS_LEN: usize = 200;

/// Maximum order-notes length accepted at checkout.
pub const MAX_NOTES_LEN: usize = 500;

/// Maximum receipt/product image size in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Content types accepted for uploaded images.
pub const ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "image/gif"];
