//! Mirra Core - Shared types library.
//!
//! This crate provides common types used across all Mirra Beauty components:
//! - `storefront` - Public-facing e-commerce API
//! - `admin` - Internal back-office API
//! - `cli` - Command-line tools for seeding and management
//!
//! # Architecture
//!
//! The core crate contains only types and constants - no I/O, no HTTP
//! clients, no document-store access. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, phones,
//!   and status enums
//! - [`limits`] - Validation bounds shared by catalog and order validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod limits;
pub mod types;

pub use types::*;
