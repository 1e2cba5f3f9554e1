//! Mirra Backend - hosted-service gateway and domain services.
//!
//! The store's durable state lives in a hosted backend-as-a-service: a
//! document database, a blob store, and an identity provider. This crate
//! owns every interaction with that service so the two server binaries
//! (`storefront` and `admin`) never talk to it directly.
//!
//! # Layers
//!
//! - [`store`] - the `DocumentStore` trait with HTTP and in-memory
//!   implementations
//! - [`gateway`] - a read-through cache over any `DocumentStore`, with
//!   per-collection TTLs and write-through invalidation
//! - [`blob`] - receipt and product-image storage
//! - [`identity`] - password and federated sign-in against the hosted
//!   identity provider
//! - [`services`] - the business logic: catalog, orders, settings, profiles
//!
//! All trust-bearing logic (stock accounting, order numbering, role
//! resolution) runs here, on the server, never in a client.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blob;
pub mod config;
pub mod env;
pub mod gateway;
pub mod identity;
pub mod models;
pub mod services;
pub mod store;

pub use config::BackendConfig;
pub use gateway::Gateway;
