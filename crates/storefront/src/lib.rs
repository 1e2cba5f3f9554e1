//! Mirra Beauty storefront library.
//!
//! The public-facing JSON API as a library, so the routes and services
//! can be exercised from the integration-test crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
