//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FixtureProvider, TestClient, TestServer, RISING_ARTIST};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_momentum() {
//!     let server = TestServer::spawn(FixtureProvider::serving()).await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.get_momentum(RISING_ARTIST, None).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

#![allow(dead_code)]

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;

#[allow(unused_imports)]
pub use fixtures::{
    fixture_record, open_gate, test_cache, test_cache_with_store, test_pipeline, wait_until,
    FixtureProvider, ProviderBehavior,
};
