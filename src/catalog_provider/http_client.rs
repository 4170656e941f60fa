//! HTTP client for an external catalog service.
//!
//! Expects `GET {base_url}/v1/artists/lookup?name=<name>` to answer with a
//! JSON [`CatalogRecord`], or 404 when the artist is unknown.

use super::{CatalogProvider, CatalogRecord, ProviderError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

pub struct HttpCatalogProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogProvider {
    /// Create a new catalog client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the catalog service (e.g., "http://localhost:8080")
    /// * `timeout` - Request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn lookup_artist(&self, name: &str) -> Result<CatalogRecord, ProviderError> {
        let url = format!(
            "{}/v1/artists/lookup?name={}",
            self.base_url,
            urlencoding::encode(name)
        );
        debug!("Looking up artist '{}' at {}", name, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound(name.to_string())),
            status if !status.is_success() => Err(ProviderError::Unavailable(format!(
                "lookup of '{}' failed with status {}",
                name, status
            ))),
            _ => response.json::<CatalogRecord>().await.map_err(|e| {
                ProviderError::Unavailable(format!("malformed catalog response: {}", e))
            }),
        }
    }
}
