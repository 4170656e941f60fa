//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per momentum-server endpoint.
//! When API routes or query parameters change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn momentum_url(&self, artist: &str) -> String {
        format!(
            "{}/v1/momentum/{}",
            self.base_url,
            urlencoding::encode(artist)
        )
    }

    // ========================================================================
    // Momentum Endpoints
    // ========================================================================

    /// GET /v1/momentum/{artist}, with the server's default window when
    /// `window_days` is `None`
    pub async fn get_momentum(&self, artist: &str, window_days: Option<usize>) -> Response {
        let mut request = self.client.get(self.momentum_url(artist));
        if let Some(window_days) = window_days {
            request = request.query(&[("window_days", window_days)]);
        }
        request.send().await.expect("Get momentum request failed")
    }

    /// GET /v1/momentum/{artist}?window_days=... with a raw parameter value
    pub async fn get_momentum_raw_window(&self, artist: &str, window_days: &str) -> Response {
        self.client
            .get(self.momentum_url(artist))
            .query(&[("window_days", window_days)])
            .send()
            .await
            .expect("Get momentum request failed")
    }

    /// DELETE /v1/momentum/{artist}
    pub async fn delete_momentum(&self, artist: &str) -> Response {
        self.client
            .delete(self.momentum_url(artist))
            .send()
            .await
            .expect("Delete momentum request failed")
    }

    // ========================================================================
    // Ranking Endpoints
    // ========================================================================

    /// GET /v1/ranking
    pub async fn get_ranking(&self, limit: Option<usize>, window_days: Option<usize>) -> Response {
        let mut request = self.client.get(format!("{}/v1/ranking", self.base_url));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        if let Some(window_days) = window_days {
            request = request.query(&[("window_days", window_days)]);
        }
        request.send().await.expect("Get ranking request failed")
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// GET /v1/health
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }
}
