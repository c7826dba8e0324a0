// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pluggable HTTP transport.
//
// The catalog protocol only needs `GET url -> (status, body)`. Everything else
// (host fallback, decoding, normalization) lives in `CatalogClient`, so a
// transport is the only thing that differs between bridging setups.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, instrument};
use url::Url;

use coasters_core::error::{CoastersError, Result};

/// Status and body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues a GET request and returns the raw response.
///
/// Connection-level failures are `CoastersError::Transport`. Non-200 statuses
/// are not errors at this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport used against a real catalog server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport whose requests are bounded by `timeout`.
    ///
    /// Idle connections are not pooled: blocking bridge calls drive requests
    /// on short-lived runtimes, and a pooled connection cannot outlive the
    /// runtime that opened it.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| CoastersError::Transport(format!("client setup: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(describe)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(describe)?.to_vec();
        debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}

fn describe(err: reqwest::Error) -> CoastersError {
    if err.is_timeout() {
        CoastersError::Transport(format!("timed out: {err}"))
    } else if err.is_connect() {
        CoastersError::Transport(format!("connection failed: {err}"))
    } else {
        CoastersError::Transport(err.to_string())
    }
}
