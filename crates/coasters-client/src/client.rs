// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Catalog client: fetch and search over every candidate host until one answers.
//
// There is one async core. Blocking callers (the JNI bridge, the CLI's
// synchronous paths) go through `block_on`, and the non-throwing variants
// wrap the throwing ones.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use coasters_core::config::CatalogConfig;
use coasters_core::error::{CoastersError, Result};
use coasters_core::types::Catalog;

use crate::hosts::HostCandidates;
use crate::transport::{HttpTransport, Transport};
use crate::urls::{CATALOG_PATH, SEARCH_PATH, endpoint, normalize_catalog};

/// Client for the roller-coaster catalog server.
///
/// Cheap to clone; the transport is shared.
#[derive(Clone)]
pub struct CatalogClient {
    hosts: HostCandidates,
    transport: Arc<dyn Transport>,
    /// Bound on a single attempt against one host.
    timeout: Duration,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("hosts", &self.hosts)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    pub fn new(hosts: HostCandidates, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            hosts,
            transport,
            timeout,
        }
    }

    /// Client talking HTTP to the hosts named by `config` and the environment.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Client using `config` for hosts and timeout but a caller-chosen transport.
    pub fn with_transport(config: &CatalogConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            HostCandidates::from_config(config),
            transport,
            config.request_timeout(),
        )
    }

    pub fn hosts(&self) -> &HostCandidates {
        &self.hosts
    }

    /// Fetch every category.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Catalog> {
        self.fetch_remote(CATALOG_PATH, None).await
    }

    /// Search categories by name. A blank query is a full fetch.
    #[instrument(skip(self))]
    pub async fn search(&self, name: &str) -> Result<Catalog> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return self.fetch_all().await;
        }
        self.fetch_remote(SEARCH_PATH, Some(trimmed)).await
    }

    /// Like [`fetch_all`](Self::fetch_all), but an empty catalog on failure.
    pub async fn fetch_all_or_empty(&self) -> Catalog {
        self.fetch_all().await.unwrap_or_else(|e| {
            warn!(error = %e, "catalog unavailable, returning empty catalog");
            Catalog::empty()
        })
    }

    /// Like [`search`](Self::search), but an empty catalog on failure.
    pub async fn search_or_empty(&self, name: &str) -> Catalog {
        self.search(name).await.unwrap_or_else(|e| {
            warn!(error = %e, "catalog search unavailable, returning empty catalog");
            Catalog::empty()
        })
    }

    pub fn fetch_all_blocking(&self) -> Result<Catalog> {
        block_on(self.fetch_all())?
    }

    pub fn search_blocking(&self, name: &str) -> Result<Catalog> {
        block_on(self.search(name))?
    }

    /// Try each candidate host in order; the first decodable 200 wins.
    async fn fetch_remote(&self, path: &str, query: Option<&str>) -> Result<Catalog> {
        let mut failures = Vec::with_capacity(self.hosts.len());
        let mut saw_bad_body = false;

        for host in self.hosts.iter() {
            let url = endpoint(host.url(), path, query);
            match self.attempt(&url).await {
                Ok(catalog) => {
                    info!(host = %host, count = catalog.len(), "catalog fetched");
                    return Ok(normalize_catalog(catalog, host.base()));
                }
                Err(err) => {
                    saw_bad_body |= matches!(err, CoastersError::DecodeFailure(_));
                    warn!(host = %host, error = %err, "catalog host failed, trying next");
                    failures.push(format!("{host}: {err}"));
                }
            }
        }

        let detail = failures.join("; ");
        Err(if saw_bad_body {
            CoastersError::DecodeFailure(detail)
        } else {
            CoastersError::HostUnreachable(detail)
        })
    }

    async fn attempt(&self, url: &Url) -> Result<Catalog> {
        let response = tokio::time::timeout(self.timeout, self.transport.get(url))
            .await
            .map_err(|_| {
                CoastersError::Transport(format!("timed out after {:?}", self.timeout))
            })??;

        if !response.is_ok() {
            return Err(CoastersError::Transport(format!(
                "http status {}",
                response.status
            )));
        }
        Catalog::decode(&response.body)
    }
}

/// Drive `future` to completion from synchronous code.
///
/// Outside a runtime this builds a private current-thread runtime. Inside one
/// (for example on a `spawn_blocking` thread) the future runs on a helper
/// thread with its own runtime, because an entered runtime cannot be blocked on.
pub fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    if tokio::runtime::Handle::try_current().is_err() {
        return Ok(private_runtime()?.block_on(future));
    }

    std::thread::scope(|scope| {
        let worker = scope.spawn(move || -> Result<F::Output> {
            Ok(private_runtime()?.block_on(future))
        });
        worker
            .join()
            .unwrap_or_else(|_| Err(CoastersError::TaskFailed("blocking call panicked".into())))
    })
}

fn private_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
