// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Catalog service surface for foreign hosts.
//
// Two ways out of Rust: handles pinned in a caller-supplied arena, or the
// catalog encoded as a JSON string. Both sit on the same `CatalogClient`.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use coasters_client::{CatalogClient, Transport, block_on};
use coasters_core::config::CatalogConfig;
use coasters_core::error::{CoastersError, Result};
use coasters_core::types::{Catalog, EMPTY_CATALOG_JSON};

use crate::arena::Arena;
use crate::handle::CatalogHandle;

#[derive(Debug, Clone)]
pub struct CatalogService {
    client: CatalogClient,
}

impl CatalogService {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    /// Service talking HTTP to the hosts named by `config`.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Ok(Self::new(CatalogClient::from_config(config)?))
    }

    pub fn with_transport(config: &CatalogConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(CatalogClient::with_transport(config, transport))
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    // -- Handle surface ------------------------------------------------------

    pub async fn fetch_all_handle_async<'a>(&self, arena: &'a Arena) -> Result<CatalogHandle<'a>> {
        ensure_open(arena)?;
        let catalog = self.client.fetch_all().await?;
        pin(arena, catalog)
    }

    pub async fn search_handle_async<'a>(
        &self,
        name: &str,
        arena: &'a Arena,
    ) -> Result<CatalogHandle<'a>> {
        ensure_open(arena)?;
        let catalog = self.client.search(name).await?;
        pin(arena, catalog)
    }

    /// Blocking [`fetch_all_handle_async`](Self::fetch_all_handle_async).
    pub fn fetch_all_handle<'a>(&self, arena: &'a Arena) -> Result<CatalogHandle<'a>> {
        ensure_open(arena)?;
        let catalog = self.client.fetch_all_blocking()?;
        pin(arena, catalog)
    }

    /// Blocking [`search_handle_async`](Self::search_handle_async).
    pub fn search_handle<'a>(&self, name: &str, arena: &'a Arena) -> Result<CatalogHandle<'a>> {
        ensure_open(arena)?;
        let catalog = self.client.search_blocking(name)?;
        pin(arena, catalog)
    }

    // -- JSON surface --------------------------------------------------------

    pub async fn fetch_all_json(&self) -> Result<String> {
        self.client.fetch_all().await?.encode()
    }

    pub async fn search_json(&self, name: &str) -> Result<String> {
        self.client.search(name).await?.encode()
    }

    /// Never fails; `{"categories":[]}` when the catalog is unavailable.
    pub fn fetch_all_json_or_empty(&self) -> String {
        or_empty_json(block_on(self.fetch_all_json()))
    }

    /// Never fails; `{"categories":[]}` when the catalog is unavailable.
    pub fn search_json_or_empty(&self, name: &str) -> String {
        or_empty_json(block_on(self.search_json(name)))
    }
}

/// One service per process, for hosts that cannot own one themselves.
///
/// The host may call [`configure`](Self::configure) once before the first
/// fetch. Otherwise the first [`get`](Self::get) builds the service from the
/// default configuration and the environment.
#[derive(Debug)]
pub struct SharedService {
    cell: OnceLock<CatalogService>,
}

impl Default for SharedService {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedService {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Build the service against `base_url`. A blank `base_url` leaves host
    /// resolution to the environment and the fallback hosts.
    pub fn configure(&self, base_url: &str) -> Result<&CatalogService> {
        let config = configured(base_url);
        info!(base_url = ?config.base_url, "configuring shared catalog service");
        self.install(CatalogService::from_config(&config)?)
    }

    /// Install a ready-made service. Fails once a service is in place.
    pub fn install(&self, service: CatalogService) -> Result<&CatalogService> {
        let already = || CoastersError::Bridge("catalog service already configured".into());
        self.cell.set(service).map_err(|_| already())?;
        self.cell.get().ok_or_else(already)
    }

    /// The installed service, building the default one on first use.
    pub fn get(&self) -> Result<&CatalogService> {
        if let Some(service) = self.cell.get() {
            return Ok(service);
        }
        let service = CatalogService::from_config(&CatalogConfig::default())?;
        Ok(self.cell.get_or_init(|| service))
    }

    pub fn is_configured(&self) -> bool {
        self.cell.get().is_some()
    }
}

fn configured(base_url: &str) -> CatalogConfig {
    let base_url = base_url.trim();
    CatalogConfig {
        base_url: (!base_url.is_empty()).then(|| base_url.to_string()),
        ..CatalogConfig::default()
    }
}

fn ensure_open(arena: &Arena) -> Result<()> {
    if arena.is_open() {
        Ok(())
    } else {
        Err(CoastersError::ArenaClosed)
    }
}

fn pin(arena: &Arena, catalog: Catalog) -> Result<CatalogHandle<'_>> {
    let count = catalog.len();
    let handle = arena.pin_catalog(catalog)?;
    debug!(arena = %arena.id(), count, "catalog pinned");
    Ok(handle)
}

fn or_empty_json(result: Result<Result<String>>) -> String {
    match result.and_then(|inner| inner) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "catalog unavailable, answering with empty catalog");
            EMPTY_CATALOG_JSON.to_string()
        }
    }
}
