// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Repository over the catalog service, with a slug-keyed cache for the detail
// screen.
//
// Every fetch runs on the runtime handed in at construction. The caller only
// awaits the join handle; dropping that await aborts the task, and the cache
// is written on the caller's side after the join, so a cancelled operation
// never touches it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use coasters_bridge::{Arena, CatalogHandle, CatalogService};
use coasters_core::config::{BridgeMode, CatalogConfig};
use coasters_core::error::{CoastersError, Result};
use coasters_core::types::{Catalog, Category};

/// Aborts the task when dropped, so abandoning the await cancels the work.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Inner {
    service: CatalogService,
    mode: BridgeMode,
    cache: RwLock<HashMap<String, Category>>,
}

/// Catalog access for the list and detail models.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct RepositoryAdapter {
    inner: Arc<Inner>,
    runtime: Handle,
}

impl std::fmt::Debug for RepositoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryAdapter")
            .field("mode", &self.inner.mode)
            .field("cached", &self.cache_len())
            .finish_non_exhaustive()
    }
}

impl RepositoryAdapter {
    pub fn new(service: CatalogService, mode: BridgeMode, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                mode,
                cache: RwLock::new(HashMap::new()),
            }),
            runtime,
        }
    }

    /// HTTP-backed repository configured by `config`.
    pub fn from_config(config: &CatalogConfig, runtime: Handle) -> Result<Self> {
        let service = CatalogService::from_config(config)?;
        Ok(Self::new(service, config.bridge_mode, runtime))
    }

    pub fn mode(&self) -> BridgeMode {
        self.inner.mode
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Every category, in server order. Refreshes the cache.
    #[instrument(skip(self), fields(mode = ?self.inner.mode))]
    pub async fn fetch_all(&self) -> Result<Vec<Category>> {
        let inner = Arc::clone(&self.inner);
        let categories = self.run(async move { inner.fetch(None).await }).await?;
        self.upsert(&categories);
        Ok(categories)
    }

    /// Categories whose name matches `query`. A blank query is [`fetch_all`](Self::fetch_all).
    #[instrument(skip(self), fields(mode = ?self.inner.mode))]
    pub async fn search(&self, query: &str) -> Result<Vec<Category>> {
        let query = query.trim();
        if query.is_empty() {
            return self.fetch_all().await;
        }
        let inner = Arc::clone(&self.inner);
        let query = query.to_string();
        let categories = self
            .run(async move { inner.fetch(Some(&query)).await })
            .await?;
        self.upsert(&categories);
        Ok(categories)
    }

    /// The category for `slug`: from the cache, else after a full refresh.
    /// `None` if the refreshed catalog does not have it either.
    pub async fn load_detail(&self, slug: &str) -> Result<Option<Category>> {
        if let Some(hit) = self.cached(slug) {
            debug!(slug, "detail served from cache");
            return Ok(Some(hit));
        }
        self.fetch_all().await?;
        Ok(self.cached(slug))
    }

    /// [`load_detail`](Self::load_detail), treating a missing slug as `NotFound`.
    pub async fn require_detail(&self, slug: &str) -> Result<Category> {
        self.load_detail(slug)
            .await?
            .ok_or_else(|| CoastersError::NotFound(slug.to_string()))
    }

    pub fn cached(&self, slug: &str) -> Option<Category> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(slug)
            .cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn upsert(&self, categories: &[Category]) {
        let mut cache = self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for category in categories {
            cache.insert(category.slug.clone(), category.clone());
        }
    }

    async fn run<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let mut task = AbortOnDrop(self.runtime.spawn(work));
        match (&mut task.0).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                Err(CoastersError::TaskFailed("catalog task cancelled".into()))
            }
            Err(e) => Err(CoastersError::TaskFailed(format!("catalog task panicked: {e}"))),
        }
    }
}

impl Inner {
    async fn fetch(&self, query: Option<&str>) -> Result<Vec<Category>> {
        let categories = match self.mode {
            BridgeMode::Handles => self.fetch_via_handles(query).await?,
            BridgeMode::Json => self.fetch_via_json(query).await?,
        };
        info!(count = categories.len(), "catalog loaded");
        Ok(categories)
    }

    /// One confined arena per call, closed before returning on every path.
    async fn fetch_via_handles(&self, query: Option<&str>) -> Result<Vec<Category>> {
        let arena = Arena::open_confined();
        let projected = match query {
            Some(q) => self.service.search_handle_async(q, &arena).await,
            None => self.service.fetch_all_handle_async(&arena).await,
        }
        .and_then(|handle| materialize(&handle));
        arena.close();
        projected
    }

    async fn fetch_via_json(&self, query: Option<&str>) -> Result<Vec<Category>> {
        let json = match query {
            Some(q) => self.service.search_json(q).await?,
            None => self.service.fetch_all_json().await?,
        };
        Ok(Catalog::decode(json.as_bytes())?.into_categories())
    }
}

fn materialize(handle: &CatalogHandle<'_>) -> Result<Vec<Category>> {
    (0..handle.count()?)
        .map(|i| handle.category_at(i)?.to_category())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use coasters_client::{CatalogClient, FixtureTransport, HostCandidates, HttpTransport};

    fn category(slug: &str, name: &str) -> Category {
        Category {
            slug: slug.into(),
            name: name.into(),
            source_url: format!("/wiki/{slug}"),
            construction: "Steel".into(),
            prebuilt_designs: vec![format!("{name} Classic")],
            image_url: format!("/images/{slug}.png"),
        }
    }

    fn fixture() -> Catalog {
        Catalog::new(vec![
            category("abyss", "Abyss"),
            category("batman", "Batman The Ride"),
            category("cobra", "Cobra"),
        ])
    }

    fn config() -> CatalogConfig {
        CatalogConfig {
            base_url: Some("http://127.0.0.1:3000".into()),
            fallback_hosts: vec![],
            ..CatalogConfig::default()
        }
    }

    fn repository_with(transport: Arc<FixtureTransport>, mode: BridgeMode) -> RepositoryAdapter {
        let service = CatalogService::with_transport(&config(), transport);
        RepositoryAdapter::new(service, mode, Handle::current())
    }

    fn repository(mode: BridgeMode) -> RepositoryAdapter {
        repository_with(Arc::new(FixtureTransport::new(fixture())), mode)
    }

    #[tokio::test]
    async fn both_modes_return_the_same_catalog() {
        let via_handles = repository(BridgeMode::Handles).fetch_all().await.expect("handles");
        let via_json = repository(BridgeMode::Json).fetch_all().await.expect("json");
        assert_eq!(via_handles, via_json);
        assert_eq!(via_handles.len(), 3);
        assert_eq!(via_handles[0].slug, "abyss");
        assert_eq!(via_handles[0].image_url, "http://127.0.0.1:3000/images/abyss.png");
    }

    #[tokio::test]
    async fn fetch_all_fills_the_cache_in_server_order() {
        let repo = repository(BridgeMode::Handles);
        let items = repo.fetch_all().await.expect("fetch");
        let slugs: Vec<_> = items.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, ["abyss", "batman", "cobra"]);
        assert_eq!(repo.cache_len(), 3);
        assert_eq!(repo.cached("cobra").expect("cached").name, "Cobra");
    }

    #[tokio::test]
    async fn blank_search_is_a_full_fetch() {
        let repo = repository(BridgeMode::Json);
        let all = repo.fetch_all().await.expect("fetch");
        assert_eq!(repo.search("").await.expect("empty"), all);
        assert_eq!(repo.search("   ").await.expect("blank"), all);
    }

    #[tokio::test]
    async fn search_upserts_matches_only() {
        let repo = repository(BridgeMode::Handles);
        let hits = repo.search(" ab ").await.expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "abyss");
        assert_eq!(repo.cache_len(), 1);
    }

    #[tokio::test]
    async fn load_detail_uses_cache_then_refreshes() {
        let transport = Arc::new(FixtureTransport::new(fixture()));
        let repo = repository_with(transport.clone(), BridgeMode::Handles);

        let cobra = repo.load_detail("cobra").await.expect("load").expect("present");
        assert_eq!(cobra.name, "Cobra");
        assert_eq!(transport.request_count(), 1);

        repo.load_detail("cobra").await.expect("load again");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn load_detail_absent_after_refresh_is_none() {
        let transport = Arc::new(FixtureTransport::new(fixture()));
        let repo = repository_with(transport.clone(), BridgeMode::Json);

        assert!(repo.load_detail("kingda-ka").await.expect("load").is_none());
        assert_eq!(transport.request_count(), 1);

        let err = repo.require_detail("kingda-ka").await.expect_err("missing");
        assert!(matches!(err, CoastersError::NotFound(ref slug) if slug == "kingda-ka"));
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_error_and_leaves_cache_empty() {
        let timeout = Duration::from_secs(1);
        let hosts = HostCandidates::resolve(Some("http://127.0.0.1:9"), None, &[]);
        let transport = HttpTransport::new(timeout).expect("transport");
        let service = CatalogService::new(CatalogClient::new(hosts, Arc::new(transport), timeout));
        let repo = RepositoryAdapter::new(service, BridgeMode::Handles, Handle::current());
        let err = repo.fetch_all().await.expect_err("down");
        assert!(err.is_service_unavailable());
        assert_eq!(repo.cache_len(), 0);
    }

    #[tokio::test]
    async fn cancelled_fetch_never_writes_the_cache() {
        let transport =
            Arc::new(FixtureTransport::new(fixture()).with_latency(Duration::from_millis(200)));
        let repo = repository_with(transport, BridgeMode::Handles);

        let outcome = tokio::time::timeout(Duration::from_millis(20), repo.fetch_all()).await;
        assert!(outcome.is_err(), "fetch should still be pending");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(repo.cache_len(), 0);
    }
}
