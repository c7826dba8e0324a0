// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search-as-you-type list model.
//
// Each request gets a generation number. Issuing a request aborts the previous
// one, and a result is only written to the state if its generation is still
// the latest when checked inside the watch channel's lock. Out-of-order
// completions are therefore dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use coasters_core::human_errors::humanize_error;

use crate::services::repository::RepositoryAdapter;
use crate::state::ListState;

#[derive(Debug, Clone)]
enum Request {
    All,
    Search(String),
}

struct Inner {
    repo: RepositoryAdapter,
    debounce: Duration,
    state: watch::Sender<ListState>,
    /// Generation of the most recently issued request.
    issued: AtomicU64,
    /// Highest generation that has finished, successfully or not.
    settled: watch::Sender<u64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Observable catalog list with debounced search.
#[derive(Clone)]
pub struct ListModel {
    inner: Arc<Inner>,
}

impl ListModel {
    pub fn new(repo: RepositoryAdapter, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                debounce,
                state: watch::Sender::new(ListState::default()),
                issued: AtomicU64::new(0),
                settled: watch::Sender::new(0),
                pending: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ListState {
        self.inner.state.borrow().clone()
    }

    /// Load the full catalog now.
    pub fn refresh(&self) {
        self.issue(Request::All, Duration::ZERO);
    }

    /// Record `query` and schedule the matching request.
    ///
    /// A blank query loads everything immediately; anything else waits out
    /// the debounce first. Either way the previous request is cancelled.
    pub fn on_query_change(&self, query: &str) {
        self.inner.state.send_modify(|s| s.query = query.to_string());
        let trimmed = query.trim();
        if trimmed.is_empty() {
            self.issue(Request::All, Duration::ZERO);
        } else {
            self.issue(Request::Search(trimmed.to_string()), self.inner.debounce);
        }
    }

    /// Resolve once the most recently issued request has settled.
    pub async fn wait_idle(&self) {
        let target = self.inner.issued.load(Ordering::SeqCst);
        let mut settled = self.inner.settled.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = settled.wait_for(|&done| done >= target).await;
    }

    fn issue(&self, request: Request, delay: Duration) {
        let generation = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let task = self
            .inner
            .repo
            .runtime()
            .spawn(async move { inner.execute(generation, request, delay).await });

        let previous = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == generation
    }

    async fn execute(&self, generation: u64, request: Request, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.is_loading = true;
            s.error = None;
            true
        });

        debug!(generation, ?request, "list request started");
        let result = match &request {
            Request::All => self.repo.fetch_all().await,
            Request::Search(query) => self.repo.search(query).await,
        };

        let applied = self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.is_loading = false;
            match &result {
                Ok(items) => {
                    s.items = items.clone();
                    s.error = None;
                    s.refreshed_at = Some(Utc::now());
                }
                Err(e) => {
                    warn!(generation, error = %e, "list request failed");
                    s.error = Some(humanize_error(e).to_string());
                }
            }
            true
        });
        if !applied {
            debug!(generation, "stale list result dropped");
        }

        self.settled.send_if_modified(|done| {
            if generation > *done {
                *done = generation;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use coasters_bridge::CatalogService;
    use coasters_client::{FixtureTransport, HttpResponse, Transport};
    use coasters_core::config::{BridgeMode, CatalogConfig};
    use coasters_core::error::{CoastersError, Result};
    use coasters_core::types::{Catalog, Category};
    use tokio::runtime::Handle;
    use url::Url;

    /// Serves the fixture until switched off, then refuses every connection.
    struct Outage {
        inner: Arc<FixtureTransport>,
        down: AtomicBool,
    }

    impl Outage {
        fn go_down(&self) {
            self.down.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Transport for Outage {
        async fn get(&self, url: &Url) -> Result<HttpResponse> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CoastersError::Transport("connection refused".into()));
            }
            self.inner.get(url).await
        }
    }

    fn category(slug: &str, name: &str) -> Category {
        Category {
            slug: slug.into(),
            name: name.into(),
            source_url: String::new(),
            construction: "Steel".into(),
            prebuilt_designs: vec![],
            image_url: String::new(),
        }
    }

    fn transport(latency: Duration) -> Arc<FixtureTransport> {
        let catalog = Catalog::new(vec![
            category("abyss", "Abyss"),
            category("batman", "Batman The Ride"),
            category("cobra", "Cobra"),
        ]);
        Arc::new(FixtureTransport::new(catalog).with_latency(latency))
    }

    fn model(transport: Arc<dyn Transport>, debounce: Duration) -> ListModel {
        let config = CatalogConfig {
            base_url: Some("http://127.0.0.1:3000".into()),
            fallback_hosts: vec![],
            ..CatalogConfig::default()
        };
        let service = CatalogService::with_transport(&config, transport);
        let repo = RepositoryAdapter::new(service, BridgeMode::Handles, Handle::current());
        ListModel::new(repo, debounce)
    }

    fn slugs(state: &ListState) -> Vec<&str> {
        state.items.iter().map(|c| c.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn refresh_loads_everything() {
        let model = model(transport(Duration::ZERO), Duration::from_millis(300));
        model.refresh();
        model.wait_idle().await;

        let state = model.state();
        assert!(!state.is_loading);
        assert_eq!(slugs(&state), ["abyss", "batman", "cobra"]);
        assert!(state.refreshed_at.is_some());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn rapid_typing_only_sends_the_last_query() {
        let transport = transport(Duration::ZERO);
        let model = model(transport.clone(), Duration::from_millis(50));

        model.on_query_change("a");
        model.on_query_change("ab");
        model.wait_idle().await;

        let state = model.state();
        assert_eq!(state.query, "ab");
        assert_eq!(slugs(&state), ["abyss"]);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn superseded_in_flight_search_never_lands() {
        let model = model(transport(Duration::from_millis(100)), Duration::ZERO);

        model.on_query_change("a");
        tokio::time::sleep(Duration::from_millis(20)).await;
        model.on_query_change("ab");
        model.wait_idle().await;

        let state = model.state();
        assert_eq!(state.query, "ab");
        assert_eq!(slugs(&state), ["abyss"]);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn blank_query_loads_everything_without_debounce() {
        let model = model(transport(Duration::ZERO), Duration::from_secs(60));
        model.on_query_change("   ");
        tokio::time::timeout(Duration::from_secs(5), model.wait_idle())
            .await
            .expect("no debounce for blank query");
        assert_eq!(model.state().items.len(), 3);
    }

    #[tokio::test]
    async fn failure_is_humanized_and_keeps_previous_items() {
        let outage = Arc::new(Outage {
            inner: transport(Duration::ZERO),
            down: AtomicBool::new(false),
        });
        let model = model(outage.clone(), Duration::ZERO);
        model.refresh();
        model.wait_idle().await;
        assert_eq!(model.state().items.len(), 3);

        outage.go_down();
        model.refresh();
        model.wait_idle().await;

        let state = model.state();
        assert!(!state.is_loading);
        let message = state.error.as_ref().expect("error shown");
        assert!(message.contains("catalog server"), "{message}");
        assert_eq!(slugs(&state), ["abyss", "batman", "cobra"]);
    }

    #[tokio::test]
    async fn subscribers_see_the_final_state() {
        let model = model(transport(Duration::ZERO), Duration::ZERO);
        let mut rx = model.subscribe();
        model.on_query_change("cob");
        model.wait_idle().await;

        rx.changed().await.expect("changed");
        assert_eq!(slugs(&rx.borrow_and_update()), ["cobra"]);
    }
}
