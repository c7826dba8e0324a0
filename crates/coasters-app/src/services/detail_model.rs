// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detail screen model for a single category.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::warn;

use coasters_core::human_errors::humanize_error;

use crate::services::repository::RepositoryAdapter;
use crate::state::DetailState;

#[derive(Clone)]
pub struct DetailModel {
    repo: RepositoryAdapter,
    state: Arc<watch::Sender<DetailState>>,
    latest: Arc<AtomicU64>,
}

impl DetailModel {
    pub fn new(repo: RepositoryAdapter) -> Self {
        Self {
            repo,
            state: Arc::new(watch::Sender::new(DetailState::default())),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    /// Load `slug`, from the cache when possible. A later `load` wins over
    /// an earlier one still in flight.
    pub async fn load(&self, slug: &str) {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = self.repo.require_detail(slug).await;

        self.state.send_if_modified(|s| {
            if self.latest.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.is_loading = false;
            match result {
                Ok(category) => {
                    s.detail = Some(category);
                    s.error = None;
                }
                Err(e) => {
                    warn!(slug, error = %e, "detail unavailable");
                    s.detail = None;
                    s.error = Some(humanize_error(&e).to_string());
                }
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use coasters_bridge::CatalogService;
    use coasters_client::FixtureTransport;
    use coasters_core::config::{BridgeMode, CatalogConfig};
    use coasters_core::types::{Catalog, Category};
    use tokio::runtime::Handle;

    fn model() -> DetailModel {
        let catalog = Catalog::new(vec![Category {
            slug: "cobra".into(),
            name: "Cobra".into(),
            source_url: "/wiki/cobra".into(),
            construction: "Steel".into(),
            prebuilt_designs: vec!["Boomerang".into()],
            image_url: String::new(),
        }]);
        let config = CatalogConfig {
            base_url: Some("http://127.0.0.1:3000".into()),
            fallback_hosts: vec![],
            ..CatalogConfig::default()
        };
        let service =
            CatalogService::with_transport(&config, Arc::new(FixtureTransport::new(catalog)));
        DetailModel::new(RepositoryAdapter::new(service, BridgeMode::Json, Handle::current()))
    }

    #[tokio::test]
    async fn load_shows_the_category() {
        let model = model();
        model.load("cobra").await;

        let state = model.state();
        assert!(!state.is_loading);
        let detail = state.detail.expect("detail");
        assert_eq!(detail.prebuilt_designs, ["Boomerang"]);
        assert_eq!(detail.source_url, "http://127.0.0.1:3000/wiki/cobra");
    }

    #[tokio::test]
    async fn missing_slug_shows_a_not_found_message() {
        let model = model();
        model.load("cobra").await;
        model.load("millennium-force").await;

        let state = model.state();
        assert!(state.detail.is_none());
        let message = state.error.expect("error");
        assert!(message.contains("isn't in the catalog"), "{message}");
    }
}
