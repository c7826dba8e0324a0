// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process transport serving a local catalog, for offline use and tests.
//
// Follows the catalog server's contract:
//   GET /roller-coasters                 -> every category
//   GET /roller-coasters/search?name=q   -> case-insensitive substring match on `name`;
//                                           a blank or missing `name` yields no results
//   anything else                        -> 404

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use coasters_core::error::Result;
use coasters_core::types::Catalog;

use crate::transport::{HttpResponse, Transport};
use crate::urls::{CATALOG_PATH, SEARCH_PARAM, SEARCH_PATH};

/// Answers every host with the same in-memory catalog.
#[derive(Debug)]
pub struct FixtureTransport {
    catalog: Catalog,
    latency: Duration,
    requests: AtomicUsize,
}

impl FixtureTransport {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            latency: Duration::ZERO,
            requests: AtomicUsize::new(0),
        }
    }

    /// Load the catalog from a JSON file in wire format.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let body = std::fs::read(path.as_ref())?;
        Ok(Self::new(Catalog::decode(&body)?))
    }

    /// Delay every response, to simulate a slow network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of requests served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn respond(&self, url: &Url) -> HttpResponse {
        let path = url.path().trim_matches('/');
        if path == CATALOG_PATH {
            return HttpResponse::ok(self.catalog.encode_or_empty());
        }
        if path == SEARCH_PATH {
            let query = url
                .query_pairs()
                .find(|(key, _)| key == SEARCH_PARAM)
                .map(|(_, value)| value.trim().to_lowercase())
                .unwrap_or_default();
            return HttpResponse::ok(self.search(&query).encode_or_empty());
        }
        HttpResponse::new(404, r#"{"error":"not found"}"#)
    }

    fn search(&self, query: &str) -> Catalog {
        if query.is_empty() {
            return Catalog::empty();
        }
        self.catalog
            .categories
            .iter()
            .filter(|c| c.name.to_lowercase().contains(query))
            .cloned()
            .collect::<Vec<_>>()
            .into()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let response = self.respond(url);
        debug!(url = %url, status = response.status, "fixture response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coasters_core::types::Category;

    fn category(slug: &str, name: &str) -> Category {
        Category {
            slug: slug.into(),
            name: name.into(),
            source_url: format!("/wiki/{slug}"),
            construction: "Steel".into(),
            prebuilt_designs: vec![],
            image_url: format!("/images/{slug}.png"),
        }
    }

    fn fixture() -> FixtureTransport {
        FixtureTransport::new(Catalog::new(vec![
            category("wild-mouse", "Wild Mouse"),
            category("flying", "Flying Coaster"),
            category("mine-train", "Mine Train"),
        ]))
    }

    fn url(path_and_query: &str) -> Url {
        Url::parse(&format!("http://127.0.0.1:3000{path_and_query}")).expect("url")
    }

    async fn decode(transport: &FixtureTransport, path: &str) -> Catalog {
        let response = transport.get(&url(path)).await.expect("get");
        assert!(response.is_ok());
        Catalog::decode(&response.body).expect("decode")
    }

    #[tokio::test]
    async fn listing_returns_everything_in_order() {
        let transport = fixture();
        let catalog = decode(&transport, "/roller-coasters").await;
        let slugs: Vec<_> = catalog.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["wild-mouse", "flying", "mine-train"]);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let catalog = decode(&fixture(), "/roller-coasters/search?name=COASTER").await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.categories[0].slug, "flying");
    }

    #[tokio::test]
    async fn blank_search_returns_nothing() {
        let transport = fixture();
        assert!(decode(&transport, "/roller-coasters/search?name=%20").await.is_empty());
        assert!(decode(&transport, "/roller-coasters/search").await.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = fixture().get(&url("/parks")).await.expect("get");
        assert_eq!(response.status, 404);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("coasters.json");
        std::fs::write(&path, fixture().catalog.encode().expect("encode")).expect("write");
        let transport = FixtureTransport::from_file(&path).expect("load");
        assert_eq!(transport.catalog.len(), 3);
    }
}
