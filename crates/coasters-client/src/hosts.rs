// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Catalog host candidate resolution.
//
// Order: explicit caller-supplied base, then the environment base, then the
// configured fallback list. Blank and unparseable entries are skipped; the
// first occurrence of a duplicate wins.

use coasters_core::config::{CatalogConfig, DEFAULT_FALLBACK_HOSTS, env_base_url};
use tracing::{debug, warn};
use url::Url;

/// One candidate base host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// The base as configured, trimmed of whitespace and trailing slashes.
    base: String,
    url: Url,
}

impl Host {
    /// Parse an `http`/`https` base URL. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let base = raw.trim().trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        let url = Url::parse(base).ok()?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return None;
        }
        Some(Self {
            base: base.to_string(),
            url,
        })
    }

    /// Base used for URL normalization.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}

/// Ordered, de-duplicated, never-empty list of base hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCandidates {
    hosts: Vec<Host>,
}

impl HostCandidates {
    /// Resolve candidates from the three configuration sources.
    pub fn resolve(explicit: Option<&str>, env: Option<&str>, fallbacks: &[String]) -> Self {
        let mut hosts: Vec<Host> = Vec::new();
        let sources = explicit
            .into_iter()
            .chain(env)
            .chain(fallbacks.iter().map(String::as_str));

        for raw in sources {
            if raw.trim().is_empty() {
                continue;
            }
            match Host::parse(raw) {
                Some(host) if hosts.iter().any(|h| h.url == host.url) => {
                    debug!(host = %host, "duplicate catalog host skipped");
                }
                Some(host) => hosts.push(host),
                None => warn!(raw, "ignoring unparseable catalog host"),
            }
        }

        if hosts.is_empty() {
            warn!("no usable catalog host configured, using built-in fallbacks");
            hosts = DEFAULT_FALLBACK_HOSTS
                .iter()
                .filter_map(|raw| Host::parse(raw))
                .collect();
        }

        Self { hosts }
    }

    /// Resolve from settings plus the `ROLLER_COASTER_BASE_URL` environment variable.
    pub fn from_config(config: &CatalogConfig) -> Self {
        let env = env_base_url();
        Self::resolve(config.base_url.as_deref(), env.as_deref(), &config.fallback_hosts)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// The highest-priority host.
    pub fn primary(&self) -> Option<&Host> {
        self.hosts.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bases(candidates: &HostCandidates) -> Vec<&str> {
        candidates.iter().map(Host::base).collect()
    }

    fn defaults() -> Vec<String> {
        DEFAULT_FALLBACK_HOSTS.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn explicit_then_env_then_fallbacks() {
        let candidates = HostCandidates::resolve(
            Some("http://explicit:3000/"),
            Some("http://env:3000"),
            &defaults(),
        );
        assert_eq!(
            bases(&candidates),
            vec![
                "http://explicit:3000",
                "http://env:3000",
                "http://10.0.2.2:3000",
                "http://127.0.0.1:3000",
            ]
        );
        assert_eq!(candidates.primary().map(Host::base), Some("http://explicit:3000"));
    }

    #[test]
    fn blank_sources_are_skipped() {
        let candidates = HostCandidates::resolve(Some("   "), Some(""), &defaults());
        assert_eq!(bases(&candidates), vec!["http://10.0.2.2:3000", "http://127.0.0.1:3000"]);
    }

    #[test]
    fn duplicates_keep_first_position() {
        let candidates =
            HostCandidates::resolve(Some("http://127.0.0.1:3000"), None, &defaults());
        assert_eq!(bases(&candidates), vec!["http://127.0.0.1:3000", "http://10.0.2.2:3000"]);
    }

    #[test]
    fn unparseable_and_non_http_entries_are_dropped() {
        let fallbacks = vec!["not a url".to_string(), "ftp://files:21".to_string()];
        let candidates = HostCandidates::resolve(Some("http://ok:1"), None, &fallbacks);
        assert_eq!(bases(&candidates), vec!["http://ok:1"]);
    }

    #[test]
    fn nothing_usable_falls_back_to_defaults() {
        let candidates = HostCandidates::resolve(None, None, &["::".to_string()]);
        assert_eq!(candidates.len(), 2);
        assert!(!candidates.is_empty());
    }
}
