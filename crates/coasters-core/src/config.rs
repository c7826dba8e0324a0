// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoastersError, Result};

/// Environment variable carrying a base-URL override for the catalog server.
pub const BASE_URL_ENV: &str = "ROLLER_COASTER_BASE_URL";

/// Hosts tried after any explicit or environment base: the Android emulator's
/// alias for the host loopback, then the loopback itself.
pub const DEFAULT_FALLBACK_HOSTS: [&str; 2] = ["http://10.0.2.2:3000", "http://127.0.0.1:3000"];

/// How the repository reads results across the service bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeMode {
    /// Project results through arena-scoped handles.
    #[default]
    Handles,
    /// Exchange results as encoded JSON strings.
    Json,
}

impl std::str::FromStr for BridgeMode {
    type Err = CoastersError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "handles" | "handle" => Ok(Self::Handles),
            "json" => Ok(Self::Json),
            other => Err(CoastersError::Config(format!("unknown bridge mode '{other}'"))),
        }
    }
}

/// Persistent catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Explicit base URL for the catalog server. Tried before everything else.
    pub base_url: Option<String>,
    /// Hosts tried, in order, after the explicit and environment bases.
    pub fallback_hosts: Vec<String>,
    /// Upper bound for a single HTTP attempt against one host.
    pub request_timeout_secs: u64,
    /// Quiet period before a search-as-you-type query is sent.
    pub search_debounce_ms: u64,
    /// Bridging mode used by the repository.
    pub bridge_mode: BridgeMode,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            fallback_hosts: DEFAULT_FALLBACK_HOSTS.iter().map(|h| h.to_string()).collect(),
            request_timeout_secs: 15,
            search_debounce_ms: 300,
            bridge_mode: BridgeMode::Handles,
        }
    }
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| CoastersError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "catalog config loaded");
        Ok(config)
    }

    /// Load settings if the file exists, otherwise use the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// The environment-supplied base URL, if set and non-blank.
pub fn env_base_url() -> Option<String> {
    std::env::var(BASE_URL_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = CatalogConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.fallback_hosts, DEFAULT_FALLBACK_HOSTS);
        assert_eq!(config.bridge_mode, BridgeMode::Handles);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url":"http://coasters.local:3000","bridge_mode":"json"}"#)
            .expect("write");

        let config = CatalogConfig::load(&path).expect("load");
        assert_eq!(config.base_url.as_deref(), Some("http://coasters.local:3000"));
        assert_eq!(config.bridge_mode, BridgeMode::Json);
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = CatalogConfig {
            search_debounce_ms: 120,
            ..Default::default()
        };
        config.save(&path).expect("save");
        assert_eq!(CatalogConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CatalogConfig::load_or_default(dir.path().join("absent.json")).expect("load");
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(CatalogConfig::load(&path), Err(CoastersError::Config(_))));
    }

    #[test]
    fn bridge_mode_parses_case_insensitively() {
        assert_eq!("JSON".parse::<BridgeMode>().expect("parse"), BridgeMode::Json);
        assert_eq!(" handles ".parse::<BridgeMode>().expect("parse"), BridgeMode::Handles);
        assert!("ffi".parse::<BridgeMode>().is_err());
    }
}
