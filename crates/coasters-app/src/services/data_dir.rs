// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware configuration path resolution.

use std::path::PathBuf;

/// Default location of the catalog settings file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// The application configuration directory. Not created here; saving a
/// config creates it on demand.
pub fn config_dir() -> PathBuf {
    config_base(
        std::env::var("XDG_CONFIG_HOME").ok(),
        std::env::var("HOME").ok(),
    )
    .join("coasters")
}

fn config_base(xdg: Option<String>, home: Option<String>) -> PathBuf {
    // XDG first, then ~/.config
    if let Some(xdg) = xdg.filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = home.filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    std::env::temp_dir()
}
