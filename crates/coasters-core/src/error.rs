// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Coasters.

use thiserror::Error;

/// Top-level error type for all Coasters operations.
#[derive(Debug, Error)]
pub enum CoastersError {
    // -- Catalog service --
    #[error("no catalog host reachable: {0}")]
    HostUnreachable(String),

    #[error("catalog response could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("category not found: {0}")]
    NotFound(String),

    // -- Handle bridge --
    #[error("arena is closed")]
    ArenaClosed,

    #[error("index {index} out of range for {count} element(s)")]
    IndexOutOfRange { index: i64, count: usize },

    #[error("platform bridge error: {0}")]
    Bridge(String),

    // -- Runtime / configuration --
    #[error("background task failed: {0}")]
    TaskFailed(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoastersError {
    /// Every candidate host failed, for whatever reason.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::HostUnreachable(_) | Self::DecodeFailure(_))
    }

    /// Misuse of the handle API rather than a network condition.
    pub fn is_bridge_violation(&self) -> bool {
        matches!(self, Self::ArenaClosed | Self::IndexOutOfRange { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CoastersError>;
