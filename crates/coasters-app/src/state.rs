// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Observable screen state for the list and detail views.

use chrono::{DateTime, Utc};

use coasters_core::types::Category;

/// State of the catalog list screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    /// The query as last typed, untrimmed.
    pub query: String,
    /// Whether a request is in flight.
    pub is_loading: bool,
    /// Categories from the most recent successful request, in server order.
    pub items: Vec<Category>,
    /// User-facing message for the most recent failure, if any.
    pub error: Option<String>,
    /// When `items` was last replaced.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// State of the single-category detail screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub is_loading: bool,
    pub detail: Option<Category>,
    pub error: Option<String>,
}
