// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Coasters catalog, and their JSON wire format.
//
// Wire field names are fixed by the catalog server:
//   slug, name, source_url, construction, prebuilt_designs[], image_source

use serde::{Deserialize, Serialize};

use crate::error::{CoastersError, Result};

/// Body returned when a non-throwing call has nothing to report.
pub const EMPTY_CATALOG_JSON: &str = r#"{"categories":[]}"#;

/// One catalog entry: a roller-coaster design family.
///
/// Identity is the `slug`. Values are immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub source_url: String,
    pub construction: String,
    /// Names of the prebuilt designs in this family. Opaque strings.
    #[serde(default)]
    pub prebuilt_designs: Vec<String>,
    #[serde(rename = "image_source")]
    pub image_url: String,
}

/// The full ordered collection of categories returned by the server.
///
/// Order is server-determined and preserved end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Look up a category by slug.
    pub fn find(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    /// Decode a catalog from a response body.
    ///
    /// Unknown fields are ignored. Any shape mismatch is a `DecodeFailure`.
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| CoastersError::DecodeFailure(e.to_string()))
    }

    /// Encode to the wire format.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode to the wire format, falling back to an empty catalog body.
    pub fn encode_or_empty(&self) -> String {
        self.encode().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "catalog encode failed, returning empty body");
            EMPTY_CATALOG_JSON.to_string()
        })
    }

    pub fn into_categories(self) -> Vec<Category> {
        self.categories
    }
}

impl From<Vec<Category>> for Catalog {
    fn from(categories: Vec<Category>) -> Self {
        Self::new(categories)
    }
}
