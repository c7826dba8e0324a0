// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Endpoint construction and URL normalization.

use coasters_core::types::{Catalog, Category};
use url::Url;

/// Category listing path.
pub const CATALOG_PATH: &str = "roller-coasters";
/// Search path; takes a single `name` query parameter.
pub const SEARCH_PATH: &str = "roller-coasters/search";
pub const SEARCH_PARAM: &str = "name";

/// Build the request URL for `path` on `base`.
///
/// The path replaces whatever path the base carried. `query`, when given, is
/// sent as the `name` parameter.
pub fn endpoint(base: &Url, path: &str, query: Option<&str>) -> Url {
    let mut url = base.clone();
    url.set_path(&format!("/{}", path.trim_matches('/')));
    url.set_query(None);
    url.set_fragment(None);
    if let Some(query) = query {
        url.query_pairs_mut().append_pair(SEARCH_PARAM, query);
    }
    url
}

/// Resolve a possibly-relative field value against the base host.
///
/// Absolute `http(s)` values and blank values pass through untouched, so the
/// function is idempotent.
pub fn normalize_url(base: &str, raw: &str) -> String {
    if raw.trim().is_empty() || has_http_scheme(raw) {
        return raw.to_string();
    }
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        raw.trim_start_matches('/')
    )
}

/// Normalize the URL-valued fields of every category.
pub fn normalize_catalog(catalog: Catalog, base: &str) -> Catalog {
    catalog
        .into_categories()
        .into_iter()
        .map(|category| normalize_category(category, base))
        .collect::<Vec<_>>()
        .into()
}

fn normalize_category(category: Category, base: &str) -> Category {
    Category {
        source_url: normalize_url(base, &category.source_url),
        image_url: normalize_url(base, &category.image_url),
        ..category
    }
}

fn has_http_scheme(value: &str) -> bool {
    let bytes = value.as_bytes();
    ["http://", "https://"].iter().any(|scheme| {
        bytes.len() >= scheme.len() && bytes[..scheme.len()].eq_ignore_ascii_case(scheme.as_bytes())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://127.0.0.1:3000";

    #[test]
    fn relative_path_is_joined_with_single_slash() {
        assert_eq!(
            normalize_url("http://127.0.0.1:3000/", "/images/wooden.png"),
            "http://127.0.0.1:3000/images/wooden.png"
        );
        assert_eq!(
            normalize_url(BASE, "images/wooden.png"),
            "http://127.0.0.1:3000/images/wooden.png"
        );
        assert_eq!(
            normalize_url(" http://127.0.0.1:3000// ", "//images/x.png"),
            "http://127.0.0.1:3000/images/x.png"
        );
    }

    #[test]
    fn absolute_urls_untouched_regardless_of_case() {
        for raw in ["https://cdn.example.com/a.png", "HTTP://Example.com/b", "http://x"] {
            assert_eq!(normalize_url(BASE, raw), raw);
        }
    }

    #[test]
    fn blank_values_untouched() {
        assert_eq!(normalize_url(BASE, ""), "");
        assert_eq!(normalize_url(BASE, "  "), "  ");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "/images/wooden.png",
            "images/steel.png",
            "https://cdn.example.com/a.png",
            "",
            "ftp-ish/path",
        ] {
            let once = normalize_url(BASE, raw);
            let twice = normalize_url(BASE, &once);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn multibyte_values_do_not_panic() {
        assert_eq!(normalize_url(BASE, "ü"), "http://127.0.0.1:3000/ü");
    }

    #[test]
    fn endpoint_replaces_base_path_and_encodes_query() {
        let base = Url::parse("http://10.0.2.2:3000/api/?stale=1").expect("parse");
        let listing = endpoint(&base, CATALOG_PATH, None);
        assert_eq!(listing.as_str(), "http://10.0.2.2:3000/roller-coasters");

        let search = endpoint(&base, SEARCH_PATH, Some("wild mouse"));
        assert_eq!(search.path(), "/roller-coasters/search");
        let pairs: Vec<(String, String)> = search.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("name".to_string(), "wild mouse".to_string())]);
    }
}
