// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coasters Client: the catalog-fetch protocol: host candidate resolution,
// fetch/search requests over a pluggable transport, JSON decoding, and URL
// normalization against whichever host answered.

pub mod client;
pub mod fixture;
pub mod hosts;
pub mod transport;
pub mod urls;

pub use client::{CatalogClient, block_on};
pub use fixture::FixtureTransport;
pub use hosts::{Host, HostCandidates};
pub use transport::{HttpResponse, HttpTransport, Transport};
