// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Coasters: native service bridge.
//!
//! Foreign hosts (the JVM app on Android, anything else that cannot hold Rust
//! memory) read catalog results through opaque handles. Every handle is a slot
//! in an [`Arena`]; once the arena is closed, every handle issued from it fails
//! with `ArenaClosed` instead of touching released memory.
//!
//! The same fetch is offered as a future, as a blocking call, and as a JSON
//! string, all over one async core in `coasters-client`.

pub mod arena;
pub mod handle;
pub mod registry;
pub mod service;

#[cfg(target_os = "android")]
pub mod android;

pub use arena::{Arena, ArenaId, ArenaScope, Slot};
pub use handle::{CatalogHandle, CategoryHandle};
pub use registry::ArenaRegistry;
pub use service::{CatalogService, SharedService};
