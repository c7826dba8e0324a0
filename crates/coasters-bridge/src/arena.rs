// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Handle arenas: lifetime scopes for objects exposed across the bridge.
//
// An arena owns a table of pinned objects. A handle is an index into that
// table plus a borrow of the arena. Every access checks the open flag first,
// so use after close is a reported error, never a read of released memory.
//
// Slots are append-only while the arena is open and are all released at once
// on close. A category is pinned at most once per (catalog slot, index), so
// repeated reads of the same entry do not grow the table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use coasters_core::error::{CoastersError, Result};
use coasters_core::types::{Catalog, Category};

use crate::handle::CatalogHandle;

/// Unique identifier for an arena, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(pub Uuid);

impl ArenaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArenaId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArenaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an arena's lifetime ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaScope {
    /// Closed when its owner drops it; the host manages lifetime implicitly.
    Auto,
    /// Closed explicitly by the caller at a point of its choosing.
    Confined,
}

/// Index of a pinned object within one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u32);

impl Slot {
    pub fn index(self) -> u32 {
        self.0
    }

    /// Rebuild a slot from a value previously returned by [`index`](Self::index).
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }
}

/// A foreign-owned object pinned in an arena.
#[derive(Debug)]
pub(crate) enum Pinned {
    Catalog(Arc<Catalog>),
    /// A category is pinned by reference to its parent catalog, not copied.
    Category { catalog: Arc<Catalog>, index: usize },
}

impl Pinned {
    pub(crate) fn as_catalog(&self) -> Result<&Arc<Catalog>> {
        match self {
            Self::Catalog(catalog) => Ok(catalog),
            Self::Category { .. } => Err(CoastersError::Bridge(
                "handle refers to a category, not a catalog".into(),
            )),
        }
    }

    pub(crate) fn as_category(&self) -> Result<&Category> {
        match self {
            Self::Category { catalog, index } => catalog.categories.get(*index).ok_or_else(|| {
                CoastersError::Bridge(format!("pinned category {index} missing from catalog"))
            }),
            Self::Catalog(_) => Err(CoastersError::Bridge(
                "handle refers to a catalog, not a category".into(),
            )),
        }
    }
}

#[derive(Debug)]
struct ArenaTable {
    open: bool,
    slots: Vec<Pinned>,
    /// Category slots already issued, by parent catalog slot and index.
    children: HashMap<(Slot, usize), Slot>,
}

/// Lifetime scope for bridge handles.
///
/// Not meant to be shared between concurrent fetches: each call that wants
/// handle access opens its own arena and closes it before returning.
#[derive(Debug)]
pub struct Arena {
    id: ArenaId,
    scope: ArenaScope,
    table: Mutex<ArenaTable>,
}

impl Arena {
    /// Open an arena that closes when dropped.
    pub fn open_auto() -> Self {
        Self::open(ArenaScope::Auto)
    }

    /// Open an arena the caller must close with [`close`](Self::close).
    pub fn open_confined() -> Self {
        Self::open(ArenaScope::Confined)
    }

    fn open(scope: ArenaScope) -> Self {
        let arena = Self {
            id: ArenaId::new(),
            scope,
            table: Mutex::new(ArenaTable {
                open: true,
                slots: Vec::new(),
                children: HashMap::new(),
            }),
        };
        debug!(arena = %arena.id, ?scope, "arena opened");
        arena
    }

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn scope(&self) -> ArenaScope {
        self.scope
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Number of objects currently pinned.
    pub fn live_handles(&self) -> usize {
        self.lock().slots.len()
    }

    /// Release every pinned object and invalidate every handle.
    ///
    /// Idempotent. Returns `true` if this call did the closing.
    pub fn close(&self) -> bool {
        let mut table = self.lock();
        if !table.open {
            return false;
        }
        table.open = false;
        table.children.clear();
        let released = std::mem::take(&mut table.slots).len();
        debug!(arena = %self.id, released, "arena closed");
        true
    }

    /// Pin a catalog and return a handle to it.
    pub fn pin_catalog(&self, catalog: Catalog) -> Result<CatalogHandle<'_>> {
        let slot = self.pin(Pinned::Catalog(Arc::new(catalog)))?;
        Ok(CatalogHandle::new(self, slot))
    }

    pub(crate) fn pin(&self, object: Pinned) -> Result<Slot> {
        let mut table = self.lock();
        if !table.open {
            return Err(CoastersError::ArenaClosed);
        }
        self.push(&mut table, object)
    }

    /// Pin category `index` of the catalog in `parent`, or return the slot
    /// it was pinned in before.
    pub(crate) fn pin_category(&self, parent: Slot, index: usize) -> Result<Slot> {
        let mut table = self.lock();
        if !table.open {
            return Err(CoastersError::ArenaClosed);
        }
        if let Some(&slot) = table.children.get(&(parent, index)) {
            return Ok(slot);
        }
        let catalog = Arc::clone(self.slot_in(&table, parent)?.as_catalog()?);
        let slot = self.push(&mut table, Pinned::Category { catalog, index })?;
        table.children.insert((parent, index), slot);
        Ok(slot)
    }

    fn push(&self, table: &mut ArenaTable, object: Pinned) -> Result<Slot> {
        let index = u32::try_from(table.slots.len())
            .map_err(|_| CoastersError::Bridge(format!("arena {} is full", self.id)))?;
        table.slots.push(object);
        Ok(Slot(index))
    }

    fn slot_in<'t>(&self, table: &'t ArenaTable, slot: Slot) -> Result<&'t Pinned> {
        table.slots.get(slot.0 as usize).ok_or_else(|| {
            CoastersError::Bridge(format!("slot {} was never issued by arena {}", slot.0, self.id))
        })
    }

    /// Run `read` against the object in `slot`, if the arena is still open.
    pub(crate) fn with<T>(&self, slot: Slot, read: impl FnOnce(&Pinned) -> Result<T>) -> Result<T> {
        let table = self.lock();
        if !table.open {
            return Err(CoastersError::ArenaClosed);
        }
        read(self.slot_in(&table, slot)?)
    }

    fn lock(&self) -> MutexGuard<'_, ArenaTable> {
        // The table holds no invariants a panicking reader could break.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let table = self.table.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !table.open {
            return;
        }
        let released = table.slots.len();
        table.open = false;
        table.slots.clear();
        table.children.clear();
        match self.scope {
            ArenaScope::Auto => debug!(arena = %self.id, released, "auto arena released on drop"),
            ArenaScope::Confined => {
                warn!(arena = %self.id, released, "confined arena dropped without close")
            }
        }
    }
}
