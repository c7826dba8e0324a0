// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide arena registry for hosts that can only hold integers.
//
// A foreign host sees an arena as a 32-bit key and a handle as one `i64`:
// arena key in the high 32 bits, slot in the low 32. Key 0 is never issued,
// so a zeroed handle is always rejected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use coasters_core::error::{CoastersError, Result};

use crate::arena::{Arena, ArenaScope, Slot};

/// Pack an arena key and slot into one opaque handle.
pub fn pack(key: u32, slot: Slot) -> i64 {
    ((u64::from(key) << 32) | u64::from(slot.index())) as i64
}

/// Split a handle produced by [`pack`].
pub fn unpack(handle: i64) -> (u32, Slot) {
    let raw = handle as u64;
    ((raw >> 32) as u32, Slot::from_index(raw as u32))
}

/// Arena key as received from a foreign caller.
pub fn arena_key(raw: i64) -> Result<u32> {
    u32::try_from(raw)
        .ok()
        .filter(|&key| key != 0)
        .ok_or_else(|| CoastersError::Bridge(format!("invalid arena key {raw}")))
}

#[derive(Debug)]
struct RegistryTable {
    next_key: u32,
    arenas: HashMap<u32, Arc<Arena>>,
}

/// Arenas currently open on behalf of foreign hosts, by key.
#[derive(Debug)]
pub struct ArenaRegistry {
    table: Mutex<RegistryTable>,
}

impl Default for ArenaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaRegistry {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(RegistryTable {
                next_key: 1,
                arenas: HashMap::new(),
            }),
        }
    }

    /// Open an arena and return its key.
    pub fn open(&self, scope: ArenaScope) -> Result<u32> {
        let arena = match scope {
            ArenaScope::Auto => Arena::open_auto(),
            ArenaScope::Confined => Arena::open_confined(),
        };
        let mut table = self.lock();
        let key = table.next_key;
        if key == u32::MAX {
            return Err(CoastersError::Bridge("arena keys exhausted".into()));
        }
        table.next_key += 1;
        debug!(key, arena = %arena.id(), "arena registered");
        table.arenas.insert(key, Arc::new(arena));
        Ok(key)
    }

    /// The arena for `key`. A closed or never-issued key is `ArenaClosed`.
    pub fn get(&self, key: u32) -> Result<Arc<Arena>> {
        self.lock()
            .arenas
            .get(&key)
            .cloned()
            .ok_or(CoastersError::ArenaClosed)
    }

    /// Close and forget the arena for `key`. Idempotent.
    pub fn close(&self, key: u32) -> bool {
        let removed = self.lock().arenas.remove(&key);
        match removed {
            Some(arena) => arena.close(),
            None => false,
        }
    }

    /// Forget the arena for `key` without closing it. The arena closes once
    /// the last call still holding it returns. Hosts wire this to their
    /// garbage collector for `Auto` arenas. Idempotent.
    pub fn release(&self, key: u32) -> bool {
        let removed = self.lock().arenas.remove(&key);
        match removed {
            Some(arena) => {
                debug!(key, arena = %arena.id(), scope = ?arena.scope(), "arena released");
                true
            }
            None => false,
        }
    }

    /// Number of arenas still open.
    pub fn len(&self) -> usize {
        self.lock().arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, RegistryTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
