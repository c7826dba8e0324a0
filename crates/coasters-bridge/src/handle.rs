// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only handles over pinned catalog objects.
//
// List-valued fields are read by count plus index; indices outside
// `[0, count)` fail with `IndexOutOfRange`. Scalar accessors return owned
// copies, which stay valid after the arena closes.

use coasters_core::error::{CoastersError, Result};
use coasters_core::types::Category;

use crate::arena::{Arena, Slot};

/// Validate a signed index (as received from a foreign caller) against `count`.
pub(crate) fn checked_index(index: i64, count: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < count)
        .ok_or(CoastersError::IndexOutOfRange { index, count })
}

fn bounded(index: usize, count: usize) -> Result<usize> {
    checked_index(i64::try_from(index).unwrap_or(i64::MAX), count)
}

/// Handle to a pinned [`Catalog`](coasters_core::types::Catalog).
#[derive(Debug, Clone, Copy)]
pub struct CatalogHandle<'a> {
    arena: &'a Arena,
    slot: Slot,
}

impl<'a> CatalogHandle<'a> {
    pub(crate) fn new(arena: &'a Arena, slot: Slot) -> Self {
        Self { arena, slot }
    }

    /// Re-attach a slot previously obtained from [`slot`](Self::slot).
    pub fn from_slot(arena: &'a Arena, slot: Slot) -> Self {
        Self::new(arena, slot)
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Number of categories.
    pub fn count(&self) -> Result<usize> {
        self.arena.with(self.slot, |p| Ok(p.as_catalog()?.len()))
    }

    /// Pin the category at `index` in the same arena. Asking for the same
    /// index again returns the same slot.
    pub fn category_at(&self, index: usize) -> Result<CategoryHandle<'a>> {
        let index = bounded(index, self.count()?)?;
        let slot = self.arena.pin_category(self.slot, index)?;
        Ok(CategoryHandle::new(self.arena, slot))
    }

    /// [`category_at`](Self::category_at) for a signed foreign index.
    pub fn category_at_signed(&self, index: i64) -> Result<CategoryHandle<'a>> {
        let count = self.count()?;
        self.category_at(checked_index(index, count)?)
    }
}

/// Handle to one pinned [`Category`].
#[derive(Debug, Clone, Copy)]
pub struct CategoryHandle<'a> {
    arena: &'a Arena,
    slot: Slot,
}

impl<'a> CategoryHandle<'a> {
    pub(crate) fn new(arena: &'a Arena, slot: Slot) -> Self {
        Self { arena, slot }
    }

    /// Re-attach a slot previously obtained from [`slot`](Self::slot).
    pub fn from_slot(arena: &'a Arena, slot: Slot) -> Self {
        Self::new(arena, slot)
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    fn read<T>(&self, field: impl FnOnce(&Category) -> T) -> Result<T> {
        self.arena.with(self.slot, |p| p.as_category().map(field))
    }

    pub fn slug(&self) -> Result<String> {
        self.read(|c| c.slug.clone())
    }

    pub fn name(&self) -> Result<String> {
        self.read(|c| c.name.clone())
    }

    pub fn construction(&self) -> Result<String> {
        self.read(|c| c.construction.clone())
    }

    pub fn source_url(&self) -> Result<String> {
        self.read(|c| c.source_url.clone())
    }

    pub fn image_url(&self) -> Result<String> {
        self.read(|c| c.image_url.clone())
    }

    pub fn prebuilt_design_count(&self) -> Result<usize> {
        self.read(|c| c.prebuilt_designs.len())
    }

    pub fn prebuilt_design_at(&self, index: usize) -> Result<String> {
        self.arena.with(self.slot, |p| {
            let designs = &p.as_category()?.prebuilt_designs;
            let index = bounded(index, designs.len())?;
            Ok(designs[index].clone())
        })
    }

    /// [`prebuilt_design_at`](Self::prebuilt_design_at) for a signed foreign index.
    pub fn prebuilt_design_at_signed(&self, index: i64) -> Result<String> {
        let count = self.prebuilt_design_count()?;
        self.prebuilt_design_at(checked_index(index, count)?)
    }

    /// Copy the whole category out of the arena.
    pub fn to_category(&self) -> Result<Category> {
        self.read(Category::clone)
    }
}
