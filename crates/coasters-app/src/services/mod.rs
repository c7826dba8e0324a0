// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer between the catalog bridge and the interactive front end.
//
// The repository owns the cache and the background execution; the list and
// detail models turn its results into observable screen state.

pub mod data_dir;
pub mod detail_model;
pub mod list_model;
pub mod repository;
