// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog transaction support
//!
//! A thin transaction layer for catalog work: staged mutations with a
//! publish barrier, undo-based rollback, and row-level locks on dependency
//! edge rows. Data-plane transactions live elsewhere; this module only
//! covers what catalog maintenance needs.

pub mod locks;
pub mod transaction;

pub use locks::LockManager;
pub use transaction::CatalogTxn;
