// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! RelLite catalog engine
//!
//! RelLite is a lightweight embedded relational database. This crate is its
//! catalog engine: the system tables that describe every object in a
//! database, the dependency graph between those objects, and the machinery
//! that keeps both consistent when objects are dropped.
//!
//! # Features
//!
//! - **Typed dependency graph**: NORMAL, AUTO, INTERNAL and PIN edges with
//!   distinct cascading rules, stored as catalog tuples
//! - **Safe cascaded deletion**: RESTRICT/CASCADE semantics with
//!   order-independent outcomes, cycle-safe traversal, and destructors that
//!   never observe dangling references
//! - **Expression scanning**: dependencies of view, default and constraint
//!   expressions discovered straight from their expression trees
//! - **Embedded storage**: persistent catalogs on sled, in-memory catalogs
//!   for tests and tooling
//!
//! # Usage
//!
//! ```no_run
//! use rellite::{Catalog, CatalogRecord, DependencyType, DropBehavior};
//!
//! let catalog = Catalog::in_memory()?;
//! let mut txn = catalog.begin();
//!
//! let table = catalog.define_object(
//!     &mut txn,
//!     CatalogRecord::Relation {
//!         name: "orders".to_string(),
//!         namespace: rellite::catalog::bootstrap::PUBLIC_SCHEMA_ID,
//!         kind: rellite::RelationKind::Table,
//!         columns: vec![],
//!     },
//! )?;
//! let view = catalog.define_object(
//!     &mut txn,
//!     CatalogRecord::Relation {
//!         name: "recent_orders".to_string(),
//!         namespace: rellite::catalog::bootstrap::PUBLIC_SCHEMA_ID,
//!         kind: rellite::RelationKind::View,
//!         columns: vec![],
//!     },
//! )?;
//! catalog.record_dependency_on(&mut txn, &view, &[table], DependencyType::Normal)?;
//!
//! // Refused: the view depends on the table
//! assert!(catalog
//!     .perform_deletion(&mut txn, &table, DropBehavior::Restrict)
//!     .is_err());
//! # Ok::<(), rellite::CatalogError>(())
//! ```

// Public modules
pub mod ast;
pub mod catalog;

// Internal infrastructure the catalog is built on
pub mod storage;
pub mod txn;

// Re-export the embedding API
pub use catalog::{
    Catalog, CatalogConfig, CatalogError, CatalogRecord, CatalogResult, ClusterRole, ColumnMeta,
    DependencyType, DropBehavior, ObjectAddress, ObjectAddresses, ObjectClass, RelationKind,
    Severity, SharedDependencyKind,
};
pub use storage::types::StorageType;
pub use txn::CatalogTxn;

/// RelLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// RelLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
