// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog dependency engine
//!
//! Records which catalog objects depend on which, discovers references
//! inside expression trees, and drives cascaded deletion: given a drop
//! request it decides what else has to go (CASCADE), what forbids the drop
//! (RESTRICT, PIN), and the order destructors run in so none of them ever
//! sees a dangling reference.

pub mod address;
pub mod bootstrap;
pub mod depend;
pub mod describe;
pub mod drop;
pub mod error;
pub mod expr;
pub mod manager;
pub mod objects;
pub mod registry;

pub use address::{ObjectAddress, ObjectAddresses};
pub use depend::{DependencyEdge, DependencyType};
pub use drop::{DropBehavior, Severity};
pub use error::{CatalogError, CatalogResult};
pub use manager::{Catalog, CatalogConfig, ClusterRole};
pub use objects::{CatalogRecord, ColumnMeta, RelationKind, SharedDependencyKind};
pub use registry::ObjectClass;
