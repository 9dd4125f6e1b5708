// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage layer for the catalog's system trees
//!
//! The catalog persists everything in named key-value trees (one per system
//! table). The StorageManager selects a backend, opens trees on demand, and
//! hands out shared handles so that the transaction layer can replay undo
//! images against the same trees the stores write through.

pub mod memory;
pub mod sled;
pub mod traits;
pub mod types;

use self::memory::MemoryDriver;
use self::sled::SledDriver;
use self::traits::{StorageDriver, StorageTree};
use self::types::{StorageResult, StorageType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

enum Driver {
    Memory(MemoryDriver),
    Sled(SledDriver),
}

/// Manages the storage backend and the set of opened system trees
pub struct StorageManager {
    driver: Driver,
    trees: RwLock<HashMap<String, Arc<dyn StorageTree>>>,
}

impl StorageManager {
    /// Open an in-memory storage manager (tests, throwaway catalogs)
    pub fn in_memory() -> Self {
        Self {
            driver: Driver::Memory(MemoryDriver::new()),
            trees: RwLock::new(HashMap::new()),
        }
    }

    /// Open a persistent sled-backed storage manager at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let driver = Driver::Sled(SledDriver::open(path)?);
        Ok(Self {
            driver,
            trees: RwLock::new(HashMap::new()),
        })
    }

    /// Get a shared handle to a named tree, opening it if necessary
    pub fn tree(&self, name: &str) -> StorageResult<Arc<dyn StorageTree>> {
        if let Some(tree) = self.trees.read().get(name) {
            return Ok(tree.clone());
        }

        let mut trees = self.trees.write();
        // Re-check under the write lock
        if let Some(tree) = trees.get(name) {
            return Ok(tree.clone());
        }

        let opened: Arc<dyn StorageTree> = match &self.driver {
            Driver::Memory(d) => Arc::from(d.open_tree(name)?),
            Driver::Sled(d) => Arc::from(d.open_tree(name)?),
        };
        trees.insert(name.to_string(), opened.clone());
        log::debug!("Opened storage tree '{}'", name);
        Ok(opened)
    }

    /// Flush all pending writes to durable storage
    pub fn flush(&self) -> StorageResult<()> {
        match &self.driver {
            Driver::Memory(d) => d.flush(),
            Driver::Sled(d) => d.flush(),
        }
    }

    /// Get the backend type in use
    pub fn storage_type(&self) -> StorageType {
        match &self.driver {
            Driver::Memory(d) => d.storage_type(),
            Driver::Sled(d) => d.storage_type(),
        }
    }
}
