// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Unified catalog interface
//!
//! The Catalog struct is the single entry point for embedding code: object
//! definition, dependency recording, cascaded deletion, descriptions and
//! comments all go through it. Each mutating call stages its changes on the
//! supplied transaction and ends with a publish, so the effects are visible
//! to subsequent calls on the same transaction; nothing is durable until
//! the transaction commits, and `abort()` restores the catalog to its state
//! at `begin()`.

use super::address::{ObjectAddress, ObjectAddresses};
use super::bootstrap::{self, FIRST_USER_OBJECT_ID, PUBLIC_SCHEMA_ID, SYSTEM_SCHEMA_ID};
use super::depend::{DependStore, DependencyType};
use super::describe;
use super::drop::{self, DropBehavior};
use super::error::CatalogResult;
use super::expr;
use super::objects::{
    CatalogRecord, CommentStore, ObjectStore, SharedDependStore, SharedDependencyKind,
};
use super::registry::{self, ObjectClass};
use crate::ast::{Expr, RangeTblEntry};
use crate::storage::StorageManager;
use crate::txn::{CatalogTxn, LockManager};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Role of this node in a distributed deployment
///
/// Executor nodes run drops dispatched by a coordinator and keep quiet
/// about them: cascade NOTICEs are downgraded to debug output there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterRole {
    Coordinator,
    Executor,
}

/// Catalog configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub role: ClusterRole,
    /// Namespaces whose objects are referred to without qualification in
    /// diagnostic messages
    pub search_path: Vec<u32>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            role: ClusterRole::Coordinator,
            search_path: vec![SYSTEM_SCHEMA_ID, PUBLIC_SCHEMA_ID],
        }
    }
}

/// The catalog: object metadata, dependency edges, and the operations
/// over them
pub struct Catalog {
    storage: Arc<StorageManager>,
    objects: ObjectStore,
    depend: DependStore,
    comments: CommentStore,
    shared: SharedDependStore,
    locks: Arc<LockManager>,
    config: CatalogConfig,
    next_object_id: AtomicU32,
}

impl Catalog {
    /// Open an in-memory catalog (tests, tooling)
    pub fn in_memory() -> CatalogResult<Self> {
        Self::build(StorageManager::in_memory(), CatalogConfig::default())
    }

    /// Open an in-memory catalog with explicit configuration
    pub fn in_memory_with_config(config: CatalogConfig) -> CatalogResult<Self> {
        Self::build(StorageManager::in_memory(), config)
    }

    /// Open or create a persistent catalog at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        Self::build(StorageManager::open(path)?, CatalogConfig::default())
    }

    /// Open or create a persistent catalog with explicit configuration
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: CatalogConfig) -> CatalogResult<Self> {
        Self::build(StorageManager::open(path)?, config)
    }

    fn build(storage: StorageManager, config: CatalogConfig) -> CatalogResult<Self> {
        let storage = Arc::new(storage);
        let catalog = Self {
            objects: ObjectStore::open(&storage)?,
            depend: DependStore::open(&storage)?,
            comments: CommentStore::open(&storage)?,
            shared: SharedDependStore::open(&storage)?,
            locks: Arc::new(LockManager::new()),
            next_object_id: AtomicU32::new(FIRST_USER_OBJECT_ID),
            config,
            storage,
        };

        let mut txn = catalog.begin();
        bootstrap::bootstrap(&catalog.objects, &catalog.depend, &mut txn)?;
        txn.commit()?;

        // Continue object id assignment past any persisted objects
        let max_existing = catalog.objects.max_object_id()?;
        if max_existing >= FIRST_USER_OBJECT_ID {
            catalog
                .next_object_id
                .store(max_existing + 1, Ordering::Relaxed);
        }

        Ok(catalog)
    }

    /// Start a catalog transaction
    pub fn begin(&self) -> CatalogTxn {
        CatalogTxn::new(self.locks.clone())
    }

    /// Allocate a fresh object id
    pub fn next_object_id(&self) -> u32 {
        self.next_object_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Define a new catalog object with a freshly allocated id
    pub fn define_object(
        &self,
        txn: &mut CatalogTxn,
        record: CatalogRecord,
    ) -> CatalogResult<ObjectAddress> {
        let object_id = self.next_object_id();
        self.define_object_with_id(txn, object_id, record)
    }

    /// Define a new catalog object under a caller-chosen id
    pub fn define_object_with_id(
        &self,
        txn: &mut CatalogTxn,
        object_id: u32,
        record: CatalogRecord,
    ) -> CatalogResult<ObjectAddress> {
        let addr = self.objects.define(txn, object_id, record)?;
        txn.publish()?;
        Ok(addr)
    }

    /// Whether an object (not a sub-object) exists
    pub fn object_exists(&self, addr: &ObjectAddress) -> CatalogResult<bool> {
        self.objects.exists(addr.class_id, addr.object_id)
    }

    /// Record dependency edges of one kind from `depender` to each of
    /// `referenced`
    pub fn record_dependency_on(
        &self,
        txn: &mut CatalogTxn,
        depender: &ObjectAddress,
        referenced: &[ObjectAddress],
        kind: DependencyType,
    ) -> CatalogResult<()> {
        self.depend.insert_many(txn, depender, referenced, kind)?;
        txn.publish()?;
        Ok(())
    }

    /// Record dependencies of `depender` on every object referenced by an
    /// expression tree
    ///
    /// `rtable` interprets column references at scope level 0.
    pub fn record_dependency_on_expr(
        &self,
        txn: &mut CatalogTxn,
        depender: &ObjectAddress,
        expr_tree: &Expr,
        rtable: &[RangeTblEntry],
        kind: DependencyType,
    ) -> CatalogResult<()> {
        expr::record_dependency_on_expr(
            &self.objects,
            &self.depend,
            txn,
            depender,
            expr_tree,
            rtable,
            kind,
        )?;
        txn.publish()?;
        Ok(())
    }

    /// As `record_dependency_on_expr` for expressions over a single
    /// relation; references to that relation are recorded with `self_kind`
    pub fn record_dependency_on_single_rel_expr(
        &self,
        txn: &mut CatalogTxn,
        depender: &ObjectAddress,
        expr_tree: &Expr,
        rel_id: u32,
        kind: DependencyType,
        self_kind: DependencyType,
    ) -> CatalogResult<()> {
        expr::record_dependency_on_single_rel_expr(
            &self.objects,
            &self.depend,
            txn,
            depender,
            expr_tree,
            rel_id,
            kind,
            self_kind,
        )?;
        txn.publish()?;
        Ok(())
    }

    /// Protect an object with a PIN edge
    pub fn record_pin(&self, txn: &mut CatalogTxn, referenced: &ObjectAddress) -> CatalogResult<()> {
        self.depend.record_pin(txn, referenced)?;
        txn.publish()?;
        Ok(())
    }

    /// Drop one object
    ///
    /// On failure the transaction may hold partial deletions; the caller
    /// is expected to abort it.
    pub fn perform_deletion(
        &self,
        txn: &mut CatalogTxn,
        object: &ObjectAddress,
        behavior: DropBehavior,
    ) -> CatalogResult<()> {
        drop::perform_deletion(self, txn, object, behavior)
    }

    /// Drop several objects at once
    pub fn perform_multiple_deletions(
        &self,
        txn: &mut CatalogTxn,
        objects: &ObjectAddresses,
        behavior: DropBehavior,
    ) -> CatalogResult<()> {
        drop::perform_multiple_deletions(self, txn, objects, behavior)
    }

    /// Drop everything that depends on `object`, leaving the object itself
    pub fn delete_what_depends_on(
        &self,
        txn: &mut CatalogTxn,
        object: &ObjectAddress,
        show_notices: bool,
    ) -> CatalogResult<()> {
        drop::delete_what_depends_on(self, txn, object, show_notices)
    }

    /// Edges recording what `depender` depends on
    pub fn list_dependencies(
        &self,
        txn: &mut CatalogTxn,
        depender: &ObjectAddress,
    ) -> CatalogResult<Vec<super::depend::DependencyEdge>> {
        self.depend.scan_outgoing(txn, depender, false)
    }

    /// Edges recording what depends on `referenced`
    pub fn list_dependents(
        &self,
        txn: &mut CatalogTxn,
        referenced: &ObjectAddress,
    ) -> CatalogResult<Vec<super::depend::DependencyEdge>> {
        self.depend.scan_incoming(txn, referenced, false)
    }

    /// Object class of an address
    pub fn get_object_class(&self, addr: &ObjectAddress) -> CatalogResult<ObjectClass> {
        registry::object_class(addr)
    }

    /// Human-readable description of an object, for messages
    pub fn get_object_description(&self, addr: &ObjectAddress) -> CatalogResult<String> {
        describe::describe_object(&self.objects, &self.config.search_path, addr)
    }

    /// Attach a comment to an object
    pub fn set_comment(
        &self,
        txn: &mut CatalogTxn,
        addr: &ObjectAddress,
        text: &str,
    ) -> CatalogResult<()> {
        self.comments.set_comment(txn, addr, text)?;
        txn.publish()?;
        Ok(())
    }

    /// Read an object's comment
    pub fn get_comment(&self, addr: &ObjectAddress) -> CatalogResult<Option<String>> {
        self.comments.get_comment(addr)
    }

    /// Record that `role_id` owns the object at `addr`
    pub fn record_owner(
        &self,
        txn: &mut CatalogTxn,
        addr: &ObjectAddress,
        role_id: u32,
    ) -> CatalogResult<()> {
        self.shared.record_shared(
            txn,
            addr.class_id,
            addr.object_id,
            role_id,
            SharedDependencyKind::Owner,
        )?;
        txn.publish()?;
        Ok(())
    }

    /// Number of shared-dependency records held by an object
    pub fn shared_dependency_count(&self, addr: &ObjectAddress) -> CatalogResult<usize> {
        self.shared.count_for_object(addr.class_id, addr.object_id)
    }

    /// Flush the underlying storage
    pub fn flush(&self) -> CatalogResult<()> {
        self.storage.flush()?;
        Ok(())
    }

    pub(crate) fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub(crate) fn depend_store(&self) -> &DependStore {
        &self.depend
    }

    pub(crate) fn comments(&self) -> &CommentStore {
        &self.comments
    }

    pub(crate) fn shared(&self) -> &SharedDependStore {
        &self.shared
    }

    pub(crate) fn search_path(&self) -> &[u32] {
        &self.config.search_path
    }

    pub(crate) fn cluster_role(&self) -> ClusterRole {
        self.config.role
    }
}
