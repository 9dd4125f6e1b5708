// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Persistent dependency edge storage
//!
//! Edges live in the `sys_depend` tree as bincode rows addressed by a
//! monotonically assigned row id, with one index tree per endpoint so both
//! scan directions are prefix lookups. A whole-object endpoint (sub_id 0)
//! used as a scan target matches every sub-object of that object; a
//! sub-object target matches exactly.

use super::address::ObjectAddress;
use super::error::CatalogResult;
use crate::storage::traits::StorageTree;
use crate::storage::StorageManager;
use crate::txn::CatalogTxn;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const DEPEND_TREE: &str = "sys_depend";
const DEPEND_BY_DEPENDENT_TREE: &str = "sys_depend_dep";
const DEPEND_BY_REFERENCED_TREE: &str = "sys_depend_ref";

/// Kind of a dependency edge
///
/// The single-character tags are the on-disk encoding and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyType {
    /// Dependent references referenced; blocks RESTRICT, cascades under
    /// CASCADE
    Normal,
    /// Referenced implicitly owns dependent; dropping referenced silently
    /// drops dependent
    Auto,
    /// Dependent is an implementation detail of referenced; direct drops
    /// of the dependent are redirected to the referenced object
    Internal,
    /// Referenced is required by the database system and cannot be dropped
    Pin,
}

impl DependencyType {
    pub fn tag(&self) -> char {
        match self {
            DependencyType::Normal => 'n',
            DependencyType::Auto => 'a',
            DependencyType::Internal => 'i',
            DependencyType::Pin => 'p',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'n' => Some(DependencyType::Normal),
            'a' => Some(DependencyType::Auto),
            'i' => Some(DependencyType::Internal),
            'p' => Some(DependencyType::Pin),
            _ => None,
        }
    }
}

/// On-disk edge row
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeRecord {
    dependent: ObjectAddress,
    referenced: ObjectAddress,
    tag: u8,
}

/// A dependency edge as yielded by a scan
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub row_id: u64,
    pub dependent: ObjectAddress,
    pub referenced: ObjectAddress,
    /// Raw on-disk kind tag; unknown tags surface as errors at the policy
    /// sites, not during the scan
    pub tag: char,
}

impl DependencyEdge {
    pub fn kind(&self) -> Option<DependencyType> {
        DependencyType::from_tag(self.tag)
    }
}

fn endpoint_prefix(addr: &ObjectAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(12);
    key.extend_from_slice(&addr.class_id.to_be_bytes());
    key.extend_from_slice(&addr.object_id.to_be_bytes());
    if addr.sub_id != 0 {
        key.extend_from_slice(&(addr.sub_id as u32).to_be_bytes());
    }
    key
}

fn index_key(addr: &ObjectAddress, row_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(20);
    key.extend_from_slice(&addr.class_id.to_be_bytes());
    key.extend_from_slice(&addr.object_id.to_be_bytes());
    key.extend_from_slice(&(addr.sub_id as u32).to_be_bytes());
    key.extend_from_slice(&row_id.to_be_bytes());
    key
}

fn row_key(row_id: u64) -> [u8; 8] {
    row_id.to_be_bytes()
}

/// The dependency edge table with its two endpoint indexes
pub struct DependStore {
    rows: Arc<dyn StorageTree>,
    by_dependent: Arc<dyn StorageTree>,
    by_referenced: Arc<dyn StorageTree>,
    next_row_id: AtomicU64,
}

impl DependStore {
    pub fn open(storage: &StorageManager) -> CatalogResult<Self> {
        let rows = storage.tree(DEPEND_TREE)?;

        // Seed the row id allocator past any persisted rows
        let mut max_row_id = 0u64;
        for entry in rows.iter()? {
            let (key, _) = entry?;
            if key.len() == 8 {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&key);
                max_row_id = max_row_id.max(u64::from_be_bytes(buf));
            }
        }

        Ok(Self {
            rows,
            by_dependent: storage.tree(DEPEND_BY_DEPENDENT_TREE)?,
            by_referenced: storage.tree(DEPEND_BY_REFERENCED_TREE)?,
            next_row_id: AtomicU64::new(max_row_id + 1),
        })
    }

    fn alloc_row_id(&self) -> u64 {
        self.next_row_id.fetch_add(1, Ordering::Relaxed)
    }

    fn stage_edge(
        &self,
        txn: &mut CatalogTxn,
        dependent: ObjectAddress,
        referenced: ObjectAddress,
        kind: DependencyType,
    ) -> CatalogResult<()> {
        let row_id = self.alloc_row_id();
        let record = EdgeRecord {
            dependent,
            referenced,
            tag: kind.tag() as u8,
        };
        let value = bincode::serialize(&record)?;
        txn.stage_put(self.rows.clone(), row_key(row_id).to_vec(), value);
        txn.stage_put(
            self.by_dependent.clone(),
            index_key(&dependent, row_id),
            Vec::new(),
        );
        txn.stage_put(
            self.by_referenced.clone(),
            index_key(&referenced, row_id),
            Vec::new(),
        );
        Ok(())
    }

    /// Stage one edge of the given kind from `dependent` to each element of
    /// `refs`, duplicates included
    pub fn insert_many(
        &self,
        txn: &mut CatalogTxn,
        dependent: &ObjectAddress,
        refs: &[ObjectAddress],
        kind: DependencyType,
    ) -> CatalogResult<()> {
        for referenced in refs {
            self.stage_edge(txn, *dependent, *referenced, kind)?;
        }
        Ok(())
    }

    /// Stage a PIN edge protecting `referenced`
    ///
    /// PIN edges carry a zeroed dependent endpoint.
    pub fn record_pin(&self, txn: &mut CatalogTxn, referenced: &ObjectAddress) -> CatalogResult<()> {
        self.stage_edge(
            txn,
            ObjectAddress::new(0, 0, 0),
            *referenced,
            DependencyType::Pin,
        )
    }

    /// Edges whose dependent endpoint matches `addr`, materialised
    ///
    /// With `for_update` every yielded row is write-locked for the rest of
    /// the transaction.
    pub fn scan_outgoing(
        &self,
        txn: &mut CatalogTxn,
        addr: &ObjectAddress,
        for_update: bool,
    ) -> CatalogResult<Vec<DependencyEdge>> {
        self.scan_index(txn, &self.by_dependent, addr, for_update)
    }

    /// Edges whose referenced endpoint matches `addr`, materialised
    pub fn scan_incoming(
        &self,
        txn: &mut CatalogTxn,
        addr: &ObjectAddress,
        for_update: bool,
    ) -> CatalogResult<Vec<DependencyEdge>> {
        self.scan_index(txn, &self.by_referenced, addr, for_update)
    }

    fn scan_index(
        &self,
        txn: &mut CatalogTxn,
        index: &Arc<dyn StorageTree>,
        addr: &ObjectAddress,
        for_update: bool,
    ) -> CatalogResult<Vec<DependencyEdge>> {
        let prefix = endpoint_prefix(addr);
        let mut edges = Vec::new();

        for entry in index.scan_prefix(&prefix)? {
            let (key, _) = entry?;
            if key.len() < 8 {
                continue;
            }
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&key[key.len() - 8..]);
            let row_id = u64::from_be_bytes(buf);

            let row = match self.rows.get(&row_key(row_id))? {
                Some(bytes) => bytes,
                // Index entry published ahead of a concurrent row removal;
                // the row is gone, skip it
                None => continue,
            };
            let record: EdgeRecord = bincode::deserialize(&row)?;

            if for_update {
                txn.lock_row(row_id);
            }
            edges.push(DependencyEdge {
                row_id,
                dependent: record.dependent,
                referenced: record.referenced,
                tag: record.tag as char,
            });
        }
        Ok(edges)
    }

    /// Stage removal of one edge row and its index entries
    pub fn delete_edge(&self, txn: &mut CatalogTxn, edge: &DependencyEdge) -> CatalogResult<()> {
        txn.stage_delete(self.rows.clone(), row_key(edge.row_id).to_vec());
        txn.stage_delete(self.by_dependent.clone(), index_key(&edge.dependent, edge.row_id));
        txn.stage_delete(
            self.by_referenced.clone(),
            index_key(&edge.referenced, edge.row_id),
        );
        Ok(())
    }

    /// Whether an edge row is still live
    ///
    /// Used by the deletion engine to skip materialised edges that an inner
    /// recursion has already removed and published.
    pub fn row_exists(&self, row_id: u64) -> CatalogResult<bool> {
        Ok(self.rows.contains_key(&row_key(row_id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::registry::{PROC_CLASS_ID, RELATION_CLASS_ID, TYPE_CLASS_ID};
    use crate::txn::LockManager;

    fn setup() -> (StorageManager, DependStore, CatalogTxn) {
        let storage = StorageManager::in_memory();
        let store = DependStore::open(&storage).unwrap();
        let txn = CatalogTxn::new(Arc::new(LockManager::new()));
        (storage, store, txn)
    }

    #[test]
    fn test_insert_scan_round_trip_is_a_multiset() {
        let (_storage, store, mut txn) = setup();
        let view = ObjectAddress::whole(RELATION_CLASS_ID, 100);
        let func = ObjectAddress::whole(PROC_CLASS_ID, 200);
        let ty = ObjectAddress::whole(TYPE_CLASS_ID, 300);

        store
            .insert_many(&mut txn, &view, &[func, ty, func], DependencyType::Normal)
            .unwrap();
        txn.publish().unwrap();

        let edges = store.scan_outgoing(&mut txn, &view, false).unwrap();
        assert_eq!(edges.len(), 3);
        assert_eq!(
            edges.iter().filter(|e| e.referenced == func).count(),
            2,
            "duplicate references are preserved"
        );
        assert!(edges
            .iter()
            .all(|e| e.kind() == Some(DependencyType::Normal)));
        txn.commit().unwrap();
    }

    #[test]
    fn test_whole_object_scan_covers_sub_objects() {
        let (_storage, store, mut txn) = setup();
        let table = ObjectAddress::whole(RELATION_CLASS_ID, 100);
        let column = ObjectAddress::new(RELATION_CLASS_ID, 100, 2);
        let default = ObjectAddress::whole(crate::catalog::registry::ATTR_DEFAULT_CLASS_ID, 900);

        store
            .insert_many(&mut txn, &default, &[column], DependencyType::Auto)
            .unwrap();
        txn.publish().unwrap();

        // Whole-table target sees the column-level edge
        let incoming = store.scan_incoming(&mut txn, &table, false).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].dependent, default);

        // Exact column target sees it too, a different column does not
        assert_eq!(store.scan_incoming(&mut txn, &column, false).unwrap().len(), 1);
        let other_column = ObjectAddress::new(RELATION_CLASS_ID, 100, 3);
        assert!(store
            .scan_incoming(&mut txn, &other_column, false)
            .unwrap()
            .is_empty());
        txn.commit().unwrap();
    }

    #[test]
    fn test_deleted_edge_invisible_after_publish() {
        let (_storage, store, mut txn) = setup();
        let a = ObjectAddress::whole(PROC_CLASS_ID, 1);
        let b = ObjectAddress::whole(PROC_CLASS_ID, 2);

        store
            .insert_many(&mut txn, &a, &[b], DependencyType::Normal)
            .unwrap();
        txn.publish().unwrap();

        let edges = store.scan_outgoing(&mut txn, &a, true).unwrap();
        store.delete_edge(&mut txn, &edges[0]).unwrap();

        // Staged but not yet published: still visible
        assert_eq!(store.scan_outgoing(&mut txn, &a, false).unwrap().len(), 1);
        assert!(store.row_exists(edges[0].row_id).unwrap());

        txn.publish().unwrap();
        assert!(store.scan_outgoing(&mut txn, &a, false).unwrap().is_empty());
        assert!(store.scan_incoming(&mut txn, &b, false).unwrap().is_empty());
        assert!(!store.row_exists(edges[0].row_id).unwrap());
        txn.commit().unwrap();
    }

    #[test]
    fn test_pin_edges_have_zeroed_dependent() {
        let (_storage, store, mut txn) = setup();
        let int_type = ObjectAddress::whole(TYPE_CLASS_ID, 11);

        store.record_pin(&mut txn, &int_type).unwrap();
        txn.publish().unwrap();

        let edges = store.scan_incoming(&mut txn, &int_type, false).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].dependent, ObjectAddress::new(0, 0, 0));
        assert_eq!(edges[0].kind(), Some(DependencyType::Pin));
        txn.commit().unwrap();
    }

    #[test]
    fn test_unknown_tag_surfaces_as_none() {
        assert_eq!(DependencyType::from_tag('x'), None);
        assert_eq!(DependencyType::from_tag('n'), Some(DependencyType::Normal));
    }
}
