// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog transaction: buffered mutations, the publish barrier, and undo
//!
//! Catalog mutations are staged on the transaction and only hit the storage
//! trees when `publish()` runs. Scans read tree state directly, so a staged
//! mutation is invisible until the next publish and visible to every scan
//! after it. The deletion engine leans on this: severed edge rows become
//! invisible before it recurses, which is what terminates traversal of
//! cyclic dependency graphs.
//!
//! Every published write records a before-image. `abort()` replays the
//! images in reverse, restoring the catalog to its state at `begin()`;
//! `commit()` discards them.

use super::locks::LockManager;
use crate::storage::traits::StorageTree;
use crate::storage::types::StorageResult;
use std::collections::HashSet;
use std::sync::Arc;

enum PendingOp {
    Put {
        tree: Arc<dyn StorageTree>,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        tree: Arc<dyn StorageTree>,
        key: Vec<u8>,
    },
}

struct UndoEntry {
    tree: Arc<dyn StorageTree>,
    key: Vec<u8>,
    prior: Option<Vec<u8>>,
}

/// A single catalog transaction
///
/// Not Send on purpose conceptually: the engine is single-threaded
/// cooperative within one transaction. Row locks taken by deletion scans
/// are held here and released at commit/abort.
pub struct CatalogTxn {
    lock_mgr: Arc<LockManager>,
    pending: Vec<PendingOp>,
    undo: Vec<UndoEntry>,
    locked_rows: HashSet<u64>,
    notices: Vec<String>,
    finished: bool,
}

impl CatalogTxn {
    pub(crate) fn new(lock_mgr: Arc<LockManager>) -> Self {
        Self {
            lock_mgr,
            pending: Vec::new(),
            undo: Vec::new(),
            locked_rows: HashSet::new(),
            notices: Vec::new(),
            finished: false,
        }
    }

    /// Stage an insert/overwrite of `key` in `tree`
    pub(crate) fn stage_put(&mut self, tree: Arc<dyn StorageTree>, key: Vec<u8>, value: Vec<u8>) {
        self.pending.push(PendingOp::Put { tree, key, value });
    }

    /// Stage a removal of `key` from `tree`
    pub(crate) fn stage_delete(&mut self, tree: Arc<dyn StorageTree>, key: Vec<u8>) {
        self.pending.push(PendingOp::Delete { tree, key });
    }

    /// Visibility barrier: apply all staged mutations to the trees
    ///
    /// After this returns, subsequent scans observe the mutations. Each
    /// applied write records its before-image for `abort()`.
    pub fn publish(&mut self) -> StorageResult<()> {
        for op in self.pending.drain(..) {
            match op {
                PendingOp::Put { tree, key, value } => {
                    let prior = tree.get(&key)?;
                    tree.insert(&key, &value)?;
                    self.undo.push(UndoEntry { tree, key, prior });
                }
                PendingOp::Delete { tree, key } => {
                    let prior = tree.get(&key)?;
                    tree.remove(&key)?;
                    self.undo.push(UndoEntry { tree, key, prior });
                }
            }
        }
        Ok(())
    }

    /// Lock an edge row for the remainder of the transaction
    ///
    /// Re-acquiring a row this transaction already holds is a no-op.
    pub(crate) fn lock_row(&mut self, row_id: u64) {
        if self.locked_rows.insert(row_id) {
            self.lock_mgr.lock_row(row_id);
        }
    }

    /// Record a NOTICE-level diagnostic for the embedding caller
    pub(crate) fn push_notice(&mut self, message: String) {
        self.notices.push(message);
    }

    /// NOTICE-level diagnostics emitted so far in this transaction
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Commit: publish staged mutations, drop undo, release row locks
    pub fn commit(mut self) -> StorageResult<()> {
        self.publish()?;
        self.undo.clear();
        self.release_locks();
        self.finished = true;
        Ok(())
    }

    /// Abort: discard staged mutations, restore all published before-images
    pub fn abort(mut self) -> StorageResult<()> {
        self.rollback()?;
        self.finished = true;
        Ok(())
    }

    fn rollback(&mut self) -> StorageResult<()> {
        self.pending.clear();
        while let Some(entry) = self.undo.pop() {
            match entry.prior {
                Some(value) => entry.tree.insert(&entry.key, &value)?,
                None => entry.tree.remove(&entry.key)?,
            }
        }
        self.release_locks();
        Ok(())
    }

    fn release_locks(&mut self) {
        if !self.locked_rows.is_empty() {
            self.lock_mgr.unlock_rows(self.locked_rows.drain());
        }
    }
}

impl Drop for CatalogTxn {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.rollback() {
                log::warn!("Failed to roll back abandoned catalog transaction: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageManager;

    fn tree(storage: &StorageManager) -> Arc<dyn StorageTree> {
        storage.tree("t").unwrap()
    }

    #[test]
    fn test_staged_mutation_invisible_until_publish() {
        let storage = StorageManager::in_memory();
        let locks = Arc::new(LockManager::new());
        let mut txn = CatalogTxn::new(locks);

        txn.stage_put(tree(&storage), b"k".to_vec(), b"v".to_vec());
        assert_eq!(tree(&storage).get(b"k").unwrap(), None);

        txn.publish().unwrap();
        assert_eq!(tree(&storage).get(b"k").unwrap(), Some(b"v".to_vec()));
        txn.commit().unwrap();
    }

    #[test]
    fn test_abort_restores_before_images() {
        let storage = StorageManager::in_memory();
        let locks = Arc::new(LockManager::new());
        tree(&storage).insert(b"a", b"old").unwrap();

        let mut txn = CatalogTxn::new(locks);
        txn.stage_put(tree(&storage), b"a".to_vec(), b"new".to_vec());
        txn.stage_put(tree(&storage), b"b".to_vec(), b"fresh".to_vec());
        txn.stage_delete(tree(&storage), b"a".to_vec());
        txn.publish().unwrap();

        assert_eq!(tree(&storage).get(b"a").unwrap(), None);
        txn.abort().unwrap();

        assert_eq!(tree(&storage).get(b"a").unwrap(), Some(b"old".to_vec()));
        assert_eq!(tree(&storage).get(b"b").unwrap(), None);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let storage = StorageManager::in_memory();
        let locks = Arc::new(LockManager::new());

        {
            let mut txn = CatalogTxn::new(locks);
            txn.stage_put(tree(&storage), b"k".to_vec(), b"v".to_vec());
            txn.publish().unwrap();
        }

        assert_eq!(tree(&storage).get(b"k").unwrap(), None);
    }
}
