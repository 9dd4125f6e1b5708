// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Row-level lock manager for catalog edge rows
//!
//! Deletion-path scans lock every edge row they yield, the equivalent of
//! scanning FOR UPDATE. Locks are held until the owning transaction commits
//! or aborts, which serialises concurrent drops that touch the same edges.

use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;

/// Blocking row lock table keyed by edge row id
pub struct LockManager {
    locked: Mutex<HashSet<u64>>,
    released: Condvar,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            locked: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    /// Acquire a write lock on a row, blocking until it is free
    ///
    /// Callers must not re-acquire a row they already hold; the transaction
    /// tracks its held set and skips duplicates.
    pub fn lock_row(&self, row_id: u64) {
        let mut locked = self.locked.lock();
        while locked.contains(&row_id) {
            self.released.wait(&mut locked);
        }
        locked.insert(row_id);
    }

    /// Release a set of rows and wake waiting transactions
    pub fn unlock_rows<I: IntoIterator<Item = u64>>(&self, rows: I) {
        let mut locked = self.locked.lock();
        for row_id in rows {
            locked.remove(&row_id);
        }
        self.released.notify_all();
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lock_blocks_until_released() {
        let mgr = Arc::new(LockManager::new());
        mgr.lock_row(7);

        let contender = {
            let mgr = mgr.clone();
            std::thread::spawn(move || {
                mgr.lock_row(7);
                mgr.unlock_rows([7]);
            })
        };

        // Give the contender a moment to reach the wait
        std::thread::sleep(std::time::Duration::from_millis(20));
        mgr.unlock_rows([7]);
        contender.join().unwrap();
    }
}
