// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Object addresses and expandable address collections
//!
//! An ObjectAddress names any catalog object: the class id of the system
//! table it lives in, its object id, and a sub-object index (column number
//! for relation columns, 0 for the whole object). ObjectAddresses is the
//! workhorse collection the dependency engine accumulates into.

use super::registry::{self, ObjectClass};
use serde::{Deserialize, Serialize};

/// Identity of a catalog object or sub-object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAddress {
    /// Class id of the system table holding the object
    pub class_id: u32,
    /// Object id within the class
    pub object_id: u32,
    /// Sub-object index; 0 means the whole object
    pub sub_id: i32,
}

impl ObjectAddress {
    pub fn new(class_id: u32, object_id: u32, sub_id: i32) -> Self {
        Self {
            class_id,
            object_id,
            sub_id,
        }
    }

    /// Address of a whole object (sub_id 0)
    pub fn whole(class_id: u32, object_id: u32) -> Self {
        Self::new(class_id, object_id, 0)
    }

    pub fn is_whole_object(&self) -> bool {
        self.sub_id == 0
    }

    /// Sort key ordering sub_id as unsigned so 0 (whole object) sorts
    /// before every positive sub-object index
    fn sort_key(&self) -> (u32, u32, u32) {
        (self.class_id, self.object_id, self.sub_id as u32)
    }
}

/// Expandable, deduplicating collection of object addresses
///
/// Insertion order is preserved except across `eliminate_duplicates`.
#[derive(Debug, Clone, Default)]
pub struct ObjectAddresses {
    refs: Vec<ObjectAddress>,
}

impl ObjectAddresses {
    pub fn new() -> Self {
        Self {
            refs: Vec::with_capacity(32),
        }
    }

    /// Append an address exactly as given
    pub fn add_exact(&mut self, addr: ObjectAddress) {
        self.refs.push(addr);
    }

    /// Append an address specified by object class rather than class id
    pub fn add_object(&mut self, class: ObjectClass, object_id: u32, sub_id: i32) {
        self.refs.push(ObjectAddress {
            class_id: registry::class_id(class),
            object_id,
            sub_id,
        });
    }

    /// Membership test with sub-object subsumption: a stored whole-object
    /// entry (sub_id 0) covers every sub-object of that object.
    pub fn contains(&self, addr: &ObjectAddress) -> bool {
        self.refs.iter().any(|t| {
            t.class_id == addr.class_id
                && t.object_id == addr.object_id
                && (t.sub_id == addr.sub_id || t.sub_id == 0)
        })
    }

    /// Sort and drop duplicates
    ///
    /// A whole-object entry followed by a sub-object entry of the same
    /// object collapses into the sub-object entry alone; referencing both
    /// table t and column t.c only needs the column reference.
    pub fn eliminate_duplicates(&mut self) {
        if self.refs.len() <= 1 {
            return;
        }

        self.refs.sort_by_key(|a| a.sort_key());

        let mut deduped: Vec<ObjectAddress> = Vec::with_capacity(self.refs.len());
        for addr in std::mem::take(&mut self.refs) {
            if let Some(prior) = deduped.last_mut() {
                if prior.class_id == addr.class_id && prior.object_id == addr.object_id {
                    if prior.sub_id == addr.sub_id {
                        continue;
                    }
                    // The whole-object entry sorts first; absorb it into
                    // the more specific sub-object entry.
                    if prior.sub_id == 0 {
                        prior.sub_id = addr.sub_id;
                        continue;
                    }
                }
            }
            deduped.push(addr);
        }
        self.refs = deduped;
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ObjectAddress> {
        self.refs.iter()
    }

    pub fn as_slice(&self) -> &[ObjectAddress] {
        &self.refs
    }
}

impl FromIterator<ObjectAddress> for ObjectAddresses {
    fn from_iter<I: IntoIterator<Item = ObjectAddress>>(iter: I) -> Self {
        Self {
            refs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(class_id: u32, object_id: u32, sub_id: i32) -> ObjectAddress {
        ObjectAddress::new(class_id, object_id, sub_id)
    }

    #[test]
    fn test_whole_object_subsumes_sub_objects() {
        let mut set = ObjectAddresses::new();
        set.add_exact(addr(1, 10, 0));

        assert!(set.contains(&addr(1, 10, 0)));
        assert!(set.contains(&addr(1, 10, 3)));
        assert!(!set.contains(&addr(1, 11, 0)));
        assert!(!set.contains(&addr(2, 10, 0)));
    }

    #[test]
    fn test_sub_object_does_not_subsume_whole() {
        let mut set = ObjectAddresses::new();
        set.add_exact(addr(1, 10, 3));

        assert!(set.contains(&addr(1, 10, 3)));
        assert!(!set.contains(&addr(1, 10, 0)));
        assert!(!set.contains(&addr(1, 10, 2)));
    }

    #[test]
    fn test_eliminate_duplicates_folds_whole_into_partial() {
        let mut set = ObjectAddresses::new();
        set.add_exact(addr(1, 10, 2));
        set.add_exact(addr(1, 10, 0));
        set.add_exact(addr(1, 10, 2));

        set.eliminate_duplicates();
        assert_eq!(set.as_slice(), &[addr(1, 10, 2)]);
    }

    #[test]
    fn test_eliminate_duplicates_keeps_distinct_partials() {
        let mut set = ObjectAddresses::new();
        set.add_exact(addr(1, 10, 3));
        set.add_exact(addr(1, 10, 0));
        set.add_exact(addr(1, 10, 1));
        set.add_exact(addr(2, 5, 0));

        set.eliminate_duplicates();
        assert_eq!(
            set.as_slice(),
            &[addr(1, 10, 1), addr(1, 10, 3), addr(2, 5, 0)]
        );
    }

    #[test]
    fn test_sub_id_sorts_as_unsigned() {
        let mut set = ObjectAddresses::new();
        set.add_exact(addr(1, 10, 7));
        set.add_exact(addr(1, 10, 0));
        set.eliminate_duplicates();

        // The whole-object entry sorted first and was absorbed
        assert_eq!(set.as_slice(), &[addr(1, 10, 7)]);
    }
}
