// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog object metadata storage
//!
//! One row per catalog object in the `sys_object` tree, keyed by
//! (class id, object id). The record carries exactly the metadata the
//! descriptor and the destructors need. Comments (`sys_description`) and
//! shared dependency records (`sys_shdepend`) live here too; the deletion
//! engine clears both as the final step of dropping an object.

use super::error::{CatalogError, CatalogResult};
use super::registry::{self, ObjectClass};
use crate::catalog::address::ObjectAddress;
use crate::storage::traits::StorageTree;
use crate::storage::StorageManager;
use crate::txn::CatalogTxn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const OBJECT_TREE: &str = "sys_object";
const DESCRIPTION_TREE: &str = "sys_description";
const SHARED_DEPEND_TREE: &str = "sys_shdepend";

/// Kind of a relation, as stored in its catalog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    Table,
    Index,
    Sequence,
    View,
    CompositeType,
    Toast,
}

/// Column metadata of a relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub attno: i32,
    pub name: String,
    pub dropped: bool,
}

impl ColumnMeta {
    pub fn new(attno: i32, name: impl Into<String>) -> Self {
        Self {
            attno,
            name: name.into(),
            dropped: false,
        }
    }
}

/// Per-class catalog metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogRecord {
    Relation {
        name: String,
        namespace: u32,
        kind: RelationKind,
        columns: Vec<ColumnMeta>,
    },
    Proc {
        name: String,
    },
    Type {
        name: String,
    },
    Cast {
        source: u32,
        target: u32,
    },
    Constraint {
        name: String,
        relation: Option<u32>,
    },
    Conversion {
        name: String,
    },
    AttrDefault {
        relation: u32,
        column: i32,
    },
    Language {
        name: String,
    },
    Operator {
        name: String,
    },
    OpClass {
        name: String,
        namespace: u32,
        access_method: String,
    },
    Rewrite {
        name: String,
        relation: u32,
    },
    Trigger {
        name: String,
        relation: u32,
    },
    Schema {
        name: String,
    },
    Role {
        name: String,
    },
    Database {
        name: String,
    },
    Tablespace {
        name: String,
    },
    Filespace {
        name: String,
    },
    Filesystem {
        name: String,
    },
    ForeignDataWrapper {
        name: String,
    },
    ForeignServer {
        name: String,
    },
    UserMapping {
        user: Option<u32>,
    },
    Protocol {
        name: String,
    },
    Compression {
        name: String,
    },
}

impl CatalogRecord {
    /// The object class this record belongs to
    pub fn object_class(&self) -> ObjectClass {
        match self {
            CatalogRecord::Relation { .. } => ObjectClass::Class,
            CatalogRecord::Proc { .. } => ObjectClass::Proc,
            CatalogRecord::Type { .. } => ObjectClass::Type,
            CatalogRecord::Cast { .. } => ObjectClass::Cast,
            CatalogRecord::Constraint { .. } => ObjectClass::Constraint,
            CatalogRecord::Conversion { .. } => ObjectClass::Conversion,
            CatalogRecord::AttrDefault { .. } => ObjectClass::Default,
            CatalogRecord::Language { .. } => ObjectClass::Language,
            CatalogRecord::Operator { .. } => ObjectClass::Operator,
            CatalogRecord::OpClass { .. } => ObjectClass::OpClass,
            CatalogRecord::Rewrite { .. } => ObjectClass::Rewrite,
            CatalogRecord::Trigger { .. } => ObjectClass::Trigger,
            CatalogRecord::Schema { .. } => ObjectClass::Schema,
            CatalogRecord::Role { .. } => ObjectClass::Role,
            CatalogRecord::Database { .. } => ObjectClass::Database,
            CatalogRecord::Tablespace { .. } => ObjectClass::Tablespace,
            CatalogRecord::Filespace { .. } => ObjectClass::Filespace,
            CatalogRecord::Filesystem { .. } => ObjectClass::Filesystem,
            CatalogRecord::ForeignDataWrapper { .. } => ObjectClass::Fdw,
            CatalogRecord::ForeignServer { .. } => ObjectClass::ForeignServer,
            CatalogRecord::UserMapping { .. } => ObjectClass::UserMapping,
            CatalogRecord::Protocol { .. } => ObjectClass::ExtProtocol,
            CatalogRecord::Compression { .. } => ObjectClass::Compression,
        }
    }
}

/// A stored object row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRow {
    pub record: CatalogRecord,
    pub created_at: DateTime<Utc>,
}

impl ObjectRow {
    fn new(record: CatalogRecord) -> Self {
        Self {
            record,
            created_at: Utc::now(),
        }
    }
}

fn object_key(class_id: u32, object_id: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(8);
    key.extend_from_slice(&class_id.to_be_bytes());
    key.extend_from_slice(&object_id.to_be_bytes());
    key
}

/// Store of catalog object metadata rows
pub struct ObjectStore {
    tree: Arc<dyn StorageTree>,
}

impl ObjectStore {
    pub fn open(storage: &StorageManager) -> CatalogResult<Self> {
        Ok(Self {
            tree: storage.tree(OBJECT_TREE)?,
        })
    }

    /// Stage the definition of a new catalog object
    ///
    /// The class id is derived from the record variant. Returns the
    /// whole-object address of the new object.
    pub fn define(
        &self,
        txn: &mut CatalogTxn,
        object_id: u32,
        record: CatalogRecord,
    ) -> CatalogResult<ObjectAddress> {
        let class_id = registry::class_id(record.object_class());
        let row = ObjectRow::new(record);
        let value = bincode::serialize(&row)?;
        txn.stage_put(self.tree.clone(), object_key(class_id, object_id), value);
        Ok(ObjectAddress::whole(class_id, object_id))
    }

    pub fn get(&self, class_id: u32, object_id: u32) -> CatalogResult<Option<ObjectRow>> {
        match self.tree.get(&object_key(class_id, object_id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn exists(&self, class_id: u32, object_id: u32) -> CatalogResult<bool> {
        Ok(self.tree.contains_key(&object_key(class_id, object_id))?)
    }

    /// Stage removal of an object's metadata row
    pub fn remove(&self, txn: &mut CatalogTxn, class_id: u32, object_id: u32) -> CatalogResult<()> {
        txn.stage_delete(self.tree.clone(), object_key(class_id, object_id));
        Ok(())
    }

    /// Highest object id present in the store, across all classes
    ///
    /// Used at open to continue id assignment past persisted objects.
    pub(crate) fn max_object_id(&self) -> CatalogResult<u32> {
        let mut max_id = 0u32;
        for entry in self.tree.iter()? {
            let (key, _) = entry?;
            if key.len() == 8 {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&key[4..8]);
                max_id = max_id.max(u32::from_be_bytes(buf));
            }
        }
        Ok(max_id)
    }

    /// Kind of a relation, for the destructor split and descriptions
    pub fn relation_kind(&self, rel_id: u32) -> CatalogResult<RelationKind> {
        match self.get(registry::RELATION_CLASS_ID, rel_id)? {
            Some(ObjectRow {
                record: CatalogRecord::Relation { kind, .. },
                ..
            }) => Ok(kind),
            _ => Err(CatalogError::CacheLookupFailed {
                kind: "relation",
                id: rel_id,
            }),
        }
    }

    /// Name of a relation column
    pub fn attribute_name(&self, rel_id: u32, attno: i32) -> CatalogResult<String> {
        let row = self.get(registry::RELATION_CLASS_ID, rel_id)?;
        let columns = match row {
            Some(ObjectRow {
                record: CatalogRecord::Relation { columns, .. },
                ..
            }) => columns,
            _ => {
                return Err(CatalogError::CacheLookupFailed {
                    kind: "relation",
                    id: rel_id,
                })
            }
        };
        columns
            .iter()
            .find(|c| c.attno == attno && !c.dropped)
            .map(|c| c.name.clone())
            .ok_or(CatalogError::CacheLookupFailed {
                kind: "attribute",
                id: attno as u32,
            })
    }

    /// Stage the column-drop destructor: mark the column dropped
    pub fn remove_attribute(
        &self,
        txn: &mut CatalogTxn,
        rel_id: u32,
        attno: i32,
    ) -> CatalogResult<()> {
        let mut row = self
            .get(registry::RELATION_CLASS_ID, rel_id)?
            .ok_or(CatalogError::CacheLookupFailed {
                kind: "relation",
                id: rel_id,
            })?;

        let columns = match &mut row.record {
            CatalogRecord::Relation { columns, .. } => columns,
            _ => {
                return Err(CatalogError::CacheLookupFailed {
                    kind: "relation",
                    id: rel_id,
                })
            }
        };
        let column = columns
            .iter_mut()
            .find(|c| c.attno == attno && !c.dropped)
            .ok_or(CatalogError::CacheLookupFailed {
                kind: "attribute",
                id: attno as u32,
            })?;
        column.dropped = true;

        let value = bincode::serialize(&row)?;
        txn.stage_put(
            self.tree.clone(),
            object_key(registry::RELATION_CLASS_ID, rel_id),
            value,
        );
        Ok(())
    }
}

fn description_key(addr: &ObjectAddress) -> Vec<u8> {
    let mut key = object_key(addr.class_id, addr.object_id);
    key.extend_from_slice(&(addr.sub_id as u32).to_be_bytes());
    key
}

/// Store of object comments
pub struct CommentStore {
    tree: Arc<dyn StorageTree>,
}

impl CommentStore {
    pub fn open(storage: &StorageManager) -> CatalogResult<Self> {
        Ok(Self {
            tree: storage.tree(DESCRIPTION_TREE)?,
        })
    }

    pub fn set_comment(
        &self,
        txn: &mut CatalogTxn,
        addr: &ObjectAddress,
        text: &str,
    ) -> CatalogResult<()> {
        let value = bincode::serialize(text)?;
        txn.stage_put(self.tree.clone(), description_key(addr), value);
        Ok(())
    }

    pub fn get_comment(&self, addr: &ObjectAddress) -> CatalogResult<Option<String>> {
        match self.tree.get(&description_key(addr))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stage removal of comments for an object
    ///
    /// A whole-object address clears the comments of its sub-objects too.
    pub fn delete_comments(&self, txn: &mut CatalogTxn, addr: &ObjectAddress) -> CatalogResult<()> {
        if addr.sub_id != 0 {
            txn.stage_delete(self.tree.clone(), description_key(addr));
            return Ok(());
        }
        let prefix = object_key(addr.class_id, addr.object_id);
        for entry in self.tree.scan_prefix(&prefix)? {
            let (key, _) = entry?;
            txn.stage_delete(self.tree.clone(), key);
        }
        Ok(())
    }
}

/// How a shared (cluster-wide) object is referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharedDependencyKind {
    Owner,
    Acl,
}

/// Store of references from catalog objects to shared objects (roles)
pub struct SharedDependStore {
    tree: Arc<dyn StorageTree>,
}

impl SharedDependStore {
    pub fn open(storage: &StorageManager) -> CatalogResult<Self> {
        Ok(Self {
            tree: storage.tree(SHARED_DEPEND_TREE)?,
        })
    }

    fn key(class_id: u32, object_id: u32, role_id: u32, kind: SharedDependencyKind) -> Vec<u8> {
        let mut key = object_key(class_id, object_id);
        key.extend_from_slice(&role_id.to_be_bytes());
        key.push(match kind {
            SharedDependencyKind::Owner => b'o',
            SharedDependencyKind::Acl => b'a',
        });
        key
    }

    pub fn record_shared(
        &self,
        txn: &mut CatalogTxn,
        class_id: u32,
        object_id: u32,
        role_id: u32,
        kind: SharedDependencyKind,
    ) -> CatalogResult<()> {
        txn.stage_put(
            self.tree.clone(),
            Self::key(class_id, object_id, role_id, kind),
            Vec::new(),
        );
        Ok(())
    }

    /// Stage removal of every shared-dependency record of one object
    pub fn delete_for_object(
        &self,
        txn: &mut CatalogTxn,
        class_id: u32,
        object_id: u32,
    ) -> CatalogResult<()> {
        let prefix = object_key(class_id, object_id);
        for entry in self.tree.scan_prefix(&prefix)? {
            let (key, _) = entry?;
            txn.stage_delete(self.tree.clone(), key);
        }
        Ok(())
    }

    /// Count of shared-dependency records for one object
    pub fn count_for_object(&self, class_id: u32, object_id: u32) -> CatalogResult<usize> {
        let prefix = object_key(class_id, object_id);
        let mut n = 0;
        for entry in self.tree.scan_prefix(&prefix)? {
            entry?;
            n += 1;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::LockManager;

    fn setup() -> (StorageManager, ObjectStore, CatalogTxn) {
        let storage = StorageManager::in_memory();
        let store = ObjectStore::open(&storage).unwrap();
        let txn = CatalogTxn::new(Arc::new(LockManager::new()));
        (storage, store, txn)
    }

    #[test]
    fn test_define_is_invisible_until_publish() {
        let (_storage, store, mut txn) = setup();

        let addr = store
            .define(
                &mut txn,
                5001,
                CatalogRecord::Type {
                    name: "point".to_string(),
                },
            )
            .unwrap();

        assert!(!store.exists(addr.class_id, addr.object_id).unwrap());
        txn.publish().unwrap();
        assert!(store.exists(addr.class_id, addr.object_id).unwrap());
        txn.commit().unwrap();
    }

    #[test]
    fn test_remove_attribute_marks_dropped() {
        let (_storage, store, mut txn) = setup();

        store
            .define(
                &mut txn,
                5002,
                CatalogRecord::Relation {
                    name: "orders".to_string(),
                    namespace: 1,
                    kind: RelationKind::Table,
                    columns: vec![ColumnMeta::new(1, "id"), ColumnMeta::new(2, "total")],
                },
            )
            .unwrap();
        txn.publish().unwrap();

        assert_eq!(store.attribute_name(5002, 2).unwrap(), "total");

        store.remove_attribute(&mut txn, 5002, 2).unwrap();
        txn.publish().unwrap();

        assert!(matches!(
            store.attribute_name(5002, 2),
            Err(CatalogError::CacheLookupFailed {
                kind: "attribute",
                ..
            })
        ));
        // The other column is untouched
        assert_eq!(store.attribute_name(5002, 1).unwrap(), "id");
        txn.commit().unwrap();
    }

    #[test]
    fn test_whole_object_comment_delete_covers_columns() {
        let storage = StorageManager::in_memory();
        let comments = CommentStore::open(&storage).unwrap();
        let mut txn = CatalogTxn::new(Arc::new(LockManager::new()));

        let table = ObjectAddress::whole(registry::RELATION_CLASS_ID, 77);
        let column = ObjectAddress::new(registry::RELATION_CLASS_ID, 77, 2);
        comments.set_comment(&mut txn, &table, "orders table").unwrap();
        comments.set_comment(&mut txn, &column, "total amount").unwrap();
        txn.publish().unwrap();

        comments.delete_comments(&mut txn, &table).unwrap();
        txn.publish().unwrap();

        assert_eq!(comments.get_comment(&table).unwrap(), None);
        assert_eq!(comments.get_comment(&column).unwrap(), None);
        txn.commit().unwrap();
    }
}
