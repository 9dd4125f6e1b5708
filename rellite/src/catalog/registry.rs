// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Object class registry and destructor dispatch
//!
//! Every droppable catalog object belongs to exactly one object class, and
//! every class maps to the class id of the system table that stores it.
//! Both directions of the mapping are exhaustive matches so that adding a
//! class without wiring it up fails at compile time.

use super::address::ObjectAddress;
use super::error::{CatalogError, CatalogResult};
use super::objects::{ObjectStore, RelationKind};
use crate::txn::CatalogTxn;
use serde::{Deserialize, Serialize};

/// Closed set of catalog object classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    Class,
    Proc,
    Type,
    Cast,
    Constraint,
    Conversion,
    Default,
    Language,
    Operator,
    OpClass,
    Rewrite,
    Trigger,
    Schema,
    Role,
    Database,
    Tablespace,
    Filespace,
    Filesystem,
    Fdw,
    ForeignServer,
    UserMapping,
    ExtProtocol,
    Compression,
}

// Class ids of the system tables, one per object class.
pub const RELATION_CLASS_ID: u32 = 3101;
pub const PROC_CLASS_ID: u32 = 3102;
pub const TYPE_CLASS_ID: u32 = 3103;
pub const CAST_CLASS_ID: u32 = 3104;
pub const CONSTRAINT_CLASS_ID: u32 = 3105;
pub const CONVERSION_CLASS_ID: u32 = 3106;
pub const ATTR_DEFAULT_CLASS_ID: u32 = 3107;
pub const LANGUAGE_CLASS_ID: u32 = 3108;
pub const OPERATOR_CLASS_ID: u32 = 3109;
pub const OPCLASS_CLASS_ID: u32 = 3110;
pub const REWRITE_CLASS_ID: u32 = 3111;
pub const TRIGGER_CLASS_ID: u32 = 3112;
pub const SCHEMA_CLASS_ID: u32 = 3113;
pub const ROLE_CLASS_ID: u32 = 3114;
pub const DATABASE_CLASS_ID: u32 = 3115;
pub const TABLESPACE_CLASS_ID: u32 = 3116;
pub const FILESPACE_CLASS_ID: u32 = 3117;
pub const FILESYSTEM_CLASS_ID: u32 = 3118;
pub const FDW_CLASS_ID: u32 = 3119;
pub const FOREIGN_SERVER_CLASS_ID: u32 = 3120;
pub const USER_MAPPING_CLASS_ID: u32 = 3121;
pub const PROTOCOL_CLASS_ID: u32 = 3122;
pub const COMPRESSION_CLASS_ID: u32 = 3123;

/// Class id of the system table storing objects of `class`
pub fn class_id(class: ObjectClass) -> u32 {
    match class {
        ObjectClass::Class => RELATION_CLASS_ID,
        ObjectClass::Proc => PROC_CLASS_ID,
        ObjectClass::Type => TYPE_CLASS_ID,
        ObjectClass::Cast => CAST_CLASS_ID,
        ObjectClass::Constraint => CONSTRAINT_CLASS_ID,
        ObjectClass::Conversion => CONVERSION_CLASS_ID,
        ObjectClass::Default => ATTR_DEFAULT_CLASS_ID,
        ObjectClass::Language => LANGUAGE_CLASS_ID,
        ObjectClass::Operator => OPERATOR_CLASS_ID,
        ObjectClass::OpClass => OPCLASS_CLASS_ID,
        ObjectClass::Rewrite => REWRITE_CLASS_ID,
        ObjectClass::Trigger => TRIGGER_CLASS_ID,
        ObjectClass::Schema => SCHEMA_CLASS_ID,
        ObjectClass::Role => ROLE_CLASS_ID,
        ObjectClass::Database => DATABASE_CLASS_ID,
        ObjectClass::Tablespace => TABLESPACE_CLASS_ID,
        ObjectClass::Filespace => FILESPACE_CLASS_ID,
        ObjectClass::Filesystem => FILESYSTEM_CLASS_ID,
        ObjectClass::Fdw => FDW_CLASS_ID,
        ObjectClass::ForeignServer => FOREIGN_SERVER_CLASS_ID,
        ObjectClass::UserMapping => USER_MAPPING_CLASS_ID,
        ObjectClass::ExtProtocol => PROTOCOL_CLASS_ID,
        ObjectClass::Compression => COMPRESSION_CLASS_ID,
    }
}

/// Reverse mapping from a class id to the object class
pub fn object_class_for_id(id: u32) -> CatalogResult<ObjectClass> {
    match id {
        RELATION_CLASS_ID => Ok(ObjectClass::Class),
        PROC_CLASS_ID => Ok(ObjectClass::Proc),
        TYPE_CLASS_ID => Ok(ObjectClass::Type),
        CAST_CLASS_ID => Ok(ObjectClass::Cast),
        CONSTRAINT_CLASS_ID => Ok(ObjectClass::Constraint),
        CONVERSION_CLASS_ID => Ok(ObjectClass::Conversion),
        ATTR_DEFAULT_CLASS_ID => Ok(ObjectClass::Default),
        LANGUAGE_CLASS_ID => Ok(ObjectClass::Language),
        OPERATOR_CLASS_ID => Ok(ObjectClass::Operator),
        OPCLASS_CLASS_ID => Ok(ObjectClass::OpClass),
        REWRITE_CLASS_ID => Ok(ObjectClass::Rewrite),
        TRIGGER_CLASS_ID => Ok(ObjectClass::Trigger),
        SCHEMA_CLASS_ID => Ok(ObjectClass::Schema),
        ROLE_CLASS_ID => Ok(ObjectClass::Role),
        DATABASE_CLASS_ID => Ok(ObjectClass::Database),
        TABLESPACE_CLASS_ID => Ok(ObjectClass::Tablespace),
        FILESPACE_CLASS_ID => Ok(ObjectClass::Filespace),
        FILESYSTEM_CLASS_ID => Ok(ObjectClass::Filesystem),
        FDW_CLASS_ID => Ok(ObjectClass::Fdw),
        FOREIGN_SERVER_CLASS_ID => Ok(ObjectClass::ForeignServer),
        USER_MAPPING_CLASS_ID => Ok(ObjectClass::UserMapping),
        PROTOCOL_CLASS_ID => Ok(ObjectClass::ExtProtocol),
        COMPRESSION_CLASS_ID => Ok(ObjectClass::Compression),
        other => Err(CatalogError::UnrecognizedObjectClass(other)),
    }
}

/// Object class of an address
pub fn object_class(addr: &ObjectAddress) -> CatalogResult<ObjectClass> {
    let class = object_class_for_id(addr.class_id)?;
    // Only relations have sub-objects (columns)
    debug_assert!(class == ObjectClass::Class || addr.sub_id == 0);
    Ok(class)
}

/// Invoke the per-class destructor for one object
///
/// For relations the destructor splits three ways: index drop, column drop
/// (sub_id != 0), or heap drop with its catalog entries. Roles, databases
/// and tablespaces are dropped through dedicated commands and must never
/// reach this table; they fall through to the unrecognized-class error.
pub(crate) fn do_deletion(
    objects: &ObjectStore,
    txn: &mut CatalogTxn,
    object: &ObjectAddress,
) -> CatalogResult<()> {
    match object_class(object)? {
        ObjectClass::Class => {
            let kind = objects.relation_kind(object.object_id)?;
            if kind == RelationKind::Index {
                debug_assert!(object.sub_id == 0);
                objects.remove(txn, object.class_id, object.object_id)?;
            } else if object.sub_id != 0 {
                objects.remove_attribute(txn, object.object_id, object.sub_id)?;
            } else {
                objects.remove(txn, object.class_id, object.object_id)?;
            }
            Ok(())
        }

        ObjectClass::Proc
        | ObjectClass::Type
        | ObjectClass::Cast
        | ObjectClass::Constraint
        | ObjectClass::Conversion
        | ObjectClass::Default
        | ObjectClass::Language
        | ObjectClass::Operator
        | ObjectClass::OpClass
        | ObjectClass::Rewrite
        | ObjectClass::Trigger
        | ObjectClass::Schema
        | ObjectClass::Filespace
        | ObjectClass::Filesystem
        | ObjectClass::Fdw
        | ObjectClass::ForeignServer
        | ObjectClass::UserMapping
        | ObjectClass::ExtProtocol => objects.remove(txn, object.class_id, object.object_id),

        // Dropped through dedicated commands, never via the dependency
        // engine.
        ObjectClass::Role | ObjectClass::Database | ObjectClass::Tablespace => {
            Err(CatalogError::UnrecognizedObjectClass(object.class_id))
        }

        ObjectClass::Compression => Err(CatalogError::Unsupported(
            "dropping compression codec objects".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CLASSES: [ObjectClass; 23] = [
        ObjectClass::Class,
        ObjectClass::Proc,
        ObjectClass::Type,
        ObjectClass::Cast,
        ObjectClass::Constraint,
        ObjectClass::Conversion,
        ObjectClass::Default,
        ObjectClass::Language,
        ObjectClass::Operator,
        ObjectClass::OpClass,
        ObjectClass::Rewrite,
        ObjectClass::Trigger,
        ObjectClass::Schema,
        ObjectClass::Role,
        ObjectClass::Database,
        ObjectClass::Tablespace,
        ObjectClass::Filespace,
        ObjectClass::Filesystem,
        ObjectClass::Fdw,
        ObjectClass::ForeignServer,
        ObjectClass::UserMapping,
        ObjectClass::ExtProtocol,
        ObjectClass::Compression,
    ];

    #[test]
    fn test_class_id_bijection() {
        for class in ALL_CLASSES {
            assert_eq!(object_class_for_id(class_id(class)).unwrap(), class);
        }
    }

    #[test]
    fn test_unknown_class_id_is_rejected() {
        let err = object_class_for_id(9999).unwrap_err();
        assert!(matches!(err, CatalogError::UnrecognizedObjectClass(9999)));
    }
}
