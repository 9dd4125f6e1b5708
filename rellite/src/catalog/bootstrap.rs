// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Built-in catalog objects
//!
//! Seeded once when a catalog is first opened: the system and public
//! schemas, the built-in scalar types, and the object-alias types the
//! expression scanner resolves constants through. Every built-in object is
//! protected by a PIN dependency edge, so user-level drops of them fail.

use super::depend::DependStore;
use super::error::CatalogResult;
use super::objects::{CatalogRecord, ObjectStore};
use super::registry::TYPE_CLASS_ID;
use crate::txn::CatalogTxn;

/// Namespace holding the system catalogs
pub const SYSTEM_SCHEMA_ID: u32 = 1;
/// Default namespace for user objects
pub const PUBLIC_SCHEMA_ID: u32 = 2;

// Built-in scalar types
pub const BOOLEAN_TYPE_ID: u32 = 10;
pub const INTEGER_TYPE_ID: u32 = 11;
pub const BIGINT_TYPE_ID: u32 = 12;
pub const DOUBLE_TYPE_ID: u32 = 13;
pub const TEXT_TYPE_ID: u32 = 14;

// Object-alias types: integer-compatible types whose constants name
// catalog objects
pub const REGPROC_TYPE_ID: u32 = 20;
pub const REGPROCEDURE_TYPE_ID: u32 = 21;
pub const REGOPER_TYPE_ID: u32 = 22;
pub const REGOPERATOR_TYPE_ID: u32 = 23;
pub const REGCLASS_TYPE_ID: u32 = 24;
pub const REGTYPE_TYPE_ID: u32 = 25;

/// First object id handed out for user objects
pub const FIRST_USER_OBJECT_ID: u32 = 10000;

const BUILTIN_TYPES: [(u32, &str); 11] = [
    (BOOLEAN_TYPE_ID, "boolean"),
    (INTEGER_TYPE_ID, "integer"),
    (BIGINT_TYPE_ID, "bigint"),
    (DOUBLE_TYPE_ID, "double precision"),
    (TEXT_TYPE_ID, "text"),
    (REGPROC_TYPE_ID, "regproc"),
    (REGPROCEDURE_TYPE_ID, "regprocedure"),
    (REGOPER_TYPE_ID, "regoper"),
    (REGOPERATOR_TYPE_ID, "regoperator"),
    (REGCLASS_TYPE_ID, "regclass"),
    (REGTYPE_TYPE_ID, "regtype"),
];

/// Seed the built-in objects if this catalog has not been bootstrapped yet
pub(crate) fn bootstrap(
    objects: &ObjectStore,
    depend: &DependStore,
    txn: &mut CatalogTxn,
) -> CatalogResult<()> {
    if objects.exists(TYPE_CLASS_ID, BOOLEAN_TYPE_ID)? {
        return Ok(());
    }
    log::info!("Bootstrapping catalog built-in objects");

    let system = objects.define(
        txn,
        SYSTEM_SCHEMA_ID,
        CatalogRecord::Schema {
            name: "rellite_catalog".to_string(),
        },
    )?;
    depend.record_pin(txn, &system)?;

    let public = objects.define(
        txn,
        PUBLIC_SCHEMA_ID,
        CatalogRecord::Schema {
            name: "public".to_string(),
        },
    )?;
    depend.record_pin(txn, &public)?;

    for (type_id, name) in BUILTIN_TYPES {
        let addr = objects.define(
            txn,
            type_id,
            CatalogRecord::Type {
                name: name.to_string(),
            },
        )?;
        depend.record_pin(txn, &addr)?;
    }

    txn.publish()?;
    Ok(())
}
