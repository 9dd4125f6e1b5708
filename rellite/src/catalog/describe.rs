// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Human-readable object descriptions for diagnostics
//!
//! Every phrase the dependency engine emits ("drop cascades to view v",
//! "cannot drop table orders ...") goes through here. Relation names are
//! schema-qualified only when the relation's namespace is outside the
//! active search path.

use super::address::ObjectAddress;
use super::error::{CatalogError, CatalogResult};
use super::objects::{CatalogRecord, ObjectStore, RelationKind};
use super::registry::{self, ObjectClass};

/// Describe a catalog object for use in messages
pub(crate) fn describe_object(
    objects: &ObjectStore,
    search_path: &[u32],
    addr: &ObjectAddress,
) -> CatalogResult<String> {
    match registry::object_class(addr)? {
        ObjectClass::Class => {
            let mut description = relation_description(objects, search_path, addr.object_id)?;
            if addr.sub_id != 0 {
                let attname = objects.attribute_name(addr.object_id, addr.sub_id)?;
                description.push_str(&format!(" column {}", attname));
            }
            Ok(description)
        }

        ObjectClass::Proc => {
            let name = named_record(objects, addr, "function")?;
            Ok(format!("function {}", name))
        }

        ObjectClass::Type => Ok(format!("type {}", type_name(objects, addr.object_id)?)),

        ObjectClass::Cast => {
            let row = fetch(objects, addr, "cast")?;
            match row {
                CatalogRecord::Cast { source, target } => Ok(format!(
                    "cast from {} to {}",
                    type_name(objects, source)?,
                    type_name(objects, target)?
                )),
                _ => Err(lookup_failed("cast", addr.object_id)),
            }
        }

        ObjectClass::Constraint => {
            let row = fetch(objects, addr, "constraint")?;
            match row {
                CatalogRecord::Constraint {
                    name,
                    relation: Some(rel_id),
                } => Ok(format!(
                    "constraint {} on {}",
                    name,
                    relation_description(objects, search_path, rel_id)?
                )),
                CatalogRecord::Constraint { name, .. } => Ok(format!("constraint {}", name)),
                _ => Err(lookup_failed("constraint", addr.object_id)),
            }
        }

        ObjectClass::Conversion => {
            let name = named_record(objects, addr, "conversion")?;
            Ok(format!("conversion {}", name))
        }

        ObjectClass::Default => {
            let row = fetch(objects, addr, "default")?;
            match row {
                CatalogRecord::AttrDefault { relation, column } => {
                    let column_addr =
                        ObjectAddress::new(registry::RELATION_CLASS_ID, relation, column);
                    Ok(format!(
                        "default for {}",
                        describe_object(objects, search_path, &column_addr)?
                    ))
                }
                _ => Err(lookup_failed("default", addr.object_id)),
            }
        }

        ObjectClass::Language => {
            let name = named_record(objects, addr, "language")?;
            Ok(format!("language {}", name))
        }

        ObjectClass::Operator => {
            let name = named_record(objects, addr, "operator")?;
            Ok(format!("operator {}", name))
        }

        ObjectClass::OpClass => {
            let row = fetch(objects, addr, "operator class")?;
            match row {
                CatalogRecord::OpClass {
                    name,
                    namespace,
                    access_method,
                } => {
                    let qualified = qualify(objects, search_path, namespace, &name)?;
                    Ok(format!(
                        "operator class {} for access method {}",
                        qualified, access_method
                    ))
                }
                _ => Err(lookup_failed("operator class", addr.object_id)),
            }
        }

        ObjectClass::Rewrite => {
            let row = fetch(objects, addr, "rule")?;
            match row {
                CatalogRecord::Rewrite { name, relation } => Ok(format!(
                    "rule {} on {}",
                    name,
                    relation_description(objects, search_path, relation)?
                )),
                _ => Err(lookup_failed("rule", addr.object_id)),
            }
        }

        ObjectClass::Trigger => {
            let row = fetch(objects, addr, "trigger")?;
            match row {
                CatalogRecord::Trigger { name, relation } => Ok(format!(
                    "trigger {} on {}",
                    name,
                    relation_description(objects, search_path, relation)?
                )),
                _ => Err(lookup_failed("trigger", addr.object_id)),
            }
        }

        ObjectClass::Schema => {
            let name = named_record(objects, addr, "schema")?;
            Ok(format!("schema {}", name))
        }

        ObjectClass::Role => {
            let name = named_record(objects, addr, "role")?;
            Ok(format!("role {}", name))
        }

        ObjectClass::Database => {
            let name = named_record(objects, addr, "database")?;
            Ok(format!("database {}", name))
        }

        ObjectClass::Tablespace => {
            let name = named_record(objects, addr, "tablespace")?;
            Ok(format!("tablespace {}", name))
        }

        ObjectClass::Filespace => {
            let name = named_record(objects, addr, "filespace")?;
            Ok(format!("filespace {}", name))
        }

        ObjectClass::Filesystem => {
            let name = named_record(objects, addr, "filesystem")?;
            Ok(format!("filesystem {}", name))
        }

        ObjectClass::Fdw => {
            let name = named_record(objects, addr, "foreign-data wrapper")?;
            Ok(format!("foreign-data wrapper {}", name))
        }

        ObjectClass::ForeignServer => {
            let name = named_record(objects, addr, "server")?;
            Ok(format!("server {}", name))
        }

        ObjectClass::UserMapping => {
            let row = fetch(objects, addr, "user mapping")?;
            match row {
                CatalogRecord::UserMapping { user } => {
                    let username = match user {
                        Some(role_id) => match fetch_role_name(objects, role_id)? {
                            Some(name) => name,
                            None => return Err(lookup_failed("role", role_id)),
                        },
                        None => "public".to_string(),
                    };
                    Ok(format!("user mapping for {}", username))
                }
                _ => Err(lookup_failed("user mapping", addr.object_id)),
            }
        }

        ObjectClass::ExtProtocol => {
            let name = named_record(objects, addr, "protocol")?;
            Ok(format!("protocol {}", name))
        }

        ObjectClass::Compression => {
            let name = named_record(objects, addr, "compression codec")?;
            Ok(format!("compression codec {}", name))
        }
    }
}

/// Describe a relation: kind word plus (possibly qualified) name
fn relation_description(
    objects: &ObjectStore,
    search_path: &[u32],
    rel_id: u32,
) -> CatalogResult<String> {
    let addr = ObjectAddress::whole(registry::RELATION_CLASS_ID, rel_id);
    let row = fetch(objects, &addr, "relation")?;
    let (name, namespace, kind) = match row {
        CatalogRecord::Relation {
            name,
            namespace,
            kind,
            ..
        } => (name, namespace, kind),
        _ => return Err(lookup_failed("relation", rel_id)),
    };

    let qualified = qualify(objects, search_path, namespace, &name)?;
    let word = match kind {
        RelationKind::Table => "table",
        RelationKind::Index => "index",
        RelationKind::Sequence => "sequence",
        RelationKind::View => "view",
        RelationKind::CompositeType => "composite type",
        RelationKind::Toast => "toast table",
    };
    Ok(format!("{} {}", word, qualified))
}

/// Qualify a name with its schema unless the schema is on the search path
fn qualify(
    objects: &ObjectStore,
    search_path: &[u32],
    namespace: u32,
    name: &str,
) -> CatalogResult<String> {
    if search_path.contains(&namespace) {
        return Ok(name.to_string());
    }
    let schema_addr = ObjectAddress::whole(registry::SCHEMA_CLASS_ID, namespace);
    match fetch(objects, &schema_addr, "schema")? {
        CatalogRecord::Schema { name: schema_name } => Ok(format!("{}.{}", schema_name, name)),
        _ => Err(lookup_failed("schema", namespace)),
    }
}

fn type_name(objects: &ObjectStore, type_id: u32) -> CatalogResult<String> {
    let addr = ObjectAddress::whole(registry::TYPE_CLASS_ID, type_id);
    match fetch(objects, &addr, "type")? {
        CatalogRecord::Type { name } => Ok(name),
        _ => Err(lookup_failed("type", type_id)),
    }
}

fn fetch_role_name(objects: &ObjectStore, role_id: u32) -> CatalogResult<Option<String>> {
    match objects.get(registry::ROLE_CLASS_ID, role_id)? {
        Some(row) => match row.record {
            CatalogRecord::Role { name } => Ok(Some(name)),
            _ => Ok(None),
        },
        None => Ok(None),
    }
}

fn fetch(
    objects: &ObjectStore,
    addr: &ObjectAddress,
    kind: &'static str,
) -> CatalogResult<CatalogRecord> {
    objects
        .get(addr.class_id, addr.object_id)?
        .map(|row| row.record)
        .ok_or(lookup_failed(kind, addr.object_id))
}

/// Fetch a record that is described by its name field alone
fn named_record(
    objects: &ObjectStore,
    addr: &ObjectAddress,
    kind: &'static str,
) -> CatalogResult<String> {
    let record = fetch(objects, addr, kind)?;
    let name = match record {
        CatalogRecord::Proc { name }
        | CatalogRecord::Conversion { name }
        | CatalogRecord::Language { name }
        | CatalogRecord::Operator { name }
        | CatalogRecord::Schema { name }
        | CatalogRecord::Role { name }
        | CatalogRecord::Database { name }
        | CatalogRecord::Tablespace { name }
        | CatalogRecord::Filespace { name }
        | CatalogRecord::Filesystem { name }
        | CatalogRecord::ForeignDataWrapper { name }
        | CatalogRecord::ForeignServer { name }
        | CatalogRecord::Protocol { name }
        | CatalogRecord::Compression { name } => name,
        _ => return Err(lookup_failed(kind, addr.object_id)),
    };
    Ok(name)
}

fn lookup_failed(kind: &'static str, id: u32) -> CatalogError {
    CatalogError::CacheLookupFailed { kind, id }
}
