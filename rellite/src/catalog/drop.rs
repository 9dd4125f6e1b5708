// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cascaded deletion of catalog objects
//!
//! The deletion machine runs in three steps per object. Step 1 severs the
//! object's outgoing edges, redirecting the drop to the owning object when
//! an INTERNAL edge is found. Step 2 recursively drops everything that
//! depends on the object. Step 3 runs the per-class destructor and clears
//! comments and shared-dependency records. A publish barrier after Steps 1
//! and 3 makes the severed edges invisible to deeper scans, which is what
//! terminates traversal when the dependency graph contains cycles.
//!
//! RESTRICT violations are not raised where they are found. They are
//! recorded and reported once at the entry point, so one failed drop lists
//! every direct and indirect dependent. The deletions still happen along
//! the way; the caller aborts the transaction to undo them.
//!
//! The `oktodelete` set is computed in a read-only pre-pass before any
//! mutation. It holds everything reachable from the targets over AUTO or
//! INTERNAL edges and makes the outcome independent of edge visit order:
//! a NORMAL edge to an object that some AUTO path also reaches is treated
//! as auto-cascading no matter which path the scan happens to walk first.

use super::address::{ObjectAddress, ObjectAddresses};
use super::describe::describe_object;
use super::error::{CatalogError, CatalogResult};
use super::manager::{Catalog, ClusterRole};
use super::registry;
use super::depend::DependencyType;
use crate::txn::CatalogTxn;
use serde::{Deserialize, Serialize};

/// What to do about dependent objects when dropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropBehavior {
    /// Refuse the drop if any object outside the implicit closure depends
    /// on the target
    Restrict,
    /// Recursively drop dependent objects too
    Cascade,
}

/// Severity of a deletion diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug2,
    Debug1,
    Notice,
    Error,
}

const CASCADE_HINT: &str = "Use DROP ... CASCADE to drop the dependent objects too.";

/// Attempt to drop one object, cascading or refusing per `behavior`
pub(crate) fn perform_deletion(
    catalog: &Catalog,
    txn: &mut CatalogTxn,
    object: &ObjectAddress,
    behavior: DropBehavior,
) -> CatalogResult<()> {
    // Description for the failure message must be taken before deleting
    let description = describe(catalog, object)?;

    let mut ctx = DeletionContext::new(catalog, behavior, Severity::Notice, None);
    ctx.find_auto_deletable(txn, object, true)?;

    if !ctx.recursive_deletion(txn, object, None)? {
        return Err(CatalogError::dependent_objects(
            format!(
                "cannot drop {} because other objects depend on it",
                description
            ),
            Some(CASCADE_HINT.to_string()),
        ));
    }
    Ok(())
}

/// Drop several objects at once
///
/// The implicit closure is the union over all targets, so a target that is
/// auto-deletable from another target is skipped rather than dropped twice,
/// and cross-target AUTO edges relax RESTRICT checks the same way they
/// would inside a single drop.
pub(crate) fn perform_multiple_deletions(
    catalog: &Catalog,
    txn: &mut CatalogTxn,
    objects: &ObjectAddresses,
    behavior: DropBehavior,
) -> CatalogResult<()> {
    let mut ctx = DeletionContext::new(
        catalog,
        behavior,
        Severity::Notice,
        Some(ObjectAddresses::new()),
    );

    // Union of the implicit closures of all targets, excluding the
    // targets themselves
    for object in objects.iter() {
        if ctx.oktodelete.contains(object) {
            continue;
        }
        ctx.find_auto_deletable(txn, object, false)?;
    }

    for object in objects.iter() {
        // Already dropped as a dependent of an earlier target
        if ctx
            .already_deleted
            .as_ref()
            .map(|deleted| deleted.contains(object))
            .unwrap_or(false)
        {
            continue;
        }
        // Will be dropped implicitly when its owner goes
        if ctx.oktodelete.contains(object) {
            continue;
        }

        let description = describe(catalog, object)?;
        ctx.find_auto_deletable(txn, object, true)?;
        if !ctx.recursive_deletion(txn, object, None)? {
            return Err(CatalogError::dependent_objects(
                format!(
                    "cannot drop {} because other objects depend on it",
                    description
                ),
                Some(CASCADE_HINT.to_string()),
            ));
        }
    }
    Ok(())
}

/// Drop everything that depends on `object`, but not the object itself
///
/// Always cascades. Used to empty a schema before dropping it.
pub(crate) fn delete_what_depends_on(
    catalog: &Catalog,
    txn: &mut CatalogTxn,
    object: &ObjectAddress,
    show_notices: bool,
) -> CatalogResult<()> {
    let description = describe(catalog, object)?;

    let msglevel = if show_notices {
        Severity::Notice
    } else {
        Severity::Debug2
    };
    let mut ctx = DeletionContext::new(catalog, DropBehavior::Cascade, msglevel, None);

    // Include the target itself so self-referential edges are tolerated
    ctx.find_auto_deletable(txn, object, true)?;

    if !ctx.delete_dependents(txn, object, &description)? {
        return Err(CatalogError::dependent_objects(
            format!("failed to drop all objects depending on {}", description),
            None,
        ));
    }
    Ok(())
}

struct DeletionContext<'a> {
    catalog: &'a Catalog,
    behavior: DropBehavior,
    msglevel: Severity,
    /// Objects reachable from the targets via AUTO/INTERNAL edges; they
    /// cascade silently even when first reached over a NORMAL edge
    oktodelete: ObjectAddresses,
    /// When present, every dropped object is appended here
    already_deleted: Option<ObjectAddresses>,
}

impl<'a> DeletionContext<'a> {
    fn new(
        catalog: &'a Catalog,
        behavior: DropBehavior,
        msglevel: Severity,
        already_deleted: Option<ObjectAddresses>,
    ) -> Self {
        Self {
            catalog,
            behavior,
            msglevel,
            oktodelete: ObjectAddresses::new(),
            already_deleted,
        }
    }

    /// Read-only pre-pass: collect everything reachable from `object`
    /// over AUTO or INTERNAL edges into `oktodelete`
    fn find_auto_deletable(
        &mut self,
        txn: &mut CatalogTxn,
        object: &ObjectAddress,
        addself: bool,
    ) -> CatalogResult<()> {
        // Already visited; stop here so dependency loops terminate
        if self.oktodelete.contains(object) {
            return Ok(());
        }
        if addself {
            self.oktodelete.add_exact(*object);
        }

        let incoming = self
            .catalog
            .depend_store()
            .scan_incoming(txn, object, false)?;
        for edge in incoming {
            match edge.kind() {
                Some(DependencyType::Normal) => {}
                Some(DependencyType::Auto) | Some(DependencyType::Internal) => {
                    self.find_auto_deletable(txn, &edge.dependent, true)?;
                }
                Some(DependencyType::Pin) => {
                    // Nothing else is worth examining; the drop can never
                    // be allowed
                    return Err(CatalogError::dependent_objects(
                        format!(
                            "cannot drop {} because it is required by the database system",
                            describe(self.catalog, object)?
                        ),
                        None,
                    ));
                }
                None => {
                    return Err(CatalogError::UnrecognizedDependencyType {
                        tag: edge.tag,
                        object: describe(self.catalog, object)?,
                    })
                }
            }
        }
        Ok(())
    }

    /// Delete `object` and (recursively) anything that depends on it
    ///
    /// Returns false if a RESTRICT violation was recorded somewhere below;
    /// hard failures abort with an error. `caller` is None at the outer
    /// level, else the object whose deletion recursed here.
    fn recursive_deletion(
        &mut self,
        txn: &mut CatalogTxn,
        object: &ObjectAddress,
        caller: Option<&ObjectAddress>,
    ) -> CatalogResult<bool> {
        let mut ok = true;
        let description = describe(self.catalog, object)?;

        // Step 1: sever the edges from this object to others. Doing this
        // first, and publishing, is what keeps cyclic graphs from
        // recursing forever.
        let mut owning_object: Option<ObjectAddress> = None;
        let outgoing = self
            .catalog
            .depend_store()
            .scan_outgoing(txn, object, true)?;
        for edge in outgoing {
            let other = edge.referenced;
            match edge.kind() {
                Some(DependencyType::Normal) | Some(DependencyType::Auto) => {}

                Some(DependencyType::Internal) => {
                    match caller {
                        // The object is an implementation detail of
                        // `other`; a direct drop must be redirected there.
                        None => {
                            let other_description = describe(self.catalog, &other)?;
                            return Err(CatalogError::dependent_objects(
                                format!(
                                    "cannot drop {} because {} requires it",
                                    description, other_description
                                ),
                                Some(format!("You may drop {} instead.", other_description)),
                            ));
                        }
                        Some(caller) => {
                            // Recursing back in from the owner (or from a
                            // whole object that contains the owner): the
                            // edge may be severed like any other.
                            if caller.class_id == other.class_id
                                && caller.object_id == other.object_id
                                && (caller.sub_id == other.sub_id || caller.sub_id == 0)
                            {
                                // fall through to the delete below
                            } else {
                                // Reached from somewhere else: hand the
                                // deletion over to the owner. The INTERNAL
                                // edge must survive so the owner's drop
                                // finds its way back here.
                                if owning_object.is_some() {
                                    return Err(CatalogError::MultipleInternal(description));
                                }
                                owning_object = Some(other);
                                continue;
                            }
                        }
                    }
                }

                // PIN rows carry a zeroed dependent endpoint; one showing
                // up in an outgoing scan is corruption
                Some(DependencyType::Pin) => {
                    return Err(CatalogError::IncorrectPinUse(description))
                }

                None => {
                    return Err(CatalogError::UnrecognizedDependencyType {
                        tag: edge.tag,
                        object: description,
                    })
                }
            }

            self.catalog.depend_store().delete_edge(txn, &edge)?;
        }

        // Make the edge removals visible to every scan below
        txn.publish()?;

        // Step 1a: owned by another object; ask it to delete itself
        // instead of proceeding.
        if let Some(owner) = owning_object {
            if self.oktodelete.contains(&owner) {
                self.report(
                    txn,
                    Severity::Debug2,
                    format!("drop auto-cascades to {}", describe(self.catalog, &owner)?),
                );
            } else if self.behavior == DropBehavior::Restrict {
                self.report(
                    txn,
                    self.msglevel,
                    format!(
                        "{} depends on {}",
                        describe(self.catalog, &owner)?,
                        description
                    ),
                );
                ok = false;
            } else {
                self.report(
                    txn,
                    self.msglevel,
                    format!("drop cascades to {}", describe(self.catalog, &owner)?),
                );
            }

            if !self.recursive_deletion(txn, &owner, Some(object))? {
                ok = false;
            }
            return Ok(ok);
        }

        // Step 2: drop everything that depends on this object. Dependents
        // must go before the object itself; their destructors may still
        // look at it.
        if !self.delete_dependents(txn, object, &description)? {
            ok = false;
        }

        // Step 3: destroy the object, then its comments and shared
        // dependency records.
        registry::do_deletion(self.catalog.objects(), txn, object)?;
        if let Some(deleted) = &mut self.already_deleted {
            if !deleted.contains(object) {
                deleted.add_exact(*object);
            }
        }
        self.catalog.comments().delete_comments(txn, object)?;
        if object.sub_id == 0 {
            self.catalog
                .shared()
                .delete_for_object(txn, object.class_id, object.object_id)?;
        }
        txn.publish()?;

        Ok(ok)
    }

    /// Step 2: recursively delete the objects that depend on `object`
    ///
    /// The edge rows themselves are not deleted here; each dependent's own
    /// Step 1 severs them.
    fn delete_dependents(
        &mut self,
        txn: &mut CatalogTxn,
        object: &ObjectAddress,
        description: &str,
    ) -> CatalogResult<bool> {
        let mut ok = true;

        let incoming = self
            .catalog
            .depend_store()
            .scan_incoming(txn, object, true)?;
        for edge in incoming {
            // A deeper recursion may have already removed this edge (and
            // its dependent) through another dependency path; skip rows
            // that are no longer live or we would drop an object twice.
            if !self.catalog.depend_store().row_exists(edge.row_id)? {
                continue;
            }
            let other = edge.dependent;

            match edge.kind() {
                Some(DependencyType::Normal) => {
                    if self.oktodelete.contains(&other) {
                        // Another dependency path makes this object
                        // auto-deletable; treat the link as AUTO no matter
                        // which path the scan found first.
                        self.report(
                            txn,
                            Severity::Debug2,
                            format!("drop auto-cascades to {}", describe(self.catalog, &other)?),
                        );
                    } else if self.behavior == DropBehavior::Restrict {
                        self.report(
                            txn,
                            self.msglevel,
                            format!(
                                "{} depends on {}",
                                describe(self.catalog, &other)?,
                                description
                            ),
                        );
                        ok = false;
                    } else {
                        self.report(
                            txn,
                            self.msglevel,
                            format!("drop cascades to {}", describe(self.catalog, &other)?),
                        );
                    }

                    if !self.recursive_deletion(txn, &other, Some(object))? {
                        ok = false;
                    }
                }

                Some(DependencyType::Auto) | Some(DependencyType::Internal) => {
                    // Propagate without complaint even under RESTRICT;
                    // normal dependencies on the dependent can still fail
                    // the drop.
                    self.report(
                        txn,
                        Severity::Debug2,
                        format!("drop auto-cascades to {}", describe(self.catalog, &other)?),
                    );
                    if !self.recursive_deletion(txn, &other, Some(object))? {
                        ok = false;
                    }
                }

                Some(DependencyType::Pin) => {
                    return Err(CatalogError::dependent_objects(
                        format!(
                            "cannot drop {} because it is required by the database system",
                            description
                        ),
                        None,
                    ))
                }

                None => {
                    return Err(CatalogError::UnrecognizedDependencyType {
                        tag: edge.tag,
                        object: description.to_string(),
                    })
                }
            }
        }

        Ok(ok)
    }

    /// Emit a deletion diagnostic
    ///
    /// NOTICE goes to the transaction's notice buffer (and the log);
    /// debug levels go to the log only. On executor nodes NOTICE is
    /// downgraded to DEBUG1 so a distributed drop reports once, from the
    /// coordinator.
    fn report(&self, txn: &mut CatalogTxn, severity: Severity, message: String) {
        let severity = if severity == Severity::Notice
            && self.catalog.cluster_role() == ClusterRole::Executor
        {
            Severity::Debug1
        } else {
            severity
        };
        match severity {
            Severity::Notice => {
                log::info!("{}", message);
                txn.push_notice(message);
            }
            Severity::Debug1 => log::debug!("{}", message),
            Severity::Debug2 => log::trace!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
    }
}

fn describe(catalog: &Catalog, addr: &ObjectAddress) -> CatalogResult<String> {
    describe_object(catalog.objects(), catalog.search_path(), addr)
}
