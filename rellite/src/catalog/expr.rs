// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Discovery of catalog references in expression trees
//!
//! Walks analysed expression and query trees and collects an address for
//! every construct that carries catalog identity: column references,
//! functions, operators, types, operator classes, and object-alias
//! constants. Used when storing a view, constraint or default expression to
//! record what it depends on.
//!
//! Column references are resolved through a stack of range tables, one per
//! enclosing query scope. Join outputs are not scanned where the join is
//! defined; a join alias expression is only walked when a Var actually
//! refers to it, so unused join columns create no dependencies.

use super::address::{ObjectAddress, ObjectAddresses};
use super::bootstrap::{
    REGCLASS_TYPE_ID, REGOPERATOR_TYPE_ID, REGOPER_TYPE_ID, REGPROCEDURE_TYPE_ID, REGPROC_TYPE_ID,
    REGTYPE_TYPE_ID,
};
use super::depend::{DependStore, DependencyType};
use super::error::{CatalogError, CatalogResult};
use super::objects::ObjectStore;
use super::registry::{
    OPERATOR_CLASS_ID, PROC_CLASS_ID, RELATION_CLASS_ID, TYPE_CLASS_ID, ObjectClass,
};
use crate::ast::{Const, Expr, Query, RangeTblEntry, Value, Var};
use crate::txn::CatalogTxn;

/// Expression walker state: the accumulated addresses and the range-table
/// scope stack (index 0 = innermost scope)
struct ReferenceScanner<'a> {
    objects: &'a ObjectStore,
    rtables: Vec<&'a [RangeTblEntry]>,
    addrs: ObjectAddresses,
}

impl<'a> ReferenceScanner<'a> {
    fn new(objects: &'a ObjectStore, rtable: &'a [RangeTblEntry]) -> Self {
        Self {
            objects,
            rtables: vec![rtable],
            addrs: ObjectAddresses::new(),
        }
    }

    fn into_refs(mut self) -> ObjectAddresses {
        self.addrs.eliminate_duplicates();
        self.addrs
    }

    fn walk_all(&mut self, exprs: &'a [Expr]) -> CatalogResult<()> {
        for expr in exprs {
            self.walk(expr)?;
        }
        Ok(())
    }

    fn walk(&mut self, node: &'a Expr) -> CatalogResult<()> {
        match node {
            Expr::Var(var) => self.walk_var(var),

            Expr::Const(c) => self.walk_const(c),

            Expr::Param(p) => {
                self.addrs.add_object(ObjectClass::Type, p.type_id, 0);
                Ok(())
            }

            Expr::Func(f) => {
                self.addrs.add_object(ObjectClass::Proc, f.func_id, 0);
                self.walk_all(&f.args)
            }

            Expr::Op(op) => {
                self.addrs.add_object(ObjectClass::Operator, op.op_id, 0);
                self.walk_all(&op.args)
            }

            Expr::Distinct(d) => {
                self.addrs.add_object(ObjectClass::Operator, d.op_id, 0);
                self.walk_all(&d.args)
            }

            Expr::ScalarArrayOp(s) => {
                self.addrs.add_object(ObjectClass::Operator, s.op_id, 0);
                self.walk_all(&s.args)
            }

            Expr::NullIf(n) => {
                self.addrs.add_object(ObjectClass::Operator, n.op_id, 0);
                self.walk_all(&n.args)
            }

            Expr::Aggref(a) => {
                self.addrs.add_object(ObjectClass::Proc, a.agg_fn_id, 0);
                self.walk_all(&a.args)
            }

            Expr::WindowFunc(w) => {
                self.addrs.add_object(ObjectClass::Proc, w.win_fn_id, 0);
                self.walk_all(&w.args)
            }

            // No function is involved in these coercions, so the result
            // type itself must be depended on.
            Expr::Relabel(r) => {
                self.addrs.add_object(ObjectClass::Type, r.result_type, 0);
                self.walk(&r.arg)
            }

            Expr::ConvertRowtype(c) => {
                self.addrs.add_object(ObjectClass::Type, c.result_type, 0);
                self.walk(&c.arg)
            }

            Expr::Row(r) => {
                self.addrs.add_object(ObjectClass::Type, r.row_type_id, 0);
                self.walk_all(&r.fields)
            }

            Expr::RowCompare(rc) => {
                for op_id in &rc.op_ids {
                    self.addrs.add_object(ObjectClass::Operator, *op_id, 0);
                }
                for opclass_id in &rc.opclass_ids {
                    self.addrs.add_object(ObjectClass::OpClass, *opclass_id, 0);
                }
                self.walk_all(&rc.left)?;
                self.walk_all(&rc.right)
            }

            Expr::CoerceToDomain(cd) => {
                self.addrs.add_object(ObjectClass::Type, cd.result_type, 0);
                self.walk(&cd.arg)
            }

            Expr::Subquery(query) => self.walk_query(query),

            Expr::SubPlan(_) => Err(CatalogError::Unsupported(
                "already-planned subqueries".to_string(),
            )),
        }
    }

    fn walk_var(&mut self, var: &'a Var) -> CatalogResult<()> {
        if var.level >= self.rtables.len() {
            return Err(CatalogError::InvalidVarLevel(var.level));
        }
        let rtable = self.rtables[var.level];
        if var.rt_index == 0 || var.rt_index > rtable.len() {
            return Err(CatalogError::InvalidVarNo(var.rt_index));
        }

        // A whole-row Var references no specific column and adds nothing
        if var.attno == 0 {
            return Ok(());
        }

        match &rtable[var.rt_index - 1] {
            RangeTblEntry::Relation { rel_id } => {
                self.addrs
                    .add_object(ObjectClass::Class, *rel_id, var.attno);
                Ok(())
            }
            RangeTblEntry::Join { alias_vars } => {
                if var.attno < 0 || var.attno as usize > alias_vars.len() {
                    return Err(CatalogError::InvalidAttrNo(var.attno));
                }
                // Walk the aliased input expression in the join's own
                // scope: trim the stack so the join's level becomes the
                // innermost.
                let saved = self.rtables.clone();
                self.rtables = self.rtables[var.level..].to_vec();
                let result = self.walk(&alias_vars[var.attno as usize - 1]);
                self.rtables = saved;
                result
            }
            // Vars over subquery or function entries resolve to the
            // entry's own output; the underlying objects are picked up
            // when the entry itself is walked.
            _ => Ok(()),
        }
    }

    fn walk_const(&mut self, c: &Const) -> CatalogResult<()> {
        // A constant depends on its datatype
        self.addrs.add_object(ObjectClass::Type, c.type_id, 0);

        // An object-alias constant also references the object it names,
        // if that object exists.
        let object_id = match &c.value {
            Some(Value::ObjectId(id)) => *id,
            _ => return Ok(()),
        };
        match c.type_id {
            REGPROC_TYPE_ID | REGPROCEDURE_TYPE_ID => {
                if self.objects.exists(PROC_CLASS_ID, object_id)? {
                    self.addrs.add_object(ObjectClass::Proc, object_id, 0);
                }
            }
            REGOPER_TYPE_ID | REGOPERATOR_TYPE_ID => {
                if self.objects.exists(OPERATOR_CLASS_ID, object_id)? {
                    self.addrs.add_object(ObjectClass::Operator, object_id, 0);
                }
            }
            REGCLASS_TYPE_ID => {
                if self.objects.exists(RELATION_CLASS_ID, object_id)? {
                    self.addrs.add_object(ObjectClass::Class, object_id, 0);
                }
            }
            REGTYPE_TYPE_ID => {
                if self.objects.exists(TYPE_CLASS_ID, object_id)? {
                    self.addrs.add_object(ObjectClass::Type, object_id, 0);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn walk_query(&mut self, query: &'a Query) -> CatalogResult<()> {
        // Whole-relation refs for plain relations in the range table, and
        // datatype refs for declared function result columns
        for rte in &query.rtable {
            match rte {
                RangeTblEntry::Relation { rel_id } => {
                    self.addrs.add_object(ObjectClass::Class, *rel_id, 0);
                }
                RangeTblEntry::Function { col_types, .. } => {
                    for col_type in col_types {
                        self.addrs.add_object(ObjectClass::Type, *col_type, 0);
                    }
                }
                _ => {}
            }
        }

        // Examine the query's substructure in its own scope
        self.rtables.insert(0, &query.rtable);
        self.walk_all(&query.targets)?;
        if let Some(quals) = &query.quals {
            self.walk(quals)?;
        }
        for rte in &query.rtable {
            match rte {
                RangeTblEntry::Subquery { query } => self.walk_query(query)?,
                RangeTblEntry::Function { expr, .. } => self.walk(expr)?,
                // Join alias lists are only walked from Vars that use them
                _ => {}
            }
        }
        self.rtables.remove(0);
        Ok(())
    }
}

/// Collect the deduplicated set of objects referenced by `expr`
pub(crate) fn find_expr_references<'a>(
    objects: &'a ObjectStore,
    expr: &'a Expr,
    rtable: &'a [RangeTblEntry],
) -> CatalogResult<ObjectAddresses> {
    let mut scanner = ReferenceScanner::new(objects, rtable);
    scanner.walk(expr)?;
    Ok(scanner.into_refs())
}

/// Record dependencies of `depender` on everything `expr` references
///
/// `rtable` interprets Vars at scope level 0.
pub(crate) fn record_dependency_on_expr(
    objects: &ObjectStore,
    depend: &DependStore,
    txn: &mut CatalogTxn,
    depender: &ObjectAddress,
    expr: &Expr,
    rtable: &[RangeTblEntry],
    behavior: DependencyType,
) -> CatalogResult<()> {
    let refs = find_expr_references(objects, expr, rtable)?;
    depend.insert_many(txn, depender, refs.as_slice(), behavior)
}

/// As `record_dependency_on_expr`, but for expressions over exactly one
/// relation (rt_index 1, level 0), passed as `rel_id` instead of a range
/// table. References to that relation or its columns are recorded with
/// `self_behavior`; everything else with `behavior`.
pub(crate) fn record_dependency_on_single_rel_expr(
    objects: &ObjectStore,
    depend: &DependStore,
    txn: &mut CatalogTxn,
    depender: &ObjectAddress,
    expr: &Expr,
    rel_id: u32,
    behavior: DependencyType,
    self_behavior: DependencyType,
) -> CatalogResult<()> {
    let rtable = [RangeTblEntry::Relation { rel_id }];
    let refs = {
        let mut scanner = ReferenceScanner::new(objects, &rtable);
        scanner.walk(expr)?;
        scanner.into_refs()
    };

    if behavior == self_behavior {
        return depend.insert_many(txn, depender, refs.as_slice(), behavior);
    }

    let (self_refs, other_refs): (Vec<ObjectAddress>, Vec<ObjectAddress>) = refs
        .iter()
        .copied()
        .partition(|addr| addr.class_id == RELATION_CLASS_ID && addr.object_id == rel_id);

    depend.insert_many(txn, depender, &self_refs, self_behavior)?;
    depend.insert_many(txn, depender, &other_refs, behavior)
}
