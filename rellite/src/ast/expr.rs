// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression and query tree nodes
//!
//! These are the post-analysis trees the rewriter and the catalog walk:
//! column references are resolved to range-table positions, functions and
//! operators to catalog object ids. The catalog's reference scanner
//! traverses them to discover which objects an expression depends on.

use serde::{Deserialize, Serialize};

/// A constant's runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// A catalog object reference, as carried by the object-alias types
    /// (regclass, regproc, ...)
    ObjectId(u32),
}

/// Resolved column reference
///
/// `level` counts enclosing query scopes upward (0 = innermost), `rt_index`
/// is the 1-based position in that scope's range table, and `attno` the
/// 1-based column number. `attno` 0 denotes a whole-row reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub level: usize,
    pub rt_index: usize,
    pub attno: i32,
}

/// Literal constant; `value` is None for SQL NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Const {
    pub type_id: u32,
    pub value: Option<Value>,
}

/// External parameter placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub type_id: u32,
}

/// Function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncExpr {
    pub func_id: u32,
    pub args: Vec<Expr>,
}

/// Binary or unary operator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpExpr {
    pub op_id: u32,
    pub args: Vec<Expr>,
}

/// IS DISTINCT FROM, resolved to its equality operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistinctExpr {
    pub op_id: u32,
    pub args: Vec<Expr>,
}

/// `scalar op ANY/ALL (array)` construct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarArrayOpExpr {
    pub op_id: u32,
    pub use_or: bool,
    pub args: Vec<Expr>,
}

/// NULLIF, resolved to its equality operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullIfExpr {
    pub op_id: u32,
    pub args: Vec<Expr>,
}

/// Aggregate function reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggref {
    pub agg_fn_id: u32,
    pub args: Vec<Expr>,
}

/// Window function reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFunc {
    pub win_fn_id: u32,
    pub args: Vec<Expr>,
}

/// Binary-compatible type relabeling (no conversion function involved)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelabelType {
    pub arg: Box<Expr>,
    pub result_type: u32,
}

/// Row-type conversion between compatible composite types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertRowtypeExpr {
    pub arg: Box<Expr>,
    pub result_type: u32,
}

/// ROW(...) constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowExpr {
    pub row_type_id: u32,
    pub fields: Vec<Expr>,
}

/// Row-wise comparison, one operator and operator class per column pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowCompareExpr {
    pub op_ids: Vec<u32>,
    pub opclass_ids: Vec<u32>,
    pub left: Vec<Expr>,
    pub right: Vec<Expr>,
}

/// Coercion to a domain type (runtime constraint check)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoerceToDomain {
    pub arg: Box<Expr>,
    pub result_type: u32,
}

/// An already-planned subquery. The catalog scanner rejects these; only
/// parse-stage trees may be recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPlan {
    pub plan_id: u32,
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Var(Var),
    Const(Const),
    Param(Param),
    Func(FuncExpr),
    Op(OpExpr),
    Distinct(DistinctExpr),
    ScalarArrayOp(ScalarArrayOpExpr),
    NullIf(NullIfExpr),
    Aggref(Aggref),
    WindowFunc(WindowFunc),
    Relabel(RelabelType),
    ConvertRowtype(ConvertRowtypeExpr),
    Row(RowExpr),
    RowCompare(RowCompareExpr),
    CoerceToDomain(CoerceToDomain),
    Subquery(Box<Query>),
    SubPlan(SubPlan),
}

/// One entry of a query's range table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RangeTblEntry {
    /// A plain relation scan
    Relation { rel_id: u32 },
    /// A join; `alias_vars` maps join output columns back to input
    /// expressions and is only walked when a Var actually references one
    Join { alias_vars: Vec<Expr> },
    /// A subquery in FROM
    Subquery { query: Box<Query> },
    /// A function in FROM with its declared result column types
    Function { expr: Box<Expr>, col_types: Vec<u32> },
}

/// A (sub)query: range table plus the expressions hanging off it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub rtable: Vec<RangeTblEntry>,
    pub targets: Vec<Expr>,
    pub quals: Option<Expr>,
}

impl Query {
    pub fn new(rtable: Vec<RangeTblEntry>) -> Self {
        Self {
            rtable,
            targets: Vec::new(),
            quals: None,
        }
    }
}
