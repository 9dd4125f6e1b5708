// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression tree structures shared between the planner and the catalog

pub mod expr;

pub use expr::{
    Aggref, CoerceToDomain, Const, ConvertRowtypeExpr, DistinctExpr, Expr, FuncExpr, NullIfExpr,
    OpExpr, Param, Query, RangeTblEntry, RelabelType, RowCompareExpr, RowExpr, ScalarArrayOpExpr,
    SubPlan, Value, Var, WindowFunc,
};
