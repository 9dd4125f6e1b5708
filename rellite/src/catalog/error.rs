// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the catalog dependency engine

use crate::storage::types::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A drop was refused: dependent objects exist (RESTRICT violation),
    /// a PIN edge protects the object, or a direct drop of an internal
    /// implementation object was attempted.
    #[error("{message}")]
    DependentObjectsStillExist {
        message: String,
        hint: Option<String>,
    },

    /// Catalog corruption: more than one INTERNAL edge out of one object
    #[error("multiple INTERNAL dependencies for {0}")]
    MultipleInternal(String),

    /// Catalog corruption: a PIN edge with a non-zero dependent endpoint
    #[error("incorrect use of PIN dependency with {0}")]
    IncorrectPinUse(String),

    /// Forward-compatibility guard for unknown on-disk edge kind tags
    #[error("unrecognized dependency type '{tag}' for {object}")]
    UnrecognizedDependencyType { tag: char, object: String },

    /// The class id of an address maps to no known object class
    #[error("unrecognized object class: {0}")]
    UnrecognizedObjectClass(u32),

    /// A catalog row that must exist could not be found
    #[error("cache lookup failed for {kind} {id}")]
    CacheLookupFailed { kind: &'static str, id: u32 },

    /// Malformed expression tree: variable scope level out of range
    #[error("invalid variable level {0}")]
    InvalidVarLevel(usize),

    /// Malformed expression tree: range table index out of range
    #[error("invalid range table index {0}")]
    InvalidVarNo(usize),

    /// Malformed expression tree: attribute number out of range
    #[error("invalid attribute number {0}")]
    InvalidAttrNo(i32),

    /// Operation is recognized but deliberately not implemented
    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    /// Build a DependentObjectsStillExist error with an optional user hint
    pub fn dependent_objects(message: impl Into<String>, hint: Option<String>) -> Self {
        CatalogError::DependentObjectsStillExist {
            message: message.into(),
            hint,
        }
    }

    /// The hint attached to a drop refusal, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            CatalogError::DependentObjectsStillExist { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

impl From<bincode::Error> for CatalogError {
    fn from(err: bincode::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
