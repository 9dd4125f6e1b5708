//! Shared helpers for catalog integration tests
#![allow(dead_code)]

pub mod fixture;

pub use fixture::CatalogFixture;
