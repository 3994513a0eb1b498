//! Store: the SQLite Data Gateway behind the chat core.
//!
//! Submodules:
//! - `database`: connection handle, opaque statement execution, row mapping
//! - `schema`: DDL for the fixed e-commerce schema
//! - `errors`: store-level error types

pub mod database;
pub mod errors;
pub mod schema;

pub use database::StoreDatabase;
pub use errors::StoreError;
