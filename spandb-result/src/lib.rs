//! Error types and result definitions for the spandb schema engine.
//!
//! This crate provides the unified error type ([`Error`]) and result type alias
//! ([`Result<T>`]) used throughout the spandb crates. All operations that could
//! fail return `Result<T>`, where the error variant carries enough structure for
//! callers to match on the failure class programmatically.
//!
//! # Error Categories
//!
//! - **Name collisions** ([`Error::NameAlreadyExists`]): a created object's name
//!   is already taken in its namespace
//! - **Lookup failures** ([`Error::NameNotFound`]): a referenced table, column,
//!   index or constraint does not exist
//! - **Semantic violations** ([`Error::InvalidSchemaChange`]): a change that is
//!   well-formed but violates a schema rule
//! - **Unsupported requests** ([`Error::UnsupportedFeature`]): a recognized but
//!   unimplemented capability
//! - **Internal errors** ([`Error::Internal`]): bugs or unexpected states
//!
//! Batch-level DDL application wraps the unified error in [`BatchError`], which
//! tags the failure with the index of the offending statement when one can be
//! identified.

pub mod batch;
pub mod error;
pub mod result;

pub use batch::BatchError;
pub use error::{Error, ObjectKind};
pub use result::Result;
