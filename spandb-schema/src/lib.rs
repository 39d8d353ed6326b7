//! Immutable versioned schema graph and DDL batch editor.
//!
//! The schema of a database is represented by a [`SchemaGraph`]: an immutable
//! snapshot holding every table together with its columns, indexes, foreign
//! keys and interleaving relationships. Graphs are never mutated in place.
//! A [`SchemaGraphEditor`] consumes a base graph plus a batch of
//! [`DdlStatement`](spandb_plan::DdlStatement)s and produces a brand-new
//! graph, sharing unchanged tables with the base via `Arc`. The batch is
//! all-or-nothing: the first failure aborts the whole application and the
//! base graph remains the current schema.
//!
//! Readers therefore never take locks. A reader that captured an
//! `Arc<SchemaGraph>` keeps a self-consistent view of the schema for as long
//! as it holds the handle, no matter how many schema changes commit
//! concurrently.

#![forbid(unsafe_code)]

pub mod editor;
pub mod graph;
pub mod names;
pub mod node;
mod validate;

pub use editor::{EditorOptions, NamespaceMode, SchemaGraphEditor};
pub use graph::{SchemaGraph, canonical_name};
pub use names::{
    NameGenerator, RandomSuffixSource, SequentialSuffixSource, SuffixSource, not_null_check_name,
    primary_key_name,
};
pub use node::{
    Column, ForeignKey, ForeignKeyBacking, Index, IndexState, Interleave, KeyPart, Table,
};
