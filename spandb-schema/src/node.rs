//! Node types making up a schema graph.
//!
//! All nodes are plain data. Tables own their columns, indexes and foreign
//! keys behind `Arc` so that copy-on-write table updates stay cheap: cloning
//! a [`Table`] clones a handful of pointers, not the node contents.

use std::fmt;
use std::sync::Arc;

use spandb_plan::ColumnOptionDef;
use spandb_types::{ColumnType, OnDeleteAction, SortOrder};

use crate::graph::canonical_name;

/// One part of a primary key or index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    pub column: String,
    pub order: SortOrder,
}

impl KeyPart {
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        KeyPart {
            column: column.into(),
            order,
        }
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    /// One-based position within the table.
    pub ordinal: u32,
    pub options: Vec<ColumnOptionDef>,
}

/// Lifecycle state of a secondary index.
///
/// User indexes start out `Creating` until a backfill completes; managed
/// indexes created on behalf of a foreign key are usable immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Creating,
    ReadWrite,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexState::Creating => "CREATING",
            IndexState::ReadWrite => "READ_WRITE",
        }
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secondary index.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub key_parts: Vec<KeyPart>,
    /// Non-key columns carried in index entries via `STORING`.
    pub storing: Vec<String>,
    pub unique: bool,
    pub null_filtered: bool,
    /// `INTERLEAVE IN` target, an interleave ancestor of the indexed table.
    pub interleave_in: Option<String>,
    pub state: IndexState,
    /// `true` for indexes the editor created to back a foreign key. Managed
    /// indexes cannot be dropped directly and are surfaced as `UNIQUE`
    /// constraints when unique.
    pub managed: bool,
}

impl Index {
    pub fn key_column_names(&self) -> impl Iterator<Item = &str> {
        self.key_parts.iter().map(|part| part.column.as_str())
    }

    /// Whether `column` appears in the key or the storing list.
    pub fn uses_column(&self, column: &str) -> bool {
        let canon = canonical_name(column);
        self.key_parts
            .iter()
            .any(|part| canonical_name(&part.column) == canon)
            || self.storing.iter().any(|s| canonical_name(s) == canon)
    }
}

/// How the referenced side of a foreign key is kept unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyBacking {
    /// The referenced columns are exactly the referenced table's primary key.
    PrimaryKey,
    /// A managed unique null-filtered index on the referenced table.
    ManagedIndex(String),
}

impl ForeignKeyBacking {
    /// The managed index name, if the backing is an index.
    pub fn index_name(&self) -> Option<&str> {
        match self {
            ForeignKeyBacking::PrimaryKey => None,
            ForeignKeyBacking::ManagedIndex(name) => Some(name),
        }
    }
}

/// A foreign key constraint, attached to the referencing table.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub referencing_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub backing: ForeignKeyBacking,
    /// Managed non-unique index on the referencing side, absent when the
    /// referencing columns are the table's own primary key.
    pub referencing_index: Option<String>,
}

impl ForeignKey {
    pub fn uses_referencing_column(&self, column: &str) -> bool {
        let canon = canonical_name(column);
        self.referencing_columns
            .iter()
            .any(|c| canonical_name(c) == canon)
    }

    pub fn uses_referenced_column(&self, column: &str) -> bool {
        let canon = canonical_name(column);
        self.referenced_columns
            .iter()
            .any(|c| canonical_name(c) == canon)
    }
}

/// `INTERLEAVE IN PARENT` relationship of a child table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interleave {
    pub parent: String,
    pub on_delete: OnDeleteAction,
}

/// A table node.
///
/// Column, index and foreign key order is creation order; lookups are
/// case-insensitive while display names preserve the declared casing.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Arc<Column>>,
    pub primary_key: Vec<KeyPart>,
    pub indexes: Vec<Arc<Index>>,
    pub foreign_keys: Vec<Arc<ForeignKey>>,
    pub interleave: Option<Interleave>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Arc<Column>> {
        let canon = canonical_name(name);
        self.columns.iter().find(|c| canonical_name(&c.name) == canon)
    }

    pub fn index(&self, name: &str) -> Option<&Arc<Index>> {
        let canon = canonical_name(name);
        self.indexes.iter().find(|i| canonical_name(&i.name) == canon)
    }

    pub fn foreign_key(&self, constraint_name: &str) -> Option<&Arc<ForeignKey>> {
        let canon = canonical_name(constraint_name);
        self.foreign_keys
            .iter()
            .find(|fk| canonical_name(&fk.constraint_name) == canon)
    }

    /// Name of the implicit primary key constraint, `PK_<table>`.
    pub fn primary_key_name(&self) -> String {
        crate::names::primary_key_name(&self.name)
    }

    /// Whether `column` is part of the primary key.
    pub fn is_key_column(&self, column: &str) -> bool {
        let canon = canonical_name(column);
        self.primary_key
            .iter()
            .any(|part| canonical_name(&part.column) == canon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spandb_types::ScalarType;

    fn sample_table() -> Table {
        Table {
            name: "Albums".to_string(),
            columns: vec![
                Arc::new(Column {
                    name: "AlbumId".to_string(),
                    column_type: ColumnType::Scalar(ScalarType::Int64),
                    not_null: true,
                    ordinal: 1,
                    options: Vec::new(),
                }),
                Arc::new(Column {
                    name: "Title".to_string(),
                    column_type: ColumnType::Scalar(ScalarType::String(
                        spandb_types::TypeLength::Max,
                    )),
                    not_null: false,
                    ordinal: 2,
                    options: Vec::new(),
                }),
            ],
            primary_key: vec![KeyPart::new("AlbumId", SortOrder::Asc)],
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            interleave: None,
        }
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let table = sample_table();
        assert!(table.column("albumid").is_some());
        assert_eq!(table.column("TITLE").unwrap().name, "Title");
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn primary_key_membership() {
        let table = sample_table();
        assert!(table.is_key_column("ALBUMID"));
        assert!(!table.is_key_column("Title"));
        assert_eq!(table.primary_key_name(), "PK_Albums");
    }
}
