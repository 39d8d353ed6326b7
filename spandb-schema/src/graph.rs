//! The immutable, versioned schema graph.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use spandb_result::{Error, ObjectKind, Result};

use crate::node::{ForeignKey, Index, IndexState, Table};

/// Canonical form of an object name, used as the lookup key everywhere.
/// Display casing is preserved on the nodes themselves.
pub fn canonical_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// An immutable snapshot of a database schema.
///
/// A graph is only ever produced whole, either empty or by a
/// [`SchemaGraphEditor`](crate::editor::SchemaGraphEditor) batch application.
/// Every successful application yields a new graph with a version one higher
/// than its base; tables untouched by the batch are shared with the base via
/// `Arc`.
#[derive(Debug)]
pub struct SchemaGraph {
    version: u64,
    /// Canonical table name to table node.
    tables: FxHashMap<String, Arc<Table>>,
    /// Canonical index name to canonical owning table name.
    indexes: FxHashMap<String, String>,
    /// Canonical constraint name (primary keys and foreign keys) to
    /// canonical owning table name.
    constraints: FxHashMap<String, String>,
}

impl SchemaGraph {
    /// The empty schema, version 0.
    pub fn empty() -> Arc<Self> {
        Arc::new(SchemaGraph {
            version: 0,
            tables: FxHashMap::default(),
            indexes: FxHashMap::default(),
            constraints: FxHashMap::default(),
        })
    }

    /// Builds a graph from a finished table set, deriving the index and
    /// constraint lookup maps from the nodes.
    pub(crate) fn from_tables(version: u64, tables: FxHashMap<String, Arc<Table>>) -> Arc<Self> {
        let mut indexes = FxHashMap::default();
        let mut constraints = FxHashMap::default();
        for (key, table) in &tables {
            constraints.insert(canonical_name(&table.primary_key_name()), key.clone());
            for index in &table.indexes {
                indexes.insert(canonical_name(&index.name), key.clone());
            }
            for fk in &table.foreign_keys {
                constraints.insert(canonical_name(&fk.constraint_name), key.clone());
            }
        }
        Arc::new(SchemaGraph {
            version,
            tables,
            indexes,
            constraints,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Case-insensitive table lookup.
    pub fn table(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.get(&canonical_name(name))
    }

    /// All tables, ordered by case-insensitive name.
    pub fn tables_sorted(&self) -> Vec<&Arc<Table>> {
        let mut tables: Vec<_> = self.tables.values().collect();
        tables.sort_by(|a, b| canonical_name(&a.name).cmp(&canonical_name(&b.name)));
        tables
    }

    /// Case-insensitive index lookup, returning the owning table as well.
    pub fn index(&self, name: &str) -> Option<(&Arc<Table>, &Arc<Index>)> {
        let table_key = self.indexes.get(&canonical_name(name))?;
        let table = self.tables.get(table_key)?;
        let index = table.index(name)?;
        Some((table, index))
    }

    /// The table owning named constraint (a primary key or foreign key).
    pub fn constraint_table(&self, name: &str) -> Option<&Arc<Table>> {
        let table_key = self.constraints.get(&canonical_name(name))?;
        self.tables.get(table_key)
    }

    /// Tables interleaved directly under `parent`, ordered by name.
    pub fn interleaved_children(&self, parent: &str) -> Vec<&Arc<Table>> {
        let parent_key = canonical_name(parent);
        let mut children: Vec<_> = self
            .tables
            .values()
            .filter(|t| {
                t.interleave
                    .as_ref()
                    .is_some_and(|il| canonical_name(&il.parent) == parent_key)
            })
            .collect();
        children.sort_by(|a, b| canonical_name(&a.name).cmp(&canonical_name(&b.name)));
        children
    }

    /// Foreign keys on any table that reference `table`, with their owning
    /// (referencing) tables.
    pub fn referencing_foreign_keys(&self, table: &str) -> Vec<(&Arc<Table>, &Arc<ForeignKey>)> {
        let target = canonical_name(table);
        let mut found = Vec::new();
        for owner in self.tables.values() {
            for fk in &owner.foreign_keys {
                if canonical_name(&fk.referenced_table) == target {
                    found.push((owner, fk));
                }
            }
        }
        found
    }

    /// Produces a new graph in which the named index has reached
    /// `READ_WRITE`, typically after an index backfill completes. The new
    /// graph's version is one higher. Returns the same content unchanged
    /// (still as a fresh version) when the index is already `READ_WRITE`.
    pub fn with_index_read_write(&self, index_name: &str) -> Result<Arc<SchemaGraph>> {
        let canon = canonical_name(index_name);
        let table_key = self
            .indexes
            .get(&canon)
            .ok_or_else(|| Error::name_not_found(ObjectKind::Index, index_name))?
            .clone();
        let table = self
            .tables
            .get(&table_key)
            .ok_or_else(|| Error::internal(format!("index map points at missing table {table_key}")))?;

        let mut updated = (**table).clone();
        let mut found = false;
        for slot in &mut updated.indexes {
            if canonical_name(&slot.name) == canon {
                let mut index = (**slot).clone();
                index.state = IndexState::ReadWrite;
                *slot = Arc::new(index);
                found = true;
            }
        }
        if !found {
            return Err(Error::internal(format!(
                "index map entry for {index_name} missing on its table"
            )));
        }

        let mut tables = self.tables.clone();
        tables.insert(table_key, Arc::new(updated));
        Ok(SchemaGraph::from_tables(self.version + 1, tables))
    }

    pub(crate) fn tables_map(&self) -> &FxHashMap<String, Arc<Table>> {
        &self.tables
    }

    pub(crate) fn indexes_map(&self) -> &FxHashMap<String, String> {
        &self.indexes
    }

    pub(crate) fn constraints_map(&self) -> &FxHashMap<String, String> {
        &self.constraints
    }
}
