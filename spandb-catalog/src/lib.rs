//! `INFORMATION_SCHEMA` projection of schema graphs.
//!
//! An [`InformationSchemaCatalog`] wraps one user schema graph and projects
//! it, together with the built-in description of `INFORMATION_SCHEMA`
//! itself, into Arrow record batches: one per metadata table. Projections
//! are pure functions of the wrapped graph, so a catalog built from a graph
//! handle keeps serving a frozen, self-consistent view no matter what the
//! database publishes afterwards.
//!
//! The user schema projects under the unnamed schema (`""`); the metadata
//! tables describe themselves under `INFORMATION_SCHEMA`. Metadata rows are
//! synthesized, never stored: NOT NULL check constraints, the `PRIMARY_KEY`
//! pseudo-index and `UNIQUE` constraints for managed unique indexes all come
//! straight out of the graph at projection time.

#![forbid(unsafe_code)]

mod meta;
mod project;

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use spandb_result::{Error, ObjectKind, Result};
use spandb_schema::SchemaGraph;

/// The metadata tables a catalog can project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InformationSchemaTable {
    Schemata,
    Tables,
    Columns,
    ColumnOptions,
    Indexes,
    IndexColumns,
    TableConstraints,
    KeyColumnUsage,
    ConstraintTableUsage,
    ConstraintColumnUsage,
    ReferentialConstraints,
}

impl InformationSchemaTable {
    pub const ALL: [InformationSchemaTable; 11] = [
        InformationSchemaTable::Schemata,
        InformationSchemaTable::Tables,
        InformationSchemaTable::Columns,
        InformationSchemaTable::ColumnOptions,
        InformationSchemaTable::Indexes,
        InformationSchemaTable::IndexColumns,
        InformationSchemaTable::TableConstraints,
        InformationSchemaTable::KeyColumnUsage,
        InformationSchemaTable::ConstraintTableUsage,
        InformationSchemaTable::ConstraintColumnUsage,
        InformationSchemaTable::ReferentialConstraints,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InformationSchemaTable::Schemata => "SCHEMATA",
            InformationSchemaTable::Tables => "TABLES",
            InformationSchemaTable::Columns => "COLUMNS",
            InformationSchemaTable::ColumnOptions => "COLUMN_OPTIONS",
            InformationSchemaTable::Indexes => "INDEXES",
            InformationSchemaTable::IndexColumns => "INDEX_COLUMNS",
            InformationSchemaTable::TableConstraints => "TABLE_CONSTRAINTS",
            InformationSchemaTable::KeyColumnUsage => "KEY_COLUMN_USAGE",
            InformationSchemaTable::ConstraintTableUsage => "CONSTRAINT_TABLE_USAGE",
            InformationSchemaTable::ConstraintColumnUsage => "CONSTRAINT_COLUMN_USAGE",
            InformationSchemaTable::ReferentialConstraints => "REFERENTIAL_CONSTRAINTS",
        }
    }

    /// Case-insensitive lookup; an `INFORMATION_SCHEMA.` qualifier is
    /// accepted and stripped.
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = match name.split_once('.') {
            Some((schema, rest)) if schema.eq_ignore_ascii_case("INFORMATION_SCHEMA") => rest,
            Some(_) => return None,
            None => name,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(bare))
    }
}

/// Projects one schema graph as `INFORMATION_SCHEMA` content.
pub struct InformationSchemaCatalog {
    user: Arc<SchemaGraph>,
    meta: Arc<SchemaGraph>,
}

impl InformationSchemaCatalog {
    pub fn new(user: Arc<SchemaGraph>) -> Result<Self> {
        Ok(InformationSchemaCatalog {
            user,
            meta: meta::meta_graph()?,
        })
    }

    /// The wrapped user graph.
    pub fn user_graph(&self) -> &Arc<SchemaGraph> {
        &self.user
    }

    pub fn project(&self, table: InformationSchemaTable) -> Result<RecordBatch> {
        tracing::trace!(table = table.name(), version = self.user.version(), "projecting");
        match table {
            InformationSchemaTable::Schemata => self.build_schemata(),
            InformationSchemaTable::Tables => self.build_tables(),
            InformationSchemaTable::Columns => self.build_columns(),
            InformationSchemaTable::ColumnOptions => self.build_column_options(),
            InformationSchemaTable::Indexes => self.build_indexes(),
            InformationSchemaTable::IndexColumns => self.build_index_columns(),
            InformationSchemaTable::TableConstraints => self.build_table_constraints(),
            InformationSchemaTable::KeyColumnUsage => self.build_key_column_usage(),
            InformationSchemaTable::ConstraintTableUsage => self.build_constraint_table_usage(),
            InformationSchemaTable::ConstraintColumnUsage => self.build_constraint_column_usage(),
            InformationSchemaTable::ReferentialConstraints => self.build_referential_constraints(),
        }
    }

    /// Projects a metadata table addressed by name.
    pub fn project_by_name(&self, name: &str) -> Result<RecordBatch> {
        let table = InformationSchemaTable::from_name(name)
            .ok_or_else(|| Error::name_not_found(ObjectKind::Table, name))?;
        self.project(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_round_trip() {
        for table in InformationSchemaTable::ALL {
            assert_eq!(InformationSchemaTable::from_name(table.name()), Some(table));
        }
        assert_eq!(
            InformationSchemaTable::from_name("information_schema.tables"),
            Some(InformationSchemaTable::Tables)
        );
        assert_eq!(
            InformationSchemaTable::from_name("other_schema.tables"),
            None
        );
        assert_eq!(InformationSchemaTable::from_name("NOPE"), None);
    }
}
