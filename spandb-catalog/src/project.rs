//! Record batch builders for the metadata tables.
//!
//! Each builder walks the user graph and the metadata self-description in
//! schema order (`""` before `INFORMATION_SCHEMA`), collects rows, sorts
//! them by the table's stable key and columnarizes into Arrow arrays.
//! Sorting makes repeated projection of the same graph version
//! bit-identical.

use std::sync::Arc;

use arrow::array::{ArrayRef, BinaryArray, BooleanArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use spandb_result::{Error, Result};
use spandb_schema::{ForeignKeyBacking, SchemaGraph, Table, canonical_name, not_null_check_name};

use crate::InformationSchemaCatalog;

/// One projected schema: name, graph and whether its objects are committed
/// user schema (versus built-in metadata, which reports no state).
struct Source<'a> {
    schema: &'a str,
    graph: &'a SchemaGraph,
    committed: bool,
}

fn spanner_state(committed: bool) -> Option<String> {
    committed.then(|| "COMMITTED".to_string())
}

fn yes_no(nullable: bool) -> String {
    if nullable { "YES" } else { "NO" }.to_string()
}

fn record_batch(fields: Vec<Field>, arrays: Vec<ArrayRef>) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, arrays)
        .map_err(|e| Error::internal(format!("information schema batch: {e}")))
}

fn utf8(name: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Utf8, nullable)
}

/// Display name of a table's interleave parent, if any.
fn parent_name(graph: &SchemaGraph, table: &Table) -> Option<String> {
    let interleave = table.interleave.as_ref()?;
    Some(
        graph
            .table(&interleave.parent)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| interleave.parent.clone()),
    )
}

/// Key columns of the object enforcing a foreign key's referenced side.
fn backing_key_columns(graph: &SchemaGraph, fk: &spandb_schema::ForeignKey) -> Vec<String> {
    match &fk.backing {
        ForeignKeyBacking::PrimaryKey => graph
            .table(&fk.referenced_table)
            .map(|t| t.primary_key.iter().map(|p| p.column.clone()).collect())
            .unwrap_or_default(),
        ForeignKeyBacking::ManagedIndex(name) => graph
            .index(name)
            .map(|(_, i)| i.key_parts.iter().map(|p| p.column.clone()).collect())
            .unwrap_or_default(),
    }
}

/// Name of the unique constraint a foreign key resolves against.
fn backing_constraint_name(graph: &SchemaGraph, fk: &spandb_schema::ForeignKey) -> String {
    match &fk.backing {
        ForeignKeyBacking::PrimaryKey => graph
            .table(&fk.referenced_table)
            .map(|t| t.primary_key_name())
            .unwrap_or_else(|| spandb_schema::primary_key_name(&fk.referenced_table)),
        ForeignKeyBacking::ManagedIndex(name) => name.clone(),
    }
}

impl InformationSchemaCatalog {
    fn sources(&self) -> [Source<'_>; 2] {
        [
            Source {
                schema: "",
                graph: &self.user,
                committed: true,
            },
            Source {
                schema: "INFORMATION_SCHEMA",
                graph: &self.meta,
                committed: false,
            },
        ]
    }

    pub(crate) fn build_schemata(&self) -> Result<RecordBatch> {
        let mut catalogs = Vec::new();
        let mut schemas = Vec::new();
        for source in self.sources() {
            catalogs.push(String::new());
            schemas.push(source.schema.to_string());
        }
        record_batch(
            vec![utf8("CATALOG_NAME", false), utf8("SCHEMA_NAME", false)],
            vec![
                Arc::new(StringArray::from(catalogs)) as ArrayRef,
                Arc::new(StringArray::from(schemas)) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_tables(&self) -> Result<RecordBatch> {
        let mut catalogs = Vec::new();
        let mut schemas = Vec::new();
        let mut names = Vec::new();
        let mut parents: Vec<Option<String>> = Vec::new();
        let mut on_deletes: Vec<Option<String>> = Vec::new();
        let mut states: Vec<Option<String>> = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                catalogs.push(String::new());
                schemas.push(source.schema.to_string());
                names.push(table.name.clone());
                parents.push(parent_name(source.graph, table));
                on_deletes.push(
                    table
                        .interleave
                        .as_ref()
                        .map(|il| il.on_delete.as_str().to_string()),
                );
                states.push(spanner_state(source.committed));
            }
        }
        record_batch(
            vec![
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("PARENT_TABLE_NAME", true),
                utf8("ON_DELETE_ACTION", true),
                utf8("SPANNER_STATE", true),
            ],
            vec![
                Arc::new(StringArray::from(catalogs)) as ArrayRef,
                Arc::new(StringArray::from(schemas)) as ArrayRef,
                Arc::new(StringArray::from(names)) as ArrayRef,
                Arc::new(StringArray::from(parents)) as ArrayRef,
                Arc::new(StringArray::from(on_deletes)) as ArrayRef,
                Arc::new(StringArray::from(states)) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_columns(&self) -> Result<RecordBatch> {
        let mut catalogs = Vec::new();
        let mut schemas = Vec::new();
        let mut tables = Vec::new();
        let mut names = Vec::new();
        let mut ordinals = Vec::new();
        let mut nullables = Vec::new();
        let mut types = Vec::new();
        let mut states: Vec<Option<String>> = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                for column in &table.columns {
                    catalogs.push(String::new());
                    schemas.push(source.schema.to_string());
                    tables.push(table.name.clone());
                    names.push(column.name.clone());
                    ordinals.push(column.ordinal as i64);
                    nullables.push(yes_no(!column.not_null));
                    types.push(column.column_type.to_string());
                    states.push(spanner_state(source.committed));
                }
            }
        }
        let rows = names.len();
        record_batch(
            vec![
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("COLUMN_NAME", false),
                Field::new("ORDINAL_POSITION", DataType::Int64, false),
                Field::new("COLUMN_DEFAULT", DataType::Binary, true),
                utf8("DATA_TYPE", true),
                utf8("IS_NULLABLE", true),
                utf8("SPANNER_TYPE", true),
                utf8("SPANNER_STATE", true),
            ],
            vec![
                Arc::new(StringArray::from(catalogs)) as ArrayRef,
                Arc::new(StringArray::from(schemas)) as ArrayRef,
                Arc::new(StringArray::from(tables)) as ArrayRef,
                Arc::new(StringArray::from(names)) as ArrayRef,
                Arc::new(Int64Array::from(ordinals)) as ArrayRef,
                Arc::new(BinaryArray::from(vec![None::<&[u8]>; rows])) as ArrayRef,
                Arc::new(StringArray::from(vec![None::<String>; rows])) as ArrayRef,
                Arc::new(StringArray::from(
                    nullables.into_iter().map(Some).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    types.into_iter().map(Some).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(states)) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_column_options(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            table: String,
            column: String,
            name: String,
            option_type: String,
            value: String,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                for column in &table.columns {
                    for option in &column.options {
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            table: table.name.clone(),
                            column: column.name.clone(),
                            name: option.name.clone(),
                            option_type: option.value.type_name().to_string(),
                            value: option.value.render(),
                        });
                    }
                }
            }
        }
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, &a.column, &a.name).cmp(&(&b.schema, &b.table, &b.column, &b.name))
        });
        record_batch(
            vec![
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("COLUMN_NAME", false),
                utf8("OPTION_NAME", false),
                utf8("OPTION_TYPE", false),
                utf8("OPTION_VALUE", false),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); rows.len()])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.table.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.column.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.option_type.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.value.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_indexes(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            table: String,
            name: String,
            index_type: &'static str,
            parent: String,
            unique: bool,
            null_filtered: bool,
            state: Option<String>,
            managed: bool,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                // Every table exposes its primary key as a pseudo-index with
                // no lifecycle state.
                rows.push(Row {
                    schema: source.schema.to_string(),
                    table: table.name.clone(),
                    name: "PRIMARY_KEY".to_string(),
                    index_type: "PRIMARY_KEY",
                    parent: String::new(),
                    unique: true,
                    null_filtered: false,
                    state: None,
                    managed: false,
                });
                for index in &table.indexes {
                    rows.push(Row {
                        schema: source.schema.to_string(),
                        table: table.name.clone(),
                        name: index.name.clone(),
                        index_type: "INDEX",
                        parent: index.interleave_in.clone().unwrap_or_default(),
                        unique: index.unique,
                        null_filtered: index.null_filtered,
                        state: Some(index.state.as_str().to_string()),
                        managed: index.managed,
                    });
                }
            }
        }
        rows.sort_by(|a, b| (&a.schema, &a.table, &a.name).cmp(&(&b.schema, &b.table, &b.name)));
        record_batch(
            vec![
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("INDEX_NAME", false),
                utf8("INDEX_TYPE", false),
                utf8("PARENT_TABLE_NAME", false),
                Field::new("IS_UNIQUE", DataType::Boolean, false),
                Field::new("IS_NULL_FILTERED", DataType::Boolean, false),
                utf8("INDEX_STATE", true),
                Field::new("SPANNER_IS_MANAGED", DataType::Boolean, false),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); rows.len()])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.table.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.index_type.to_string()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.parent.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(BooleanArray::from(
                    rows.iter().map(|r| r.unique).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(BooleanArray::from(
                    rows.iter().map(|r| r.null_filtered).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.state.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(BooleanArray::from(
                    rows.iter().map(|r| r.managed).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_index_columns(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            table: String,
            index: String,
            index_type: &'static str,
            column: String,
            ordinal: Option<i64>,
            ordering: Option<String>,
            nullable: Option<String>,
            spanner_type: Option<String>,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                for (pos, part) in table.primary_key.iter().enumerate() {
                    let column = table.column(&part.column);
                    rows.push(Row {
                        schema: source.schema.to_string(),
                        table: table.name.clone(),
                        index: "PRIMARY_KEY".to_string(),
                        index_type: "PRIMARY_KEY",
                        column: part.column.clone(),
                        ordinal: Some(pos as i64 + 1),
                        ordering: Some(part.order.as_str().to_string()),
                        nullable: column.map(|c| yes_no(!c.not_null)),
                        spanner_type: column.map(|c| c.column_type.to_string()),
                    });
                }
                for index in &table.indexes {
                    // Stored columns carry no ordinal or ordering and sort
                    // ahead of the key columns.
                    for stored in &index.storing {
                        let column = table.column(stored);
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            table: table.name.clone(),
                            index: index.name.clone(),
                            index_type: "INDEX",
                            column: stored.clone(),
                            ordinal: None,
                            ordering: None,
                            nullable: column.map(|c| yes_no(!c.not_null)),
                            spanner_type: column.map(|c| c.column_type.to_string()),
                        });
                    }
                    for (pos, part) in index.key_parts.iter().enumerate() {
                        let column = table.column(&part.column);
                        // Null-filtered indexes drop rows with null key
                        // columns, so their key columns read as NOT NULL.
                        let nullable = column.map(|c| {
                            if index.null_filtered {
                                yes_no(false)
                            } else {
                                yes_no(!c.not_null)
                            }
                        });
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            table: table.name.clone(),
                            index: index.name.clone(),
                            index_type: "INDEX",
                            column: part.column.clone(),
                            ordinal: Some(pos as i64 + 1),
                            ordering: Some(part.order.as_str().to_string()),
                            nullable,
                            spanner_type: column.map(|c| c.column_type.to_string()),
                        });
                    }
                }
            }
        }
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, &a.index, &a.ordinal, &a.column)
                .cmp(&(&b.schema, &b.table, &b.index, &b.ordinal, &b.column))
        });
        record_batch(
            vec![
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("INDEX_NAME", false),
                utf8("INDEX_TYPE", false),
                utf8("COLUMN_NAME", false),
                Field::new("ORDINAL_POSITION", DataType::Int64, true),
                utf8("COLUMN_ORDERING", true),
                utf8("IS_NULLABLE", true),
                utf8("SPANNER_TYPE", true),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); rows.len()])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.table.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.index.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.index_type.to_string()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.column.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(Int64Array::from(
                    rows.iter().map(|r| r.ordinal).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.ordering.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.nullable.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.spanner_type.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )
    }

    /// Constraint rows of one table: NOT NULL checks, the primary key,
    /// foreign keys, and `UNIQUE` for each managed unique index. User
    /// (non-managed) unique indexes stay plain indexes and surface no
    /// constraint row.
    fn constraint_rows(&self, table: &Table) -> Vec<(String, &'static str)> {
        let mut rows = Vec::new();
        for column in &table.columns {
            if column.not_null {
                rows.push((not_null_check_name(&table.name, &column.name), "CHECK"));
            }
        }
        rows.push((table.primary_key_name(), "PRIMARY KEY"));
        for fk in &table.foreign_keys {
            rows.push((fk.constraint_name.clone(), "FOREIGN KEY"));
        }
        for index in &table.indexes {
            if index.managed && index.unique {
                rows.push((index.name.clone(), "UNIQUE"));
            }
        }
        rows
    }

    pub(crate) fn build_table_constraints(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            name: String,
            table: String,
            constraint_type: &'static str,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                for (name, constraint_type) in self.constraint_rows(table) {
                    rows.push(Row {
                        schema: source.schema.to_string(),
                        name,
                        table: table.name.clone(),
                        constraint_type,
                    });
                }
            }
        }
        rows.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        let n = rows.len();
        record_batch(
            vec![
                utf8("CONSTRAINT_CATALOG", false),
                utf8("CONSTRAINT_SCHEMA", false),
                utf8("CONSTRAINT_NAME", false),
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("CONSTRAINT_TYPE", false),
                utf8("IS_DEFERRABLE", false),
                utf8("INITIALLY_DEFERRED", false),
                utf8("ENFORCED", false),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.table.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter()
                        .map(|r| r.constraint_type.to_string())
                        .collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(vec!["NO".to_string(); n])) as ArrayRef,
                Arc::new(StringArray::from(vec!["NO".to_string(); n])) as ArrayRef,
                Arc::new(StringArray::from(vec!["YES".to_string(); n])) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_key_column_usage(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            constraint: String,
            table: String,
            column: String,
            ordinal: i64,
            in_unique: Option<i64>,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                let pk_name = table.primary_key_name();
                for (pos, part) in table.primary_key.iter().enumerate() {
                    rows.push(Row {
                        schema: source.schema.to_string(),
                        constraint: pk_name.clone(),
                        table: table.name.clone(),
                        column: part.column.clone(),
                        ordinal: pos as i64 + 1,
                        in_unique: None,
                    });
                }
                for index in &table.indexes {
                    if !(index.managed && index.unique) {
                        continue;
                    }
                    for (pos, part) in index.key_parts.iter().enumerate() {
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            constraint: index.name.clone(),
                            table: table.name.clone(),
                            column: part.column.clone(),
                            ordinal: pos as i64 + 1,
                            in_unique: None,
                        });
                    }
                }
                for fk in &table.foreign_keys {
                    let backing_key = backing_key_columns(source.graph, fk);
                    for (pos, (column, referenced)) in fk
                        .referencing_columns
                        .iter()
                        .zip(&fk.referenced_columns)
                        .enumerate()
                    {
                        let in_unique = backing_key
                            .iter()
                            .position(|k| canonical_name(k) == canonical_name(referenced))
                            .map(|p| p as i64 + 1);
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            constraint: fk.constraint_name.clone(),
                            table: table.name.clone(),
                            column: column.clone(),
                            ordinal: pos as i64 + 1,
                            in_unique,
                        });
                    }
                }
            }
        }
        rows.sort_by(|a, b| {
            (&a.schema, &a.constraint, &a.table, a.ordinal)
                .cmp(&(&b.schema, &b.constraint, &b.table, b.ordinal))
        });
        let n = rows.len();
        record_batch(
            vec![
                utf8("CONSTRAINT_CATALOG", false),
                utf8("CONSTRAINT_SCHEMA", false),
                utf8("CONSTRAINT_NAME", false),
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("COLUMN_NAME", false),
                Field::new("ORDINAL_POSITION", DataType::Int64, false),
                Field::new("POSITION_IN_UNIQUE_CONSTRAINT", DataType::Int64, true),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.constraint.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.table.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.column.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(Int64Array::from(
                    rows.iter().map(|r| r.ordinal).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(Int64Array::from(
                    rows.iter().map(|r| r.in_unique).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_constraint_table_usage(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            table: String,
            constraint: String,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                for (name, constraint_type) in self.constraint_rows(table) {
                    // A foreign key is "used by" the table it references.
                    let used_table = if constraint_type == "FOREIGN KEY" {
                        table
                            .foreign_key(&name)
                            .and_then(|fk| source.graph.table(&fk.referenced_table))
                            .map(|t| t.name.clone())
                            .unwrap_or_else(|| table.name.clone())
                    } else {
                        table.name.clone()
                    };
                    rows.push(Row {
                        schema: source.schema.to_string(),
                        table: used_table,
                        constraint: name,
                    });
                }
            }
        }
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, &a.constraint).cmp(&(&b.schema, &b.table, &b.constraint))
        });
        let n = rows.len();
        record_batch(
            vec![
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("CONSTRAINT_CATALOG", false),
                utf8("CONSTRAINT_SCHEMA", false),
                utf8("CONSTRAINT_NAME", false),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.table.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.constraint.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_constraint_column_usage(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            table: String,
            column: String,
            constraint: String,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                for column in &table.columns {
                    if column.not_null {
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            table: table.name.clone(),
                            column: column.name.clone(),
                            constraint: not_null_check_name(&table.name, &column.name),
                        });
                    }
                }
                for part in &table.primary_key {
                    rows.push(Row {
                        schema: source.schema.to_string(),
                        table: table.name.clone(),
                        column: part.column.clone(),
                        constraint: table.primary_key_name(),
                    });
                }
                for index in &table.indexes {
                    if !(index.managed && index.unique) {
                        continue;
                    }
                    for part in &index.key_parts {
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            table: table.name.clone(),
                            column: part.column.clone(),
                            constraint: index.name.clone(),
                        });
                    }
                }
                for fk in &table.foreign_keys {
                    // Foreign keys use the referenced table's columns.
                    let referenced = source
                        .graph
                        .table(&fk.referenced_table)
                        .map(|t| t.name.clone())
                        .unwrap_or_else(|| fk.referenced_table.clone());
                    for column in &fk.referenced_columns {
                        rows.push(Row {
                            schema: source.schema.to_string(),
                            table: referenced.clone(),
                            column: column.clone(),
                            constraint: fk.constraint_name.clone(),
                        });
                    }
                }
            }
        }
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, &a.column, &a.constraint)
                .cmp(&(&b.schema, &b.table, &b.column, &b.constraint))
        });
        let n = rows.len();
        record_batch(
            vec![
                utf8("TABLE_CATALOG", false),
                utf8("TABLE_SCHEMA", false),
                utf8("TABLE_NAME", false),
                utf8("COLUMN_NAME", false),
                utf8("CONSTRAINT_CATALOG", false),
                utf8("CONSTRAINT_SCHEMA", false),
                utf8("CONSTRAINT_NAME", false),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.table.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.column.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.constraint.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )
    }

    pub(crate) fn build_referential_constraints(&self) -> Result<RecordBatch> {
        struct Row {
            schema: String,
            name: String,
            unique_constraint: String,
        }
        let mut rows = Vec::new();
        for source in self.sources() {
            for table in source.graph.tables_sorted() {
                for fk in &table.foreign_keys {
                    rows.push(Row {
                        schema: source.schema.to_string(),
                        name: fk.constraint_name.clone(),
                        unique_constraint: backing_constraint_name(source.graph, fk),
                    });
                }
            }
        }
        rows.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        let n = rows.len();
        record_batch(
            vec![
                utf8("CONSTRAINT_CATALOG", false),
                utf8("CONSTRAINT_SCHEMA", false),
                utf8("CONSTRAINT_NAME", false),
                utf8("UNIQUE_CONSTRAINT_CATALOG", true),
                utf8("UNIQUE_CONSTRAINT_SCHEMA", true),
                utf8("UNIQUE_CONSTRAINT_NAME", true),
                utf8("MATCH_OPTION", false),
                utf8("UPDATE_RULE", false),
                utf8("DELETE_RULE", false),
                utf8("SPANNER_STATE", false),
            ],
            vec![
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(vec![String::new(); n])) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.schema.clone()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    rows.iter()
                        .map(|r| Some(r.unique_constraint.clone()))
                        .collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(vec!["SIMPLE".to_string(); n])) as ArrayRef,
                Arc::new(StringArray::from(vec!["NO ACTION".to_string(); n])) as ArrayRef,
                Arc::new(StringArray::from(vec!["NO ACTION".to_string(); n])) as ArrayRef,
                Arc::new(StringArray::from(vec!["COMMITTED".to_string(); n])) as ArrayRef,
            ],
        )
    }
}
