//! The built-in schema graph describing `INFORMATION_SCHEMA` itself.
//!
//! The metadata tables are modeled with the same node types as user tables
//! and assembled through the ordinary editor, so the self-description rows
//! (their columns, primary keys and NOT NULL constraints) fall out of the
//! regular projection code with no special casing.

use std::sync::{Arc, OnceLock};

use spandb_plan::{ColumnDef, CreateTablePlan, DdlStatement, KeyPartDef};
use spandb_result::{Error, Result};
use spandb_schema::{NameGenerator, SchemaGraph, SchemaGraphEditor, SequentialSuffixSource};
use spandb_types::{ColumnType, ScalarType, TypeLength};

fn string_max() -> ColumnType {
    ColumnType::Scalar(ScalarType::String(TypeLength::Max))
}

fn string_100() -> ColumnType {
    ColumnType::Scalar(ScalarType::String(TypeLength::Fixed(100)))
}

fn bytes_max() -> ColumnType {
    ColumnType::Scalar(ScalarType::Bytes(TypeLength::Max))
}

fn int64() -> ColumnType {
    ColumnType::Scalar(ScalarType::Int64)
}

fn bool_type() -> ColumnType {
    ColumnType::Scalar(ScalarType::Bool)
}

/// Required (NOT NULL) column.
fn req(name: &str, ty: ColumnType) -> ColumnDef {
    ColumnDef::new(name, ty).not_null()
}

fn opt(name: &str, ty: ColumnType) -> ColumnDef {
    ColumnDef::new(name, ty)
}

fn key(columns: &[&str]) -> Vec<KeyPartDef> {
    columns.iter().map(|c| KeyPartDef::new(*c)).collect()
}

fn table(name: &str, columns: Vec<ColumnDef>, pk: &[&str]) -> DdlStatement {
    let mut plan = CreateTablePlan::new(name);
    for column in columns {
        plan = plan.with_column(column);
    }
    plan.with_primary_key(key(pk)).into()
}

fn build() -> Result<Arc<SchemaGraph>> {
    let statements = vec![
        table(
            "SCHEMATA",
            vec![req("CATALOG_NAME", string_max()), req("SCHEMA_NAME", string_max())],
            &["CATALOG_NAME", "SCHEMA_NAME"],
        ),
        table(
            "TABLES",
            vec![
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                opt("PARENT_TABLE_NAME", string_max()),
                opt("ON_DELETE_ACTION", string_max()),
                opt("SPANNER_STATE", string_max()),
            ],
            &["TABLE_CATALOG", "TABLE_SCHEMA", "TABLE_NAME"],
        ),
        table(
            "COLUMNS",
            vec![
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("COLUMN_NAME", string_max()),
                req("ORDINAL_POSITION", int64()),
                opt("COLUMN_DEFAULT", bytes_max()),
                opt("DATA_TYPE", string_max()),
                opt("IS_NULLABLE", string_max()),
                opt("SPANNER_TYPE", string_max()),
                opt("SPANNER_STATE", string_max()),
            ],
            &["TABLE_CATALOG", "TABLE_SCHEMA", "TABLE_NAME", "COLUMN_NAME"],
        ),
        table(
            "COLUMN_OPTIONS",
            vec![
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("COLUMN_NAME", string_max()),
                req("OPTION_NAME", string_max()),
                req("OPTION_TYPE", string_max()),
                req("OPTION_VALUE", string_max()),
            ],
            &[
                "TABLE_CATALOG",
                "TABLE_SCHEMA",
                "TABLE_NAME",
                "COLUMN_NAME",
                "OPTION_NAME",
            ],
        ),
        table(
            "INDEXES",
            vec![
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("INDEX_NAME", string_max()),
                req("INDEX_TYPE", string_max()),
                req("PARENT_TABLE_NAME", string_max()),
                req("IS_UNIQUE", bool_type()),
                req("IS_NULL_FILTERED", bool_type()),
                req("INDEX_STATE", string_100()),
                req("SPANNER_IS_MANAGED", bool_type()),
            ],
            &[
                "TABLE_CATALOG",
                "TABLE_SCHEMA",
                "TABLE_NAME",
                "INDEX_NAME",
                "INDEX_TYPE",
            ],
        ),
        table(
            "INDEX_COLUMNS",
            vec![
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("INDEX_NAME", string_max()),
                req("INDEX_TYPE", string_max()),
                req("COLUMN_NAME", string_max()),
                opt("ORDINAL_POSITION", int64()),
                opt("COLUMN_ORDERING", string_max()),
                opt("IS_NULLABLE", string_max()),
                opt("SPANNER_TYPE", string_max()),
            ],
            &[
                "TABLE_CATALOG",
                "TABLE_SCHEMA",
                "TABLE_NAME",
                "INDEX_NAME",
                "INDEX_TYPE",
                "COLUMN_NAME",
            ],
        ),
        table(
            "TABLE_CONSTRAINTS",
            vec![
                req("CONSTRAINT_CATALOG", string_max()),
                req("CONSTRAINT_SCHEMA", string_max()),
                req("CONSTRAINT_NAME", string_max()),
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("CONSTRAINT_TYPE", string_max()),
                req("IS_DEFERRABLE", string_max()),
                req("INITIALLY_DEFERRED", string_max()),
                req("ENFORCED", string_max()),
            ],
            &["CONSTRAINT_CATALOG", "CONSTRAINT_SCHEMA", "CONSTRAINT_NAME"],
        ),
        table(
            "KEY_COLUMN_USAGE",
            vec![
                req("CONSTRAINT_CATALOG", string_max()),
                req("CONSTRAINT_SCHEMA", string_max()),
                req("CONSTRAINT_NAME", string_max()),
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("COLUMN_NAME", string_max()),
                req("ORDINAL_POSITION", int64()),
                opt("POSITION_IN_UNIQUE_CONSTRAINT", int64()),
            ],
            &[
                "CONSTRAINT_CATALOG",
                "CONSTRAINT_SCHEMA",
                "CONSTRAINT_NAME",
                "COLUMN_NAME",
            ],
        ),
        table(
            "CONSTRAINT_TABLE_USAGE",
            vec![
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("CONSTRAINT_CATALOG", string_max()),
                req("CONSTRAINT_SCHEMA", string_max()),
                req("CONSTRAINT_NAME", string_max()),
            ],
            &[
                "TABLE_CATALOG",
                "TABLE_SCHEMA",
                "TABLE_NAME",
                "CONSTRAINT_CATALOG",
                "CONSTRAINT_SCHEMA",
                "CONSTRAINT_NAME",
            ],
        ),
        table(
            "CONSTRAINT_COLUMN_USAGE",
            vec![
                req("TABLE_CATALOG", string_max()),
                req("TABLE_SCHEMA", string_max()),
                req("TABLE_NAME", string_max()),
                req("COLUMN_NAME", string_max()),
                req("CONSTRAINT_CATALOG", string_max()),
                req("CONSTRAINT_SCHEMA", string_max()),
                req("CONSTRAINT_NAME", string_max()),
            ],
            &[
                "CONSTRAINT_CATALOG",
                "CONSTRAINT_SCHEMA",
                "CONSTRAINT_NAME",
                "COLUMN_NAME",
            ],
        ),
        table(
            "REFERENTIAL_CONSTRAINTS",
            vec![
                req("CONSTRAINT_CATALOG", string_max()),
                req("CONSTRAINT_SCHEMA", string_max()),
                req("CONSTRAINT_NAME", string_max()),
                opt("UNIQUE_CONSTRAINT_CATALOG", string_max()),
                opt("UNIQUE_CONSTRAINT_SCHEMA", string_max()),
                opt("UNIQUE_CONSTRAINT_NAME", string_max()),
                req("MATCH_OPTION", string_max()),
                req("UPDATE_RULE", string_max()),
                req("DELETE_RULE", string_max()),
                req("SPANNER_STATE", string_max()),
            ],
            &["CONSTRAINT_CATALOG", "CONSTRAINT_SCHEMA", "CONSTRAINT_NAME"],
        ),
    ];

    SchemaGraphEditor::new(SchemaGraph::empty())
        .with_name_generator(NameGenerator::new(Box::new(SequentialSuffixSource::new())))
        .apply(&statements)
        .map_err(|e| Error::internal(format!("information schema bootstrap failed: {e}")))
}

/// The shared `INFORMATION_SCHEMA` self-description, built once.
pub(crate) fn meta_graph() -> Result<Arc<SchemaGraph>> {
    static META: OnceLock<Arc<SchemaGraph>> = OnceLock::new();
    if let Some(graph) = META.get() {
        return Ok(graph.clone());
    }
    let graph = build()?;
    Ok(META.get_or_init(|| graph).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_graph_has_all_metadata_tables() {
        let graph = meta_graph().unwrap();
        assert_eq!(graph.table_count(), 11);
        let indexes = graph.table("INDEXES").unwrap();
        assert_eq!(indexes.primary_key_name(), "PK_INDEXES");
        let state = indexes.column("INDEX_STATE").unwrap();
        assert_eq!(state.column_type.to_string(), "STRING(100)");
        assert!(state.not_null);
        assert!(indexes.column("TABLE_CATALOG").unwrap().not_null);
    }

    #[test]
    fn referential_constraints_nullabilities_and_ccu_key() {
        let graph = meta_graph().unwrap();
        let rc = graph.table("REFERENTIAL_CONSTRAINTS").unwrap();
        for column in ["UNIQUE_CONSTRAINT_CATALOG", "UNIQUE_CONSTRAINT_SCHEMA", "UNIQUE_CONSTRAINT_NAME"] {
            assert!(!rc.column(column).unwrap().not_null, "{column}");
        }
        for column in ["MATCH_OPTION", "UPDATE_RULE", "DELETE_RULE", "SPANNER_STATE"] {
            assert!(rc.column(column).unwrap().not_null, "{column}");
        }

        let ccu = graph.table("CONSTRAINT_COLUMN_USAGE").unwrap();
        let key: Vec<_> = ccu.primary_key.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(
            key,
            ["CONSTRAINT_CATALOG", "CONSTRAINT_SCHEMA", "CONSTRAINT_NAME", "COLUMN_NAME"]
        );
    }

    #[test]
    fn meta_graph_is_shared() {
        let a = meta_graph().unwrap();
        let b = meta_graph().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
