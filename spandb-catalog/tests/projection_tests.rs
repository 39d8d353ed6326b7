//! Row-level checks for the metadata table projections.

use std::sync::Arc;

use arrow::array::{Array, BooleanArray, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use spandb_catalog::{InformationSchemaCatalog, InformationSchemaTable};
use spandb_plan::{
    ColumnDef, CreateIndexPlan, CreateTablePlan, DdlStatement, ForeignKeyDef, KeyPartDef,
    OptionValue,
};
use spandb_result::{Error, ObjectKind};
use spandb_schema::{NameGenerator, SchemaGraph, SchemaGraphEditor, SequentialSuffixSource};
use spandb_types::{ColumnType, OnDeleteAction, ScalarType, TypeLength};

fn scalar(ty: ScalarType) -> ColumnType {
    ColumnType::Scalar(ty)
}

fn string(len: u32) -> ColumnType {
    scalar(ScalarType::String(TypeLength::Fixed(len)))
}

fn apply(base: &Arc<SchemaGraph>, statements: Vec<DdlStatement>) -> Arc<SchemaGraph> {
    SchemaGraphEditor::new(base.clone())
        .with_name_generator(NameGenerator::new(Box::new(SequentialSuffixSource::new())))
        .apply(&statements)
        .expect("batch should apply")
}

/// Interleaved parent/child pair with a secondary index, covering most
/// column types.
fn music_graph() -> Arc<SchemaGraph> {
    let singers = CreateTablePlan::new("Singers")
        .with_column(ColumnDef::new("SingerId", scalar(ScalarType::Int64)).not_null())
        .with_column(ColumnDef::new("Name", string(100)))
        .with_column(ColumnDef::new("Active", scalar(ScalarType::Bool)))
        .with_column(ColumnDef::new("Royalties", scalar(ScalarType::Float64)))
        .with_column(ColumnDef::new(
            "Photo",
            scalar(ScalarType::Bytes(TypeLength::Max)),
        ))
        .with_column(
            ColumnDef::new("LastUpdated", scalar(ScalarType::Timestamp))
                .with_option("allow_commit_timestamp", OptionValue::Bool(true)),
        )
        .with_column(ColumnDef::new("BirthDate", scalar(ScalarType::Date)))
        .with_column(ColumnDef::new(
            "Genres",
            ColumnType::Array(ScalarType::String(TypeLength::Max)),
        ))
        .with_primary_key(vec![KeyPartDef::new("SingerId")]);
    let albums = CreateTablePlan::new("Albums")
        .with_column(ColumnDef::new("SingerId", scalar(ScalarType::Int64)).not_null())
        .with_column(ColumnDef::new("AlbumId", scalar(ScalarType::Int64)).not_null())
        .with_column(ColumnDef::new("Title", string(256)).not_null())
        .with_column(ColumnDef::new("Released", scalar(ScalarType::Date)))
        .with_primary_key(vec![KeyPartDef::new("SingerId"), KeyPartDef::new("AlbumId")])
        .interleave_in_parent("Singers", OnDeleteAction::Cascade);
    let by_title = CreateIndexPlan::new("AlbumsByTitle", "Albums")
        .with_key_parts(vec![KeyPartDef::new("SingerId"), KeyPartDef::desc("Title")])
        .storing(vec!["Released".to_string()])
        .null_filtered()
        .interleave_in("Singers");
    apply(
        &SchemaGraph::empty(),
        vec![singers.into(), albums.into(), by_title.into()],
    )
}

/// Foreign key to a non-key column, forcing managed backing indexes on both
/// sides. Sequential suffixes make the generated names stable.
fn fk_graph() -> Arc<SchemaGraph> {
    let users = CreateTablePlan::new("Users")
        .with_column(ColumnDef::new("UserId", scalar(ScalarType::Int64)).not_null())
        .with_column(
            ColumnDef::new("Name", scalar(ScalarType::String(TypeLength::Max))),
        )
        .with_primary_key(vec![KeyPartDef::new("UserId")]);
    let orders = CreateTablePlan::new("Orders")
        .with_column(ColumnDef::new("OrderId", scalar(ScalarType::Int64)).not_null())
        .with_column(
            ColumnDef::new("Email", scalar(ScalarType::String(TypeLength::Max))),
        )
        .with_primary_key(vec![KeyPartDef::new("OrderId")])
        .with_foreign_key(ForeignKeyDef::new(
            vec!["Email".to_string()],
            "Users",
            vec!["Name".to_string()],
        ));
    apply(&SchemaGraph::empty(), vec![users.into(), orders.into()])
}

const USERS_UNIQUE_INDEX: &str = "IDX_Users_Name_U_0000000000000000";
const ORDERS_FK_INDEX: &str = "IDX_Orders_Email_N_0000000000000001";
const ORDERS_FK: &str = "FK_Orders_Users_0000000000000002";

fn catalog(graph: Arc<SchemaGraph>) -> InformationSchemaCatalog {
    InformationSchemaCatalog::new(graph).expect("metadata bootstrap")
}

fn project(catalog: &InformationSchemaCatalog, table: InformationSchemaTable) -> RecordBatch {
    catalog.project(table).expect("projection")
}

fn col_str(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let array = batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap_or_else(|| panic!("{name} is not a string column"));
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i).to_string()))
        .collect()
}

fn col_i64(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    let array = batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap_or_else(|| panic!("{name} is not an int64 column"));
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i)))
        .collect()
}

fn col_bool(batch: &RecordBatch, name: &str) -> Vec<Option<bool>> {
    let array = batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
        .as_any()
        .downcast_ref::<BooleanArray>()
        .unwrap_or_else(|| panic!("{name} is not a boolean column"));
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i)))
        .collect()
}

/// Indices of the rows belonging to the user schema.
fn user_rows(schemas: &[Option<String>]) -> Vec<usize> {
    schemas
        .iter()
        .enumerate()
        .filter(|(_, s)| s.as_deref() == Some(""))
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn schemata_lists_the_default_and_metadata_schemas() {
    let catalog = catalog(SchemaGraph::empty());
    let batch = project(&catalog, InformationSchemaTable::Schemata);

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(
        col_str(&batch, "SCHEMA_NAME"),
        vec![Some(String::new()), Some("INFORMATION_SCHEMA".to_string())]
    );
    assert_eq!(
        col_str(&batch, "CATALOG_NAME"),
        vec![Some(String::new()), Some(String::new())]
    );
}

#[test]
fn tables_reports_interleaving_and_state() {
    let catalog = catalog(music_graph());
    let batch = project(&catalog, InformationSchemaTable::Tables);

    let schemas = col_str(&batch, "TABLE_SCHEMA");
    let names = col_str(&batch, "TABLE_NAME");
    let parents = col_str(&batch, "PARENT_TABLE_NAME");
    let on_deletes = col_str(&batch, "ON_DELETE_ACTION");
    let states = col_str(&batch, "SPANNER_STATE");

    let user = user_rows(&schemas);
    assert_eq!(user.len(), 2);
    let albums = user[0];
    let singers = user[1];
    assert_eq!(names[albums].as_deref(), Some("Albums"));
    assert_eq!(parents[albums].as_deref(), Some("Singers"));
    assert_eq!(on_deletes[albums].as_deref(), Some("CASCADE"));
    assert_eq!(states[albums].as_deref(), Some("COMMITTED"));
    assert_eq!(names[singers].as_deref(), Some("Singers"));
    assert_eq!(parents[singers], None);
    assert_eq!(on_deletes[singers], None);

    // The metadata schema describes itself without a state.
    let meta: Vec<_> = (0..batch.num_rows()).filter(|i| !user.contains(i)).collect();
    assert_eq!(meta.len(), 11);
    for i in meta {
        assert_eq!(schemas[i].as_deref(), Some("INFORMATION_SCHEMA"));
        assert_eq!(states[i], None);
    }
}

#[test]
fn columns_render_canonical_type_strings() {
    let catalog = catalog(music_graph());
    let batch = project(&catalog, InformationSchemaTable::Columns);

    let schemas = col_str(&batch, "TABLE_SCHEMA");
    let tables = col_str(&batch, "TABLE_NAME");
    let names = col_str(&batch, "COLUMN_NAME");
    let ordinals = col_i64(&batch, "ORDINAL_POSITION");
    let nullables = col_str(&batch, "IS_NULLABLE");
    let types = col_str(&batch, "SPANNER_TYPE");
    let data_types = col_str(&batch, "DATA_TYPE");

    let singer_rows: Vec<_> = (0..batch.num_rows())
        .filter(|&i| schemas[i].as_deref() == Some("") && tables[i].as_deref() == Some("Singers"))
        .collect();
    assert_eq!(singer_rows.len(), 8);

    let expected = [
        ("SingerId", "INT64", "NO"),
        ("Name", "STRING(100)", "YES"),
        ("Active", "BOOL", "YES"),
        ("Royalties", "FLOAT64", "YES"),
        ("Photo", "BYTES(MAX)", "YES"),
        ("LastUpdated", "TIMESTAMP", "YES"),
        ("BirthDate", "DATE", "YES"),
        ("Genres", "ARRAY<STRING(MAX)>", "YES"),
    ];
    for (pos, (name, spanner_type, nullable)) in expected.iter().enumerate() {
        let row = singer_rows[pos];
        assert_eq!(names[row].as_deref(), Some(*name));
        assert_eq!(ordinals[row], Some(pos as i64 + 1));
        assert_eq!(types[row].as_deref(), Some(*spanner_type));
        assert_eq!(nullables[row].as_deref(), Some(*nullable));
        assert_eq!(data_types[row], None);
    }
}

#[test]
fn column_options_surface_commit_timestamp() {
    let catalog = catalog(music_graph());
    let batch = project(&catalog, InformationSchemaTable::ColumnOptions);

    assert_eq!(batch.num_rows(), 1);
    assert_eq!(col_str(&batch, "TABLE_NAME")[0].as_deref(), Some("Singers"));
    assert_eq!(
        col_str(&batch, "COLUMN_NAME")[0].as_deref(),
        Some("LastUpdated")
    );
    assert_eq!(
        col_str(&batch, "OPTION_NAME")[0].as_deref(),
        Some("allow_commit_timestamp")
    );
    assert_eq!(col_str(&batch, "OPTION_TYPE")[0].as_deref(), Some("BOOL"));
    assert_eq!(col_str(&batch, "OPTION_VALUE")[0].as_deref(), Some("TRUE"));
}

#[test]
fn indexes_include_the_primary_key_pseudo_index() {
    let catalog = catalog(music_graph());
    let batch = project(&catalog, InformationSchemaTable::Indexes);

    let schemas = col_str(&batch, "TABLE_SCHEMA");
    let tables = col_str(&batch, "TABLE_NAME");
    let names = col_str(&batch, "INDEX_NAME");
    let types = col_str(&batch, "INDEX_TYPE");
    let parents = col_str(&batch, "PARENT_TABLE_NAME");
    let uniques = col_bool(&batch, "IS_UNIQUE");
    let filtered = col_bool(&batch, "IS_NULL_FILTERED");
    let states = col_str(&batch, "INDEX_STATE");
    let managed = col_bool(&batch, "SPANNER_IS_MANAGED");

    let user = user_rows(&schemas);
    // Albums: AlbumsByTitle then PRIMARY_KEY; Singers: PRIMARY_KEY.
    assert_eq!(user.len(), 3);
    let by_title = user[0];
    assert_eq!(tables[by_title].as_deref(), Some("Albums"));
    assert_eq!(names[by_title].as_deref(), Some("AlbumsByTitle"));
    assert_eq!(types[by_title].as_deref(), Some("INDEX"));
    assert_eq!(parents[by_title].as_deref(), Some("Singers"));
    assert_eq!(uniques[by_title], Some(false));
    assert_eq!(filtered[by_title], Some(true));
    assert_eq!(states[by_title].as_deref(), Some("CREATING"));
    assert_eq!(managed[by_title], Some(false));

    for &row in &user[1..] {
        assert_eq!(names[row].as_deref(), Some("PRIMARY_KEY"));
        assert_eq!(types[row].as_deref(), Some("PRIMARY_KEY"));
        assert_eq!(parents[row].as_deref(), Some(""));
        assert_eq!(uniques[row], Some(true));
        assert_eq!(states[row], None);
        assert_eq!(managed[row], Some(false));
    }
}

#[test]
fn index_columns_order_storing_before_keys() {
    let catalog = catalog(music_graph());
    let batch = project(&catalog, InformationSchemaTable::IndexColumns);

    let schemas = col_str(&batch, "TABLE_SCHEMA");
    let indexes = col_str(&batch, "INDEX_NAME");
    let columns = col_str(&batch, "COLUMN_NAME");
    let ordinals = col_i64(&batch, "ORDINAL_POSITION");
    let orderings = col_str(&batch, "COLUMN_ORDERING");
    let nullables = col_str(&batch, "IS_NULLABLE");

    let by_title: Vec<_> = (0..batch.num_rows())
        .filter(|&i| {
            schemas[i].as_deref() == Some("") && indexes[i].as_deref() == Some("AlbumsByTitle")
        })
        .collect();
    assert_eq!(by_title.len(), 3);

    // Stored column: no ordinal, no ordering.
    assert_eq!(columns[by_title[0]].as_deref(), Some("Released"));
    assert_eq!(ordinals[by_title[0]], None);
    assert_eq!(orderings[by_title[0]], None);
    assert_eq!(nullables[by_title[0]].as_deref(), Some("YES"));

    assert_eq!(columns[by_title[1]].as_deref(), Some("SingerId"));
    assert_eq!(ordinals[by_title[1]], Some(1));
    assert_eq!(orderings[by_title[1]].as_deref(), Some("ASC"));

    // Null-filtered key columns read as NOT NULL.
    assert_eq!(columns[by_title[2]].as_deref(), Some("Title"));
    assert_eq!(ordinals[by_title[2]], Some(2));
    assert_eq!(orderings[by_title[2]].as_deref(), Some("DESC"));
    assert_eq!(nullables[by_title[2]].as_deref(), Some("NO"));
}

#[test]
fn table_constraints_synthesize_checks_and_uniques() {
    let catalog = catalog(fk_graph());
    let batch = project(&catalog, InformationSchemaTable::TableConstraints);

    let schemas = col_str(&batch, "CONSTRAINT_SCHEMA");
    let names = col_str(&batch, "CONSTRAINT_NAME");
    let tables = col_str(&batch, "TABLE_NAME");
    let types = col_str(&batch, "CONSTRAINT_TYPE");
    let enforced = col_str(&batch, "ENFORCED");

    let user = user_rows(&schemas);
    let rows: Vec<_> = user
        .iter()
        .map(|&i| {
            (
                names[i].clone().unwrap(),
                tables[i].clone().unwrap(),
                types[i].clone().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                "CK_IS_NOT_NULL_Orders_OrderId".to_string(),
                "Orders".to_string(),
                "CHECK".to_string()
            ),
            (
                "CK_IS_NOT_NULL_Users_UserId".to_string(),
                "Users".to_string(),
                "CHECK".to_string()
            ),
            (
                ORDERS_FK.to_string(),
                "Orders".to_string(),
                "FOREIGN KEY".to_string()
            ),
            (
                USERS_UNIQUE_INDEX.to_string(),
                "Users".to_string(),
                "UNIQUE".to_string()
            ),
            (
                "PK_Orders".to_string(),
                "Orders".to_string(),
                "PRIMARY KEY".to_string()
            ),
            (
                "PK_Users".to_string(),
                "Users".to_string(),
                "PRIMARY KEY".to_string()
            ),
        ]
    );
    for &i in &user {
        assert_eq!(enforced[i].as_deref(), Some("YES"));
    }
}

#[test]
fn key_column_usage_links_foreign_keys_to_their_backing_key() {
    let catalog = catalog(fk_graph());
    let batch = project(&catalog, InformationSchemaTable::KeyColumnUsage);

    let schemas = col_str(&batch, "CONSTRAINT_SCHEMA");
    let constraints = col_str(&batch, "CONSTRAINT_NAME");
    let tables = col_str(&batch, "TABLE_NAME");
    let columns = col_str(&batch, "COLUMN_NAME");
    let ordinals = col_i64(&batch, "ORDINAL_POSITION");
    let positions = col_i64(&batch, "POSITION_IN_UNIQUE_CONSTRAINT");

    let user = user_rows(&schemas);
    let rows: Vec<_> = user
        .iter()
        .map(|&i| {
            (
                constraints[i].clone().unwrap(),
                tables[i].clone().unwrap(),
                columns[i].clone().unwrap(),
                ordinals[i].unwrap(),
                positions[i],
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                ORDERS_FK.to_string(),
                "Orders".to_string(),
                "Email".to_string(),
                1,
                Some(1)
            ),
            (
                USERS_UNIQUE_INDEX.to_string(),
                "Users".to_string(),
                "Name".to_string(),
                1,
                None
            ),
            (
                "PK_Orders".to_string(),
                "Orders".to_string(),
                "OrderId".to_string(),
                1,
                None
            ),
            (
                "PK_Users".to_string(),
                "Users".to_string(),
                "UserId".to_string(),
                1,
                None
            ),
        ]
    );
}

#[test]
fn constraint_table_usage_attributes_foreign_keys_to_the_referenced_table() {
    let catalog = catalog(fk_graph());
    let batch = project(&catalog, InformationSchemaTable::ConstraintTableUsage);

    let schemas = col_str(&batch, "TABLE_SCHEMA");
    let tables = col_str(&batch, "TABLE_NAME");
    let constraints = col_str(&batch, "CONSTRAINT_NAME");

    let user = user_rows(&schemas);
    let rows: Vec<_> = user
        .iter()
        .map(|&i| (tables[i].clone().unwrap(), constraints[i].clone().unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                "Orders".to_string(),
                "CK_IS_NOT_NULL_Orders_OrderId".to_string()
            ),
            ("Orders".to_string(), "PK_Orders".to_string()),
            (
                "Users".to_string(),
                "CK_IS_NOT_NULL_Users_UserId".to_string()
            ),
            ("Users".to_string(), ORDERS_FK.to_string()),
            ("Users".to_string(), USERS_UNIQUE_INDEX.to_string()),
            ("Users".to_string(), "PK_Users".to_string()),
        ]
    );
}

#[test]
fn constraint_column_usage_lists_referenced_columns() {
    let catalog = catalog(fk_graph());
    let batch = project(&catalog, InformationSchemaTable::ConstraintColumnUsage);

    let schemas = col_str(&batch, "TABLE_SCHEMA");
    let tables = col_str(&batch, "TABLE_NAME");
    let columns = col_str(&batch, "COLUMN_NAME");
    let constraints = col_str(&batch, "CONSTRAINT_NAME");

    let user = user_rows(&schemas);
    let rows: Vec<_> = user
        .iter()
        .map(|&i| {
            (
                tables[i].clone().unwrap(),
                columns[i].clone().unwrap(),
                constraints[i].clone().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                "Orders".to_string(),
                "OrderId".to_string(),
                "CK_IS_NOT_NULL_Orders_OrderId".to_string()
            ),
            (
                "Orders".to_string(),
                "OrderId".to_string(),
                "PK_Orders".to_string()
            ),
            (
                "Users".to_string(),
                "Name".to_string(),
                ORDERS_FK.to_string()
            ),
            (
                "Users".to_string(),
                "Name".to_string(),
                USERS_UNIQUE_INDEX.to_string()
            ),
            (
                "Users".to_string(),
                "UserId".to_string(),
                "CK_IS_NOT_NULL_Users_UserId".to_string()
            ),
            (
                "Users".to_string(),
                "UserId".to_string(),
                "PK_Users".to_string()
            ),
        ]
    );
}

#[test]
fn referential_constraints_name_the_backing_unique_constraint() {
    let catalog = catalog(fk_graph());
    let batch = project(&catalog, InformationSchemaTable::ReferentialConstraints);

    assert_eq!(batch.num_rows(), 1);
    assert_eq!(
        col_str(&batch, "CONSTRAINT_NAME")[0].as_deref(),
        Some(ORDERS_FK)
    );
    assert_eq!(
        col_str(&batch, "UNIQUE_CONSTRAINT_NAME")[0].as_deref(),
        Some(USERS_UNIQUE_INDEX)
    );
    assert_eq!(col_str(&batch, "MATCH_OPTION")[0].as_deref(), Some("SIMPLE"));
    assert_eq!(
        col_str(&batch, "UPDATE_RULE")[0].as_deref(),
        Some("NO ACTION")
    );
    assert_eq!(
        col_str(&batch, "DELETE_RULE")[0].as_deref(),
        Some("NO ACTION")
    );
    assert_eq!(
        col_str(&batch, "SPANNER_STATE")[0].as_deref(),
        Some("COMMITTED")
    );
}

#[test]
fn primary_key_backed_foreign_keys_point_at_the_primary_key_constraint() {
    let users = CreateTablePlan::new("Users")
        .with_column(ColumnDef::new("UserId", scalar(ScalarType::Int64)).not_null())
        .with_primary_key(vec![KeyPartDef::new("UserId")]);
    let orders = CreateTablePlan::new("Orders")
        .with_column(ColumnDef::new("OrderId", scalar(ScalarType::Int64)).not_null())
        .with_column(ColumnDef::new("UserId", scalar(ScalarType::Int64)))
        .with_primary_key(vec![KeyPartDef::new("OrderId")])
        .with_foreign_key(
            ForeignKeyDef::new(
                vec!["UserId".to_string()],
                "Users",
                vec!["UserId".to_string()],
            )
            .named("FK_OrdersUsers"),
        );
    let graph = apply(&SchemaGraph::empty(), vec![users.into(), orders.into()]);
    let catalog = catalog(graph);

    let batch = project(&catalog, InformationSchemaTable::ReferentialConstraints);
    assert_eq!(batch.num_rows(), 1);
    assert_eq!(
        col_str(&batch, "UNIQUE_CONSTRAINT_NAME")[0].as_deref(),
        Some("PK_Users")
    );

    let kcu = project(&catalog, InformationSchemaTable::KeyColumnUsage);
    let constraints = col_str(&kcu, "CONSTRAINT_NAME");
    let positions = col_i64(&kcu, "POSITION_IN_UNIQUE_CONSTRAINT");
    let fk_row = constraints
        .iter()
        .position(|c| c.as_deref() == Some("FK_OrdersUsers"))
        .expect("foreign key row");
    assert_eq!(positions[fk_row], Some(1));
}

#[test]
fn metadata_tables_describe_themselves() {
    let catalog = catalog(SchemaGraph::empty());
    let batch = project(&catalog, InformationSchemaTable::Tables);

    let names = col_str(&batch, "TABLE_NAME");
    assert_eq!(names.len(), 11);
    assert!(names.contains(&Some("TABLES".to_string())));
    assert!(names.contains(&Some("REFERENTIAL_CONSTRAINTS".to_string())));

    let indexes = project(&catalog, InformationSchemaTable::Indexes);
    let index_names = col_str(&indexes, "INDEX_NAME");
    assert_eq!(index_names.len(), 11);
    assert!(
        index_names
            .iter()
            .all(|n| n.as_deref() == Some("PRIMARY_KEY"))
    );
}

#[test]
fn meta_columns_report_the_declared_nullabilities() {
    let catalog = catalog(SchemaGraph::empty());
    let batch = project(&catalog, InformationSchemaTable::Columns);

    let tables = col_str(&batch, "TABLE_NAME");
    let columns = col_str(&batch, "COLUMN_NAME");
    let nullables = col_str(&batch, "IS_NULLABLE");
    let types = col_str(&batch, "SPANNER_TYPE");
    let find = |table: &str, column: &str| {
        (0..batch.num_rows())
            .find(|&i| {
                tables[i].as_deref() == Some(table) && columns[i].as_deref() == Some(column)
            })
            .unwrap_or_else(|| panic!("missing {table}.{column}"))
    };

    let state = find("INDEXES", "INDEX_STATE");
    assert_eq!(nullables[state].as_deref(), Some("NO"));
    assert_eq!(types[state].as_deref(), Some("STRING(100)"));

    for column in [
        "UNIQUE_CONSTRAINT_CATALOG",
        "UNIQUE_CONSTRAINT_SCHEMA",
        "UNIQUE_CONSTRAINT_NAME",
    ] {
        let row = find("REFERENTIAL_CONSTRAINTS", column);
        assert_eq!(nullables[row].as_deref(), Some("YES"), "{column}");
    }
    for column in ["MATCH_OPTION", "UPDATE_RULE", "DELETE_RULE", "SPANNER_STATE"] {
        let row = find("REFERENTIAL_CONSTRAINTS", column);
        assert_eq!(nullables[row].as_deref(), Some("NO"), "{column}");
    }
}

#[test]
fn meta_not_null_columns_synthesize_check_constraints() {
    let catalog = catalog(SchemaGraph::empty());
    let batch = project(&catalog, InformationSchemaTable::TableConstraints);

    let names = col_str(&batch, "CONSTRAINT_NAME");
    let types = col_str(&batch, "CONSTRAINT_TYPE");
    let row = names
        .iter()
        .position(|n| n.as_deref() == Some("CK_IS_NOT_NULL_INDEXES_INDEX_STATE"))
        .expect("check constraint for INDEXES.INDEX_STATE");
    assert_eq!(types[row].as_deref(), Some("CHECK"));
}

#[test]
fn meta_constraint_column_usage_key_has_four_parts() {
    let catalog = catalog(SchemaGraph::empty());
    let batch = project(&catalog, InformationSchemaTable::IndexColumns);

    let tables = col_str(&batch, "TABLE_NAME");
    let indexes = col_str(&batch, "INDEX_NAME");
    let columns = col_str(&batch, "COLUMN_NAME");
    let key: Vec<_> = (0..batch.num_rows())
        .filter(|&i| {
            tables[i].as_deref() == Some("CONSTRAINT_COLUMN_USAGE")
                && indexes[i].as_deref() == Some("PRIMARY_KEY")
        })
        .map(|i| columns[i].clone().unwrap())
        .collect();
    assert_eq!(
        key,
        [
            "CONSTRAINT_CATALOG",
            "CONSTRAINT_SCHEMA",
            "CONSTRAINT_NAME",
            "COLUMN_NAME"
        ]
    );
}

#[test]
fn projections_of_one_graph_version_are_identical() {
    let catalog = catalog(music_graph());
    for table in InformationSchemaTable::ALL {
        let first = project(&catalog, table);
        let second = project(&catalog, table);
        assert_eq!(first, second, "{} projection drifted", table.name());
    }
}

#[test]
fn project_by_name_ignores_case_and_qualifier() {
    let catalog = catalog(SchemaGraph::empty());
    assert!(catalog.project_by_name("information_schema.tables").is_ok());
    assert!(catalog.project_by_name("COLUMNS").is_ok());

    let err = catalog.project_by_name("nonexistent").expect_err("unknown");
    assert!(matches!(
        err,
        Error::NameNotFound {
            kind: ObjectKind::Table,
            ..
        }
    ));
}
