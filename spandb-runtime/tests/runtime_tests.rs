//! Schema change lifecycle through a database context.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use spandb_plan::{ColumnDef, CreateIndexPlan, CreateTablePlan, DdlStatement, KeyPartDef};
use spandb_runtime::{BackfillObserver, BackfillOutcome, DatabaseContext, ImmediateBackfill};
use spandb_schema::{IndexState, SchemaGraph};
use spandb_types::{ColumnType, ScalarType, TypeLength};

fn users_table() -> DdlStatement {
    CreateTablePlan::new("Users")
        .with_column(ColumnDef::new("UserId", ColumnType::Scalar(ScalarType::Int64)).not_null())
        .with_column(ColumnDef::new(
            "Name",
            ColumnType::Scalar(ScalarType::String(TypeLength::Max)),
        ))
        .with_primary_key(vec![KeyPartDef::new("UserId")])
        .into()
}

fn users_by_name() -> DdlStatement {
    CreateIndexPlan::new("UsersByName", "Users")
        .with_key_parts(vec![KeyPartDef::new("Name")])
        .into()
}

/// Observer that parks every backfill, recording how many it saw.
struct ParkedBackfill {
    seen: AtomicUsize,
}

impl BackfillObserver for ParkedBackfill {
    fn on_index_created(&self, _graph: &SchemaGraph, _table: &str, _index: &str) -> BackfillOutcome {
        self.seen.fetch_add(1, Ordering::SeqCst);
        BackfillOutcome::Pending
    }
}

#[test]
fn committed_batches_show_up_in_the_metadata_projection() {
    let db = DatabaseContext::new();
    db.apply_ddl_batch(&[users_table()]).expect("create table");

    assert_eq!(db.current_schema().version(), 1);
    let tables = db
        .project_information_schema("TABLES")
        .expect("projection");
    // Users plus the eleven metadata tables.
    assert_eq!(tables.num_rows(), 12);
}

#[test]
fn rejected_batches_leave_the_schema_and_projections_untouched() {
    let db = DatabaseContext::new();
    db.apply_ddl_batch(&[users_table()]).expect("create table");
    let before_schema = db.current_schema();
    let before = db.project_information_schema("COLUMNS").expect("projection");

    let dup: DdlStatement = CreateTablePlan::new("users")
        .with_column(ColumnDef::new("Id", ColumnType::Scalar(ScalarType::Int64)).not_null())
        .with_primary_key(vec![KeyPartDef::new("Id")])
        .into();
    let err = db.apply_ddl_batch(&[dup]).expect_err("duplicate table");
    assert_eq!(err.statement_index, Some(0));

    assert!(Arc::ptr_eq(&before_schema, &db.current_schema()));
    let after = db.project_information_schema("COLUMNS").expect("projection");
    assert_eq!(before, after);
}

#[test]
fn immediate_backfill_promotes_new_indexes_to_read_write() {
    let db = DatabaseContext::new().with_backfill(Arc::new(ImmediateBackfill));
    db.apply_ddl_batch(&[users_table(), users_by_name()])
        .expect("batch");

    let graph = db.current_schema();
    // One version for the batch, one for the index promotion.
    assert_eq!(graph.version(), 2);
    let (_, index) = graph.index("UsersByName").expect("index");
    assert_eq!(index.state, IndexState::ReadWrite);
}

#[test]
fn pending_backfills_hold_indexes_in_creating_until_completed() {
    let observer = Arc::new(ParkedBackfill {
        seen: AtomicUsize::new(0),
    });
    let db = DatabaseContext::new().with_backfill(observer.clone());
    db.apply_ddl_batch(&[users_table(), users_by_name()])
        .expect("batch");

    assert_eq!(observer.seen.load(Ordering::SeqCst), 1);
    let graph = db.current_schema();
    assert_eq!(graph.version(), 1);
    let (_, index) = graph.index("UsersByName").expect("index");
    assert_eq!(index.state, IndexState::Creating);

    let promoted = db
        .complete_index_backfill("usersbyname")
        .expect("promotion");
    assert_eq!(promoted.version(), 2);
    let (_, index) = promoted.index("UsersByName").expect("index");
    assert_eq!(index.state, IndexState::ReadWrite);
    assert!(Arc::ptr_eq(&promoted, &db.current_schema()));
}
