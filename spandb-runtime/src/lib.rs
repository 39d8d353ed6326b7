//! Database-level coordination of schema changes.
//!
//! A [`DatabaseContext`] owns the current [`SchemaGraph`] and serializes DDL
//! batches against it. Readers grab an `Arc` snapshot and never block on
//! writers. After a batch commits, any secondary indexes it created sit in
//! the `CREATING` state until their backfill finishes; the context hands
//! them to a [`BackfillObserver`] and flips the ones reported complete to
//! `READ_WRITE`.

#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex, RwLock};

use spandb_catalog::InformationSchemaCatalog;
use spandb_plan::DdlStatement;
use spandb_result::{BatchError, Result};
use spandb_schema::{EditorOptions, IndexState, SchemaGraph, SchemaGraphEditor};
use tracing::{debug, error};

/// What happened to an index backfill kicked off by a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// The index is fully populated; it can serve reads immediately.
    Completed,
    /// The backfill continues elsewhere; [`DatabaseContext::complete_index_backfill`]
    /// finishes the transition later.
    Pending,
}

/// Hook invoked once per index a committed batch left in the `CREATING`
/// state. Managed indexes never reach the observer.
pub trait BackfillObserver: Send + Sync {
    fn on_index_created(&self, graph: &SchemaGraph, table: &str, index: &str) -> BackfillOutcome;
}

/// Observer for databases with no rows to backfill: every index completes
/// on the spot.
#[derive(Debug, Default)]
pub struct ImmediateBackfill;

impl BackfillObserver for ImmediateBackfill {
    fn on_index_created(&self, _graph: &SchemaGraph, _table: &str, _index: &str) -> BackfillOutcome {
        BackfillOutcome::Completed
    }
}

pub struct DatabaseContext {
    current: RwLock<Arc<SchemaGraph>>,
    // Serializes schema changes; reads go through `current` alone.
    ddl_gate: Mutex<()>,
    options: EditorOptions,
    backfill: Arc<dyn BackfillObserver>,
}

impl DatabaseContext {
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    pub fn with_options(options: EditorOptions) -> Self {
        DatabaseContext {
            current: RwLock::new(SchemaGraph::empty()),
            ddl_gate: Mutex::new(()),
            options,
            backfill: Arc::new(ImmediateBackfill),
        }
    }

    pub fn with_backfill(mut self, backfill: Arc<dyn BackfillObserver>) -> Self {
        self.backfill = backfill;
        self
    }

    /// Snapshot of the current schema. Stays self-consistent for as long as
    /// the caller holds it.
    pub fn current_schema(&self) -> Arc<SchemaGraph> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn publish(&self, graph: Arc<SchemaGraph>) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = graph;
    }

    /// Applies a DDL batch atomically. On success the new graph is published
    /// and returned; on failure the current schema is untouched.
    ///
    /// Indexes the batch leaves in `CREATING` are offered to the backfill
    /// observer afterwards. A failed state transition is logged and skipped
    /// rather than unwinding the already-committed batch.
    pub fn apply_ddl_batch(
        &self,
        statements: &[DdlStatement],
    ) -> std::result::Result<Arc<SchemaGraph>, BatchError> {
        let _gate = self.ddl_gate.lock().unwrap_or_else(|e| e.into_inner());
        let base = self.current_schema();
        let graph = SchemaGraphEditor::new(base.clone())
            .with_options(self.options)
            .apply(statements)?;
        debug!(
            from = base.version(),
            to = graph.version(),
            "committed ddl batch"
        );
        self.publish(graph.clone());

        let mut current = graph;
        for (table, index) in new_creating_indexes(&base, &current) {
            match self.backfill.on_index_created(&current, &table, &index) {
                BackfillOutcome::Completed => match current.with_index_read_write(&index) {
                    Ok(next) => {
                        self.publish(next.clone());
                        current = next;
                    }
                    Err(e) => error!(index, "index state transition failed: {e}"),
                },
                BackfillOutcome::Pending => {
                    debug!(index, "index backfill pending");
                }
            }
        }
        Ok(current)
    }

    /// Finishes a backfill the observer reported as [`BackfillOutcome::Pending`].
    pub fn complete_index_backfill(&self, index: &str) -> Result<Arc<SchemaGraph>> {
        let _gate = self.ddl_gate.lock().unwrap_or_else(|e| e.into_inner());
        let next = self.current_schema().with_index_read_write(index)?;
        self.publish(next.clone());
        Ok(next)
    }

    /// Projects one metadata table against the current schema snapshot.
    pub fn project_information_schema(
        &self,
        table_name: &str,
    ) -> Result<arrow::record_batch::RecordBatch> {
        InformationSchemaCatalog::new(self.current_schema())?.project_by_name(table_name)
    }
}

impl Default for DatabaseContext {
    fn default() -> Self {
        Self::new()
    }
}

/// User indexes present in `after` in the `CREATING` state but absent from
/// `before`, in deterministic table order.
fn new_creating_indexes(before: &SchemaGraph, after: &SchemaGraph) -> Vec<(String, String)> {
    let mut created = Vec::new();
    for table in after.tables_sorted() {
        for index in &table.indexes {
            if index.state == IndexState::Creating
                && !index.managed
                && before.index(&index.name).is_none()
            {
                created.push((table.name.clone(), index.name.clone()));
            }
        }
    }
    created
}
