//! Batch application of DDL statements against a schema graph.
//!
//! A [`SchemaGraphEditor`] is single-use: it captures a base graph, consumes
//! a statement batch and either publishes a new graph or reports the first
//! failure, tagged with the offending statement's index.
//!
//! Application runs in two phases. Phase one walks the batch in order,
//! staging each statement against a copy-on-write workspace and deferring
//! everything that may legally point forward: index targets, interleave
//! parents and foreign key endpoints may all be created by later statements
//! of the same batch. Phase two resolves the deferred work against the
//! complete staged table set, then a structural validation pass checks the
//! whole graph before the new version is produced.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use spandb_plan::{
    AlterTableOp, ColumnDef, ConstraintDef, CreateIndexPlan, CreateTablePlan, DdlStatement,
    ForeignKeyDef, OptionValue,
};
use spandb_result::{BatchError, Error, ObjectKind, Result};
use spandb_types::{ColumnType, ScalarType, SortOrder};
use tracing::{debug, trace};

use crate::graph::{SchemaGraph, canonical_name};
use crate::names::NameGenerator;
use crate::node::{
    Column, ForeignKey, ForeignKeyBacking, Index, IndexState, Interleave, KeyPart, Table,
};
use crate::validate::{check_key_prefix, validate_graph};

// ============================================================================
// Options
// ============================================================================

/// Whether tables share a name namespace with indexes and constraints.
///
/// Under `Split`, a table may carry the same name as an index; indexes and
/// constraints always share one namespace with each other regardless of
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamespaceMode {
    #[default]
    Split,
    Unified,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditorOptions {
    pub namespace_mode: NamespaceMode,
}

// ============================================================================
// Editor
// ============================================================================

/// Applies one batch of DDL statements to a base graph.
pub struct SchemaGraphEditor {
    base: Arc<SchemaGraph>,
    options: EditorOptions,
    names: NameGenerator,
}

impl SchemaGraphEditor {
    pub fn new(base: Arc<SchemaGraph>) -> Self {
        SchemaGraphEditor {
            base,
            options: EditorOptions::default(),
            names: NameGenerator::random(),
        }
    }

    pub fn with_options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the generated-name source, used to pin suffixes in tests.
    pub fn with_name_generator(mut self, names: NameGenerator) -> Self {
        self.names = names;
        self
    }

    /// Applies `statements` in order. On success the returned graph's
    /// version is one higher than the base's; on failure the base graph is
    /// untouched and remains current.
    pub fn apply(
        mut self,
        statements: &[DdlStatement],
    ) -> std::result::Result<Arc<SchemaGraph>, BatchError> {
        debug!(
            base_version = self.base.version(),
            statements = statements.len(),
            "applying ddl batch"
        );
        let mut ws = Workspace::from_base(&self.base, self.options.namespace_mode);

        for (position, statement) in statements.iter().enumerate() {
            trace!(position, kind = statement.kind(), "staging statement");
            self.stage(&mut ws, position, statement)
                .map_err(|error| BatchError::at(position, error))?;
        }

        self.resolve_interleaves(&mut ws)?;
        self.resolve_indexes(&mut ws)?;
        self.resolve_foreign_keys(&mut ws)?;

        validate_graph(&ws.tables).map_err(BatchError::whole_batch)?;

        let graph = SchemaGraph::from_tables(self.base.version() + 1, ws.tables);
        debug!(
            version = graph.version(),
            tables = graph.table_count(),
            "published schema graph"
        );
        Ok(graph)
    }

    // ------------------------------------------------------------------
    // Phase one: staging
    // ------------------------------------------------------------------

    fn stage(&mut self, ws: &mut Workspace, position: usize, statement: &DdlStatement) -> Result<()> {
        match statement {
            DdlStatement::CreateTable(plan) => self.stage_create_table(ws, position, plan),
            DdlStatement::CreateIndex(plan) => self.stage_create_index(ws, position, plan),
            DdlStatement::AlterTable(plan) => {
                let table = ws
                    .table(&plan.table)
                    .ok_or_else(|| Error::name_not_found(ObjectKind::Table, &plan.table))?;
                match &plan.op {
                    AlterTableOp::AddColumn(def) => self.stage_add_column(ws, table, def),
                    AlterTableOp::DropColumn(name) => self.stage_drop_column(ws, table, name),
                    AlterTableOp::AlterColumn(def) => self.stage_alter_column(ws, table, def),
                    AlterTableOp::AddConstraint(ConstraintDef::ForeignKey(def)) => {
                        self.stage_add_foreign_key(ws, position, &table, def)
                    }
                    AlterTableOp::AddConstraint(ConstraintDef::Check { .. }) => {
                        Err(Error::unsupported("CHECK constraints"))
                    }
                    AlterTableOp::DropConstraint(name) => self.stage_drop_constraint(ws, table, name),
                }
            }
            DdlStatement::DropTable(name) => self.stage_drop_table(ws, name),
            DdlStatement::DropIndex(name) => self.stage_drop_index(ws, name),
        }
    }

    fn stage_create_table(
        &mut self,
        ws: &mut Workspace,
        position: usize,
        plan: &CreateTablePlan,
    ) -> Result<()> {
        if ws.table_name_taken(&plan.name) {
            return Err(Error::name_already_exists(ObjectKind::Table, &plan.name));
        }
        if plan.columns.is_empty() {
            return Err(Error::invalid_schema_change(format!(
                "table {} must declare at least one column",
                plan.name
            )));
        }

        let mut columns = Vec::with_capacity(plan.columns.len());
        let mut seen = FxHashSet::default();
        for (pos, def) in plan.columns.iter().enumerate() {
            if !seen.insert(canonical_name(&def.name)) {
                return Err(Error::name_already_exists(ObjectKind::Column, &def.name));
            }
            validate_column_def(def)?;
            columns.push(Arc::new(Column {
                name: def.name.clone(),
                column_type: def.column_type,
                not_null: def.not_null,
                ordinal: pos as u32 + 1,
                options: def.options.clone(),
            }));
        }

        let mut primary_key = Vec::with_capacity(plan.primary_key.len());
        let mut key_seen = FxHashSet::default();
        for part in &plan.primary_key {
            let canon = canonical_name(&part.column);
            let column = columns
                .iter()
                .find(|c| canonical_name(&c.name) == canon)
                .ok_or_else(|| Error::name_not_found(ObjectKind::Column, &part.column))?;
            if column.column_type.is_array() {
                return Err(Error::invalid_schema_change(format!(
                    "array column {} cannot be part of the primary key of {}",
                    column.name, plan.name
                )));
            }
            if !key_seen.insert(canon) {
                return Err(Error::invalid_schema_change(format!(
                    "duplicate primary key column {} on table {}",
                    column.name, plan.name
                )));
            }
            primary_key.push(KeyPart::new(column.name.clone(), part.order));
        }

        let pk_name = crate::names::primary_key_name(&plan.name);
        if ws.object_name_taken(&pk_name) {
            return Err(Error::name_already_exists(ObjectKind::Constraint, &pk_name));
        }

        let key = canonical_name(&plan.name);
        for fk in &plan.foreign_keys {
            if let Some(name) = &fk.constraint_name {
                if ws.object_name_taken(name) {
                    return Err(Error::name_already_exists(ObjectKind::Constraint, name));
                }
                ws.reserve_constraint(name, &key);
            }
            ws.pending_fks.push((position, plan.name.clone(), fk.clone()));
        }

        let table = Table {
            name: plan.name.clone(),
            columns,
            primary_key,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            interleave: plan.interleave.as_ref().map(|il| Interleave {
                parent: il.parent.clone(),
                on_delete: il.on_delete,
            }),
        };
        ws.reserve_constraint(&pk_name, &key);
        ws.tables.insert(key.clone(), Arc::new(table));
        ws.created_tables.push((position, key));
        Ok(())
    }

    fn stage_create_index(
        &mut self,
        ws: &mut Workspace,
        position: usize,
        plan: &CreateIndexPlan,
    ) -> Result<()> {
        if plan.key_parts.is_empty() {
            return Err(Error::invalid_schema_change(format!(
                "index {} requires at least one key part",
                plan.name
            )));
        }
        if ws.object_name_taken(&plan.name) {
            return Err(Error::name_already_exists(ObjectKind::Index, &plan.name));
        }
        // Reserve the name now; binding to the table happens in phase two so
        // the indexed table may be created later in the batch.
        ws.reserve_index(&plan.name, &canonical_name(&plan.table));
        ws.pending_indexes.push((position, plan.clone()));
        Ok(())
    }

    fn stage_add_column(&mut self, ws: &mut Workspace, table: Arc<Table>, def: &ColumnDef) -> Result<()> {
        if table.column(&def.name).is_some() {
            return Err(Error::name_already_exists(ObjectKind::Column, &def.name));
        }
        validate_column_def(def)?;
        let mut updated = (*table).clone();
        updated.columns.push(Arc::new(Column {
            name: def.name.clone(),
            column_type: def.column_type,
            not_null: def.not_null,
            ordinal: updated.columns.len() as u32 + 1,
            options: def.options.clone(),
        }));
        ws.put_table(updated);
        Ok(())
    }

    fn stage_drop_column(&mut self, ws: &mut Workspace, table: Arc<Table>, name: &str) -> Result<()> {
        let canon = canonical_name(name);
        let column = table
            .column(name)
            .ok_or_else(|| Error::name_not_found(ObjectKind::Column, name))?;
        if table.is_key_column(name) {
            return Err(Error::invalid_schema_change(format!(
                "cannot drop key column {} of table {}",
                column.name, table.name
            )));
        }
        for index in &table.indexes {
            if index.uses_column(name) {
                return Err(Error::invalid_schema_change(format!(
                    "column {} of table {} is used by index {}",
                    column.name, table.name, index.name
                )));
            }
        }
        for fk in &table.foreign_keys {
            if fk.uses_referencing_column(name) {
                return Err(Error::invalid_schema_change(format!(
                    "column {} of table {} is used by foreign key {}",
                    column.name, table.name, fk.constraint_name
                )));
            }
        }
        let table_key = canonical_name(&table.name);
        for other in ws.tables.values() {
            for fk in &other.foreign_keys {
                if canonical_name(&fk.referenced_table) == table_key
                    && fk.uses_referenced_column(name)
                {
                    return Err(Error::invalid_schema_change(format!(
                        "column {} of table {} is referenced by foreign key {}",
                        column.name, table.name, fk.constraint_name
                    )));
                }
            }
        }

        let mut updated = (*table).clone();
        updated.columns.retain(|c| canonical_name(&c.name) != canon);
        for (pos, slot) in updated.columns.iter_mut().enumerate() {
            if slot.ordinal as usize != pos + 1 {
                Arc::make_mut(slot).ordinal = pos as u32 + 1;
            }
        }
        ws.put_table(updated);
        Ok(())
    }

    fn stage_alter_column(&mut self, ws: &mut Workspace, table: Arc<Table>, def: &ColumnDef) -> Result<()> {
        let existing = table
            .column(&def.name)
            .cloned()
            .ok_or_else(|| Error::name_not_found(ObjectKind::Column, &def.name))?;
        validate_column_def(def)?;
        check_column_transition(ws, &table, &existing, def)?;

        let canon = canonical_name(&existing.name);
        let mut updated = (*table).clone();
        for slot in &mut updated.columns {
            if canonical_name(&slot.name) == canon {
                *slot = Arc::new(Column {
                    name: existing.name.clone(),
                    column_type: def.column_type,
                    not_null: def.not_null,
                    ordinal: existing.ordinal,
                    options: def.options.clone(),
                });
            }
        }
        ws.put_table(updated);
        Ok(())
    }

    fn stage_add_foreign_key(
        &mut self,
        ws: &mut Workspace,
        position: usize,
        table: &Table,
        def: &ForeignKeyDef,
    ) -> Result<()> {
        if let Some(name) = &def.constraint_name {
            if ws.object_name_taken(name) {
                return Err(Error::name_already_exists(ObjectKind::Constraint, name));
            }
            ws.reserve_constraint(name, &canonical_name(&table.name));
        }
        ws.pending_fks.push((position, table.name.clone(), def.clone()));
        Ok(())
    }

    fn stage_drop_constraint(&mut self, ws: &mut Workspace, table: Arc<Table>, name: &str) -> Result<()> {
        if canonical_name(name) == canonical_name(&table.primary_key_name()) {
            return Err(Error::invalid_schema_change(format!(
                "cannot drop the primary key of table {}",
                table.name
            )));
        }
        let Some(fk) = table.foreign_key(name).cloned() else {
            return Err(Error::name_not_found(ObjectKind::Constraint, name));
        };

        let mut updated = (*table).clone();
        let fk_canon = canonical_name(&fk.constraint_name);
        updated
            .foreign_keys
            .retain(|f| canonical_name(&f.constraint_name) != fk_canon);
        if let Some(index_name) = &fk.referencing_index {
            let canon = canonical_name(index_name);
            updated.indexes.retain(|i| canonical_name(&i.name) != canon);
            ws.remove_index_entry(index_name);
        }
        ws.remove_constraint_entry(&fk.constraint_name);
        ws.put_table(updated);

        if let ForeignKeyBacking::ManagedIndex(index_name) = &fk.backing {
            let referenced_key = canonical_name(&fk.referenced_table);
            if let Some(referenced) = ws.tables.get(&referenced_key).cloned() {
                let canon = canonical_name(index_name);
                let mut updated = (*referenced).clone();
                updated.indexes.retain(|i| canonical_name(&i.name) != canon);
                ws.put_table(updated);
            }
            ws.remove_index_entry(index_name);
        }
        Ok(())
    }

    fn stage_drop_table(&mut self, ws: &mut Workspace, name: &str) -> Result<()> {
        let key = canonical_name(name);
        let table = ws
            .tables
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::name_not_found(ObjectKind::Table, name))?;

        for other in ws.tables.values() {
            if other
                .interleave
                .as_ref()
                .is_some_and(|il| canonical_name(&il.parent) == key)
            {
                return Err(Error::invalid_schema_change(format!(
                    "cannot drop table {}: table {} is interleaved in it",
                    table.name, other.name
                )));
            }
            if canonical_name(&other.name) == key {
                continue;
            }
            for fk in &other.foreign_keys {
                if canonical_name(&fk.referenced_table) == key {
                    return Err(Error::invalid_schema_change(format!(
                        "cannot drop table {}: referenced by foreign key {} on table {}",
                        table.name, fk.constraint_name, other.name
                    )));
                }
            }
        }

        for index in &table.indexes {
            if !index.managed {
                return Err(Error::invalid_schema_change(format!(
                    "cannot drop table {}: index {} must be dropped first",
                    table.name, index.name
                )));
            }
        }

        // Foreign keys on the dropped table may have placed managed backing
        // indexes on other tables; take those with it.
        for fk in &table.foreign_keys {
            if let ForeignKeyBacking::ManagedIndex(index_name) = &fk.backing {
                let referenced_key = canonical_name(&fk.referenced_table);
                if referenced_key != key
                    && let Some(referenced) = ws.tables.get(&referenced_key).cloned()
                {
                    let canon = canonical_name(index_name);
                    let mut updated = (*referenced).clone();
                    updated.indexes.retain(|i| canonical_name(&i.name) != canon);
                    ws.put_table(updated);
                }
                ws.remove_index_entry(index_name);
            }
            if let Some(index_name) = &fk.referencing_index {
                ws.remove_index_entry(index_name);
            }
            ws.remove_constraint_entry(&fk.constraint_name);
        }
        for index in &table.indexes {
            ws.remove_index_entry(&index.name);
        }
        ws.remove_constraint_entry(&table.primary_key_name());
        ws.tables.remove(&key);
        Ok(())
    }

    fn stage_drop_index(&mut self, ws: &mut Workspace, name: &str) -> Result<()> {
        let canon = canonical_name(name);
        // A drop may target an index staged earlier in the same batch.
        if let Some(pos) = ws
            .pending_indexes
            .iter()
            .position(|(_, plan)| canonical_name(&plan.name) == canon)
        {
            ws.pending_indexes.remove(pos);
            ws.remove_index_entry(name);
            return Ok(());
        }

        let table_key = ws
            .indexes
            .get(&canon)
            .cloned()
            .ok_or_else(|| Error::name_not_found(ObjectKind::Index, name))?;
        let table = ws
            .tables
            .get(&table_key)
            .cloned()
            .ok_or_else(|| Error::internal(format!("index {name} maps to missing table")))?;
        let index = table
            .index(name)
            .cloned()
            .ok_or_else(|| Error::name_not_found(ObjectKind::Index, name))?;
        if index.managed {
            return Err(Error::invalid_schema_change(format!(
                "cannot drop managed index {}",
                index.name
            )));
        }
        let mut updated = (*table).clone();
        updated.indexes.retain(|i| canonical_name(&i.name) != canon);
        ws.put_table(updated);
        ws.remove_index_entry(name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Phase two: resolution
    // ------------------------------------------------------------------

    fn resolve_interleaves(&mut self, ws: &mut Workspace) -> std::result::Result<(), BatchError> {
        let created = ws.created_tables.clone();
        for (position, key) in created {
            // The table may have been dropped again later in the batch.
            let Some(table) = ws.tables.get(&key).cloned() else {
                continue;
            };
            let Some(interleave) = table.interleave.clone() else {
                continue;
            };
            let parent = ws
                .tables
                .get(&canonical_name(&interleave.parent))
                .cloned()
                .ok_or_else(|| {
                    BatchError::at(
                        position,
                        Error::name_not_found(ObjectKind::Table, &interleave.parent),
                    )
                })?;
            check_key_prefix(&parent, &table).map_err(|error| BatchError::at(position, error))?;

            let mut hops = 0usize;
            let mut current = parent;
            loop {
                if canonical_name(&current.name) == key {
                    return Err(BatchError::at(
                        position,
                        Error::invalid_schema_change(format!(
                            "interleaving {} in {} would create a cycle",
                            table.name, interleave.parent
                        )),
                    ));
                }
                let Some(next_parent) = current.interleave.clone() else {
                    break;
                };
                let Some(next) = ws.tables.get(&canonical_name(&next_parent.parent)).cloned() else {
                    break;
                };
                current = next;
                hops += 1;
                if hops > ws.tables.len() {
                    return Err(BatchError::at(
                        position,
                        Error::invalid_schema_change(format!(
                            "interleave chain above {} does not terminate",
                            table.name
                        )),
                    ));
                }
            }
        }
        Ok(())
    }

    fn resolve_indexes(&mut self, ws: &mut Workspace) -> std::result::Result<(), BatchError> {
        let pending = std::mem::take(&mut ws.pending_indexes);
        for (position, plan) in pending {
            self.resolve_index(ws, &plan)
                .map_err(|error| BatchError::at(position, error))?;
        }
        Ok(())
    }

    fn resolve_index(&mut self, ws: &mut Workspace, plan: &CreateIndexPlan) -> Result<()> {
        let key = canonical_name(&plan.table);
        let table = ws
            .tables
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::name_not_found(ObjectKind::Table, &plan.table))?;

        let mut key_parts = Vec::with_capacity(plan.key_parts.len());
        let mut seen = FxHashSet::default();
        for part in &plan.key_parts {
            let column = table
                .column(&part.column)
                .ok_or_else(|| Error::name_not_found(ObjectKind::Column, &part.column))?;
            if column.column_type.is_array() {
                return Err(Error::invalid_schema_change(format!(
                    "array column {} cannot be a key part of index {}",
                    column.name, plan.name
                )));
            }
            if !seen.insert(canonical_name(&column.name)) {
                return Err(Error::invalid_schema_change(format!(
                    "duplicate key column {} in index {}",
                    column.name, plan.name
                )));
            }
            key_parts.push(KeyPart::new(column.name.clone(), part.order));
        }

        let mut storing = Vec::with_capacity(plan.storing.len());
        for stored in &plan.storing {
            let column = table
                .column(stored)
                .ok_or_else(|| Error::name_not_found(ObjectKind::Column, stored))?;
            if !seen.insert(canonical_name(&column.name)) {
                return Err(Error::invalid_schema_change(format!(
                    "column {} cannot be stored by index {}: already part of the index",
                    column.name, plan.name
                )));
            }
            storing.push(column.name.clone());
        }

        if let Some(parent_name) = &plan.interleave_in {
            let parent_key = canonical_name(parent_name);
            let parent = ws
                .tables
                .get(&parent_key)
                .cloned()
                .ok_or_else(|| Error::name_not_found(ObjectKind::Table, parent_name))?;

            let mut current = table.clone();
            let mut is_ancestor = false;
            let mut hops = 0usize;
            while let Some(interleave) = current.interleave.clone() {
                let link = canonical_name(&interleave.parent);
                if link == parent_key {
                    is_ancestor = true;
                    break;
                }
                match ws.tables.get(&link).cloned() {
                    Some(next) => current = next,
                    None => break,
                }
                hops += 1;
                if hops > ws.tables.len() {
                    break;
                }
            }
            if !is_ancestor {
                return Err(Error::invalid_schema_change(format!(
                    "index {} cannot be interleaved in {}: not an ancestor of {}",
                    plan.name, parent.name, table.name
                )));
            }
            if key_parts.len() < parent.primary_key.len()
                || !parent.primary_key.iter().zip(&key_parts).all(|(p, k)| {
                    canonical_name(&p.column) == canonical_name(&k.column) && p.order == k.order
                })
            {
                return Err(Error::invalid_schema_change(format!(
                    "key of index {} must be prefixed by the primary key of {}",
                    plan.name, parent.name
                )));
            }
        }

        let index = Index {
            name: plan.name.clone(),
            key_parts,
            storing,
            unique: plan.unique,
            null_filtered: plan.null_filtered,
            interleave_in: plan.interleave_in.clone(),
            state: IndexState::Creating,
            managed: false,
        };
        let mut updated = (*table).clone();
        updated.indexes.push(Arc::new(index));
        ws.put_table(updated);
        ws.reserve_index(&plan.name, &key);
        Ok(())
    }

    fn resolve_foreign_keys(&mut self, ws: &mut Workspace) -> std::result::Result<(), BatchError> {
        let pending = std::mem::take(&mut ws.pending_fks);
        for (position, table_name, def) in pending {
            self.resolve_foreign_key(ws, &table_name, &def)
                .map_err(|error| BatchError::at(position, error))?;
        }
        Ok(())
    }

    fn resolve_foreign_key(
        &mut self,
        ws: &mut Workspace,
        table_name: &str,
        def: &ForeignKeyDef,
    ) -> Result<()> {
        let table_key = canonical_name(table_name);
        let table = ws
            .tables
            .get(&table_key)
            .cloned()
            .ok_or_else(|| Error::name_not_found(ObjectKind::Table, table_name))?;
        let referenced = ws
            .tables
            .get(&canonical_name(&def.referenced_table))
            .cloned()
            .ok_or_else(|| Error::name_not_found(ObjectKind::Table, &def.referenced_table))?;

        if def.referencing_columns.is_empty()
            || def.referencing_columns.len() != def.referenced_columns.len()
        {
            return Err(Error::invalid_schema_change(format!(
                "foreign key on {} must name matching, non-empty column lists",
                table.name
            )));
        }

        let referencing = resolve_fk_columns(&table, &def.referencing_columns)?;
        let referenced_cols = resolve_fk_columns(&referenced, &def.referenced_columns)?;
        for (a, b) in referencing.iter().zip(&referenced_cols) {
            if !fk_types_match(&a.column_type, &b.column_type) {
                return Err(Error::invalid_schema_change(format!(
                    "foreign key column {} ({}) does not match referenced column {} ({})",
                    a.name, a.column_type, b.name, b.column_type
                )));
            }
        }
        let referencing: Vec<String> = referencing.iter().map(|c| c.name.clone()).collect();
        let referenced_cols: Vec<String> = referenced_cols.iter().map(|c| c.name.clone()).collect();

        // Referenced side: the primary key backs the constraint only on an
        // exact column-for-column match; otherwise a managed unique
        // null-filtered index is created on the referenced table.
        let pk_backed = referenced.primary_key.len() == referenced_cols.len()
            && referenced
                .primary_key
                .iter()
                .zip(&referenced_cols)
                .all(|(part, col)| canonical_name(&part.column) == canonical_name(col));
        let backing = if pk_backed {
            ForeignKeyBacking::PrimaryKey
        } else {
            let name =
                self.names
                    .managed_index_name(&referenced.name, &referenced_cols, true, |cand| {
                        ws.object_name_taken(cand)
                    });
            let index = Index {
                name: name.clone(),
                key_parts: referenced_cols
                    .iter()
                    .map(|col| KeyPart::new(col.clone(), managed_key_order(&referenced, col)))
                    .collect(),
                storing: Vec::new(),
                unique: true,
                null_filtered: true,
                interleave_in: None,
                state: IndexState::ReadWrite,
                managed: true,
            };
            let referenced_key = canonical_name(&referenced.name);
            let mut updated = (*referenced).clone();
            updated.indexes.push(Arc::new(index));
            ws.put_table(updated);
            ws.reserve_index(&name, &referenced_key);
            ForeignKeyBacking::ManagedIndex(name)
        };

        // Re-fetch in case the referencing table is also the referenced one.
        let table = ws
            .tables
            .get(&table_key)
            .cloned()
            .ok_or_else(|| Error::internal(format!("table {table_name} vanished during staging")))?;

        let self_pk_covered = table.primary_key.len() == referencing.len()
            && table
                .primary_key
                .iter()
                .zip(&referencing)
                .all(|(part, col)| canonical_name(&part.column) == canonical_name(col));
        let referencing_index = if self_pk_covered {
            None
        } else {
            let name = self
                .names
                .managed_index_name(&table.name, &referencing, false, |cand| {
                    ws.object_name_taken(cand)
                });
            Some(Index {
                name,
                key_parts: referencing
                    .iter()
                    .map(|col| KeyPart::new(col.clone(), managed_key_order(&table, col)))
                    .collect(),
                storing: Vec::new(),
                unique: false,
                null_filtered: true,
                interleave_in: None,
                state: IndexState::ReadWrite,
                managed: true,
            })
        };

        let constraint_name = match &def.constraint_name {
            Some(name) => name.clone(),
            None => self
                .names
                .foreign_key_name(&table.name, &referenced.name, |cand| {
                    ws.object_name_taken(cand)
                }),
        };

        let mut updated = (*table).clone();
        let referencing_index_name = referencing_index.as_ref().map(|i| i.name.clone());
        if let Some(index) = referencing_index {
            ws.reserve_index(&index.name, &table_key);
            updated.indexes.push(Arc::new(index));
        }
        updated.foreign_keys.push(Arc::new(ForeignKey {
            constraint_name: constraint_name.clone(),
            referencing_columns: referencing,
            referenced_table: referenced.name.clone(),
            referenced_columns: referenced_cols,
            backing,
            referencing_index: referencing_index_name,
        }));
        ws.put_table(updated);
        ws.reserve_constraint(&constraint_name, &table_key);
        Ok(())
    }
}

// ============================================================================
// Workspace
// ============================================================================

/// Copy-on-write staging area for one batch application.
struct Workspace {
    mode: NamespaceMode,
    tables: FxHashMap<String, Arc<Table>>,
    /// Canonical index name to canonical table name, including phase-one
    /// reservations for indexes not yet bound.
    indexes: FxHashMap<String, String>,
    constraints: FxHashMap<String, String>,
    created_tables: Vec<(usize, String)>,
    pending_indexes: Vec<(usize, CreateIndexPlan)>,
    pending_fks: Vec<(usize, String, ForeignKeyDef)>,
}

impl Workspace {
    fn from_base(base: &SchemaGraph, mode: NamespaceMode) -> Self {
        Workspace {
            mode,
            tables: base.tables_map().clone(),
            indexes: base.indexes_map().clone(),
            constraints: base.constraints_map().clone(),
            created_tables: Vec::new(),
            pending_indexes: Vec::new(),
            pending_fks: Vec::new(),
        }
    }

    fn table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.get(&canonical_name(name)).cloned()
    }

    fn put_table(&mut self, table: Table) {
        self.tables
            .insert(canonical_name(&table.name), Arc::new(table));
    }

    fn table_name_taken(&self, name: &str) -> bool {
        let canon = canonical_name(name);
        self.tables.contains_key(&canon)
            || (self.mode == NamespaceMode::Unified
                && (self.indexes.contains_key(&canon) || self.constraints.contains_key(&canon)))
    }

    /// Indexes and constraints always share a namespace; under
    /// [`NamespaceMode::Unified`] tables join it too.
    fn object_name_taken(&self, name: &str) -> bool {
        let canon = canonical_name(name);
        self.indexes.contains_key(&canon)
            || self.constraints.contains_key(&canon)
            || (self.mode == NamespaceMode::Unified && self.tables.contains_key(&canon))
    }

    fn reserve_index(&mut self, name: &str, table_key: &str) {
        self.indexes
            .insert(canonical_name(name), table_key.to_string());
    }

    fn reserve_constraint(&mut self, name: &str, table_key: &str) {
        self.constraints
            .insert(canonical_name(name), table_key.to_string());
    }

    fn remove_index_entry(&mut self, name: &str) {
        self.indexes.remove(&canonical_name(name));
    }

    fn remove_constraint_entry(&mut self, name: &str) {
        self.constraints.remove(&canonical_name(name));
    }
}

// ============================================================================
// Column helpers
// ============================================================================

fn validate_column_def(def: &ColumnDef) -> Result<()> {
    def.column_type.validate()?;
    for option in &def.options {
        if !option.name.eq_ignore_ascii_case("allow_commit_timestamp") {
            return Err(Error::unsupported(format!("column option {}", option.name)));
        }
        if !matches!(option.value, OptionValue::Bool(_)) {
            return Err(Error::invalid_schema_change(format!(
                "option allow_commit_timestamp on column {} expects a BOOL value",
                def.name
            )));
        }
        let eligible =
            !def.column_type.is_array() && def.column_type.element().allows_commit_timestamp();
        if !eligible {
            return Err(Error::invalid_schema_change(format!(
                "option allow_commit_timestamp is not valid on column {} of type {}",
                def.name, def.column_type
            )));
        }
    }
    Ok(())
}

fn scalar_base(ty: &ScalarType) -> u8 {
    match ty {
        ScalarType::Bool => 0,
        ScalarType::Int64 => 1,
        ScalarType::Float64 => 2,
        ScalarType::String(_) => 3,
        ScalarType::Bytes(_) => 4,
        ScalarType::Timestamp => 5,
        ScalarType::Date => 6,
    }
}

fn fk_types_match(a: &ColumnType, b: &ColumnType) -> bool {
    a.is_array() == b.is_array() && scalar_base(&a.element()) == scalar_base(&b.element())
}

/// Legal `ALTER COLUMN` transitions: length and nullability changes within
/// the same base type always, plus STRING/BYTES interchange for columns not
/// pinned down by a key, index or foreign key.
fn check_column_transition(
    ws: &Workspace,
    table: &Table,
    existing: &Column,
    def: &ColumnDef,
) -> Result<()> {
    let old = &existing.column_type;
    let new = &def.column_type;
    if old == new {
        return Ok(());
    }
    if old.is_array() != new.is_array() {
        return Err(Error::invalid_schema_change(format!(
            "cannot change column {} of table {} between scalar and array",
            existing.name, table.name
        )));
    }
    let old_base = scalar_base(&old.element());
    let new_base = scalar_base(&new.element());
    let string_bytes_swap = matches!((old_base, new_base), (3, 4) | (4, 3));
    if old_base != new_base && !string_bytes_swap {
        return Err(Error::invalid_schema_change(format!(
            "cannot change column {} of table {} from {} to {}",
            existing.name, table.name, old, new
        )));
    }
    if old_base == new_base {
        return Ok(());
    }

    // STRING/BYTES interchange is off limits while anything depends on the
    // column's encoding.
    let pinned = table.is_key_column(&existing.name)
        || table.indexes.iter().any(|i| i.uses_column(&existing.name))
        || table
            .foreign_keys
            .iter()
            .any(|fk| fk.uses_referencing_column(&existing.name));
    let table_key = canonical_name(&table.name);
    let referenced = ws.tables.values().any(|other| {
        other.foreign_keys.iter().any(|fk| {
            canonical_name(&fk.referenced_table) == table_key
                && fk.uses_referenced_column(&existing.name)
        })
    });
    if pinned || referenced {
        return Err(Error::invalid_schema_change(format!(
            "cannot change column {} of table {} from {} to {}: used by a key, index or foreign key",
            existing.name, table.name, old, new
        )));
    }
    Ok(())
}

/// Managed index key parts keep the column's declared primary-key ordering
/// when the column is a key part of the table the index lives on.
fn managed_key_order(table: &Table, column: &str) -> SortOrder {
    let canon = canonical_name(column);
    table
        .primary_key
        .iter()
        .find(|part| canonical_name(&part.column) == canon)
        .map(|part| part.order)
        .unwrap_or(SortOrder::Asc)
}

fn resolve_fk_columns<'t>(table: &'t Table, names: &[String]) -> Result<Vec<&'t Arc<Column>>> {
    let mut resolved = Vec::with_capacity(names.len());
    let mut seen = FxHashSet::default();
    for name in names {
        let column = table
            .column(name)
            .ok_or_else(|| Error::name_not_found(ObjectKind::Column, name))?;
        if column.column_type.is_array() {
            return Err(Error::invalid_schema_change(format!(
                "array column {} of table {} cannot participate in a foreign key",
                column.name, table.name
            )));
        }
        if !seen.insert(canonical_name(&column.name)) {
            return Err(Error::invalid_schema_change(format!(
                "duplicate foreign key column {} on table {}",
                column.name, table.name
            )));
        }
        resolved.push(column);
    }
    Ok(resolved)
}
