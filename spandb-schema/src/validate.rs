//! Whole-graph structural validation.
//!
//! Runs after every batch application, over the complete staged table set.
//! Staging is expected to have rejected anything invalid already, so every
//! failure here is reported as an internal error: it means the editor let an
//! inconsistent graph through.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use spandb_result::{Error, Result};

use crate::graph::canonical_name;
use crate::node::{ForeignKeyBacking, Table};

/// Checks that `child`'s primary key is a strict extension of `parent`'s:
/// the same leading parts, same names, sort orders and column types, with at
/// least one additional part.
pub(crate) fn check_key_prefix(parent: &Table, child: &Table) -> Result<()> {
    if child.primary_key.len() <= parent.primary_key.len() {
        return Err(Error::invalid_schema_change(format!(
            "primary key of {} must strictly extend the primary key of parent {}",
            child.name, parent.name
        )));
    }
    for (pos, parent_part) in parent.primary_key.iter().enumerate() {
        let child_part = &child.primary_key[pos];
        if canonical_name(&parent_part.column) != canonical_name(&child_part.column)
            || parent_part.order != child_part.order
        {
            return Err(Error::invalid_schema_change(format!(
                "key part {} of {} does not match parent {} key part {}",
                child_part.column, child.name, parent.name, parent_part.column
            )));
        }
        let parent_col = parent
            .column(&parent_part.column)
            .ok_or_else(|| Error::internal(format!(
                "key column {} missing on table {}",
                parent_part.column, parent.name
            )))?;
        let child_col = child
            .column(&child_part.column)
            .ok_or_else(|| Error::internal(format!(
                "key column {} missing on table {}",
                child_part.column, child.name
            )))?;
        if parent_col.column_type != child_col.column_type {
            return Err(Error::invalid_schema_change(format!(
                "key column {} of {} has type {} but parent {} declares {}",
                child_col.name, child.name, child_col.column_type, parent.name,
                parent_col.column_type
            )));
        }
    }
    Ok(())
}

pub(crate) fn validate_graph(tables: &FxHashMap<String, Arc<Table>>) -> Result<()> {
    for (key, table) in tables {
        if key != &canonical_name(&table.name) {
            return Err(Error::internal(format!(
                "table map key {key} does not match table name {}",
                table.name
            )));
        }
        for (pos, column) in table.columns.iter().enumerate() {
            if column.ordinal as usize != pos + 1 {
                return Err(Error::internal(format!(
                    "column {} of {} has ordinal {} at position {}",
                    column.name,
                    table.name,
                    column.ordinal,
                    pos + 1
                )));
            }
        }
        for part in &table.primary_key {
            let column = table.column(&part.column).ok_or_else(|| {
                Error::internal(format!(
                    "primary key of {} names missing column {}",
                    table.name, part.column
                ))
            })?;
            if column.column_type.is_array() {
                return Err(Error::internal(format!(
                    "primary key of {} contains array column {}",
                    table.name, column.name
                )));
            }
        }
        for index in &table.indexes {
            for part in &index.key_parts {
                if table.column(&part.column).is_none() {
                    return Err(Error::internal(format!(
                        "index {} names missing column {}",
                        index.name, part.column
                    )));
                }
            }
            for stored in &index.storing {
                if table.column(stored).is_none() {
                    return Err(Error::internal(format!(
                        "index {} stores missing column {stored}",
                        index.name
                    )));
                }
            }
        }
        for fk in &table.foreign_keys {
            validate_foreign_key(tables, table, fk)?;
        }
        if let Some(interleave) = &table.interleave {
            let parent = tables.get(&canonical_name(&interleave.parent)).ok_or_else(|| {
                Error::internal(format!(
                    "interleave parent {} of {} is missing",
                    interleave.parent, table.name
                ))
            })?;
            check_key_prefix(parent, table).map_err(|e| Error::internal(e.to_string()))?;
            detect_interleave_cycle(tables, table)?;
        }
    }
    Ok(())
}

fn validate_foreign_key(
    tables: &FxHashMap<String, Arc<Table>>,
    table: &Table,
    fk: &crate::node::ForeignKey,
) -> Result<()> {
    let referenced = tables
        .get(&canonical_name(&fk.referenced_table))
        .ok_or_else(|| {
            Error::internal(format!(
                "foreign key {} references missing table {}",
                fk.constraint_name, fk.referenced_table
            ))
        })?;
    for column in &fk.referencing_columns {
        if table.column(column).is_none() {
            return Err(Error::internal(format!(
                "foreign key {} names missing column {column} on {}",
                fk.constraint_name, table.name
            )));
        }
    }
    for column in &fk.referenced_columns {
        if referenced.column(column).is_none() {
            return Err(Error::internal(format!(
                "foreign key {} names missing column {column} on {}",
                fk.constraint_name, referenced.name
            )));
        }
    }
    match &fk.backing {
        ForeignKeyBacking::PrimaryKey => {
            let matches = referenced.primary_key.len() == fk.referenced_columns.len()
                && referenced
                    .primary_key
                    .iter()
                    .zip(&fk.referenced_columns)
                    .all(|(part, col)| canonical_name(&part.column) == canonical_name(col));
            if !matches {
                return Err(Error::internal(format!(
                    "foreign key {} claims primary key backing but columns differ",
                    fk.constraint_name
                )));
            }
        }
        ForeignKeyBacking::ManagedIndex(name) => {
            let index = referenced.index(name).ok_or_else(|| {
                Error::internal(format!(
                    "foreign key {} backing index {name} is missing on {}",
                    fk.constraint_name, referenced.name
                ))
            })?;
            if !index.managed || !index.unique || !index.null_filtered {
                return Err(Error::internal(format!(
                    "backing index {name} of {} lacks managed unique null-filtered shape",
                    fk.constraint_name
                )));
            }
            let covers = index.key_parts.len() == fk.referenced_columns.len()
                && index
                    .key_parts
                    .iter()
                    .zip(&fk.referenced_columns)
                    .all(|(part, col)| canonical_name(&part.column) == canonical_name(col));
            if !covers {
                return Err(Error::internal(format!(
                    "backing index {name} does not cover the referenced columns of {}",
                    fk.constraint_name
                )));
            }
        }
    }
    if let Some(name) = &fk.referencing_index {
        let index = table.index(name).ok_or_else(|| {
            Error::internal(format!(
                "foreign key {} referencing index {name} is missing on {}",
                fk.constraint_name, table.name
            ))
        })?;
        if !index.managed || index.unique {
            return Err(Error::internal(format!(
                "referencing index {name} of {} has the wrong shape",
                fk.constraint_name
            )));
        }
    }
    Ok(())
}

fn detect_interleave_cycle(tables: &FxHashMap<String, Arc<Table>>, start: &Table) -> Result<()> {
    let start_key = canonical_name(&start.name);
    let mut current = start.interleave.as_ref().map(|il| canonical_name(&il.parent));
    let mut hops = 0usize;
    while let Some(key) = current {
        if key == start_key {
            return Err(Error::internal(format!(
                "interleave cycle involving table {}",
                start.name
            )));
        }
        hops += 1;
        if hops > tables.len() {
            return Err(Error::internal(format!(
                "interleave chain from table {} does not terminate",
                start.name
            )));
        }
        current = tables
            .get(&key)
            .and_then(|t| t.interleave.as_ref())
            .map(|il| canonical_name(&il.parent));
    }
    Ok(())
}
