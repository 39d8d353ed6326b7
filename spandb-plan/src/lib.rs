//! Structured DDL statement plans for spandb.
//!
//! This crate defines the statement structures that represent schema changes
//! before they are applied. Plans are created by DDL frontends or fluent
//! builders and consumed by the schema graph editor. They carry no resolved
//! references: every table, column and constraint is named by string, and
//! resolution happens inside the editor against a specific schema version.

pub mod plans;

pub use plans::{
    AlterTableOp, AlterTablePlan, ColumnDef, ColumnOptionDef, ConstraintDef, CreateIndexPlan,
    CreateTablePlan, DdlStatement, ForeignKeyDef, InterleaveDef, KeyPartDef, OptionValue,
};
