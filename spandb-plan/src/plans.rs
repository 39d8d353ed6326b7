//! DDL plan structures.
//!
//! Each plan mirrors one DDL statement shape. Builders are fluent and
//! consuming so test fixtures and frontends can assemble statements inline.

use spandb_types::{ColumnType, OnDeleteAction, SortOrder};

// ============================================================================
// Column Definitions
// ============================================================================

/// Value of a column option, e.g. `options (allow_commit_timestamp = true)`.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int64(i64),
    String(String),
}

impl OptionValue {
    /// The option's type name as reported by the information schema.
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "BOOL",
            OptionValue::Int64(_) => "INT64",
            OptionValue::String(_) => "STRING",
        }
    }

    /// The option's value rendered the way the information schema reports it.
    pub fn render(&self) -> String {
        match self {
            OptionValue::Bool(true) => "TRUE".to_string(),
            OptionValue::Bool(false) => "FALSE".to_string(),
            OptionValue::Int64(v) => v.to_string(),
            OptionValue::String(v) => v.clone(),
        }
    }
}

/// A single `option_name = value` entry in a column's options clause.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnOptionDef {
    pub name: String,
    pub value: OptionValue,
}

impl ColumnOptionDef {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        ColumnOptionDef {
            name: name.into(),
            value,
        }
    }
}

/// A column definition inside `CREATE TABLE` or `ALTER TABLE ... COLUMN`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub options: Vec<ColumnOptionDef>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.into(),
            column_type,
            not_null: false,
            options: Vec::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.push(ColumnOptionDef::new(name, value));
        self
    }
}

/// One part of a primary key or index key: a column name plus sort order.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyPartDef {
    pub column: String,
    pub order: SortOrder,
}

impl KeyPartDef {
    pub fn new(column: impl Into<String>) -> Self {
        KeyPartDef {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        KeyPartDef {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

// ============================================================================
// CREATE TABLE Plan
// ============================================================================

/// `INTERLEAVE IN PARENT <parent> [ON DELETE ...]` clause.
#[derive(Clone, Debug, PartialEq)]
pub struct InterleaveDef {
    pub parent: String,
    pub on_delete: OnDeleteAction,
}

impl InterleaveDef {
    pub fn new(parent: impl Into<String>, on_delete: OnDeleteAction) -> Self {
        InterleaveDef {
            parent: parent.into(),
            on_delete,
        }
    }
}

/// A foreign key definition, either inline in `CREATE TABLE` or added via
/// `ALTER TABLE ... ADD CONSTRAINT`.
#[derive(Clone, Debug, PartialEq)]
pub struct ForeignKeyDef {
    /// Explicit constraint name; `None` means the editor generates one.
    pub constraint_name: Option<String>,
    pub referencing_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyDef {
    pub fn new(
        referencing_columns: Vec<String>,
        referenced_table: impl Into<String>,
        referenced_columns: Vec<String>,
    ) -> Self {
        ForeignKeyDef {
            constraint_name: None,
            referencing_columns,
            referenced_table: referenced_table.into(),
            referenced_columns,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = Some(name.into());
        self
    }
}

/// Plan for `CREATE TABLE`.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateTablePlan {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<KeyPartDef>,
    pub interleave: Option<InterleaveDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl CreateTablePlan {
    pub fn new(name: impl Into<String>) -> Self {
        CreateTablePlan {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            interleave: None,
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, parts: Vec<KeyPartDef>) -> Self {
        self.primary_key = parts;
        self
    }

    pub fn interleave_in_parent(mut self, parent: impl Into<String>, on_delete: OnDeleteAction) -> Self {
        self.interleave = Some(InterleaveDef::new(parent, on_delete));
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }
}

// ============================================================================
// CREATE INDEX Plan
// ============================================================================

/// Plan for `CREATE [UNIQUE] [NULL_FILTERED] INDEX`.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateIndexPlan {
    pub name: String,
    pub table: String,
    pub key_parts: Vec<KeyPartDef>,
    pub storing: Vec<String>,
    pub unique: bool,
    pub null_filtered: bool,
    /// `INTERLEAVE IN <table>`; the target must be an interleave ancestor of
    /// the indexed table.
    pub interleave_in: Option<String>,
}

impl CreateIndexPlan {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        CreateIndexPlan {
            name: name.into(),
            table: table.into(),
            key_parts: Vec::new(),
            storing: Vec::new(),
            unique: false,
            null_filtered: false,
            interleave_in: None,
        }
    }

    pub fn with_key_parts(mut self, parts: Vec<KeyPartDef>) -> Self {
        self.key_parts = parts;
        self
    }

    pub fn storing(mut self, columns: Vec<String>) -> Self {
        self.storing = columns;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn null_filtered(mut self) -> Self {
        self.null_filtered = true;
        self
    }

    pub fn interleave_in(mut self, parent: impl Into<String>) -> Self {
        self.interleave_in = Some(parent.into());
        self
    }
}

// ============================================================================
// ALTER TABLE Plan
// ============================================================================

/// A table-level constraint added via `ALTER TABLE ... ADD CONSTRAINT`.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintDef {
    ForeignKey(ForeignKeyDef),
    /// `CHECK (<expression>)`. Recognized by the plan layer but rejected by
    /// the editor as unsupported.
    Check {
        name: Option<String>,
        expression: String,
    },
}

/// One operation inside an `ALTER TABLE` statement.
#[derive(Clone, Debug, PartialEq)]
pub enum AlterTableOp {
    AddColumn(ColumnDef),
    DropColumn(String),
    /// Replaces the named column's type, nullability and options.
    AlterColumn(ColumnDef),
    AddConstraint(ConstraintDef),
    DropConstraint(String),
}

/// Plan for `ALTER TABLE`.
#[derive(Clone, Debug, PartialEq)]
pub struct AlterTablePlan {
    pub table: String,
    pub op: AlterTableOp,
}

impl AlterTablePlan {
    pub fn new(table: impl Into<String>, op: AlterTableOp) -> Self {
        AlterTablePlan {
            table: table.into(),
            op,
        }
    }
}

// ============================================================================
// Statement Envelope
// ============================================================================

/// A single DDL statement, as submitted to the schema editor in a batch.
#[derive(Clone, Debug, PartialEq)]
pub enum DdlStatement {
    CreateTable(CreateTablePlan),
    CreateIndex(CreateIndexPlan),
    AlterTable(AlterTablePlan),
    DropTable(String),
    DropIndex(String),
}

impl DdlStatement {
    /// Short statement kind label, used in trace output.
    pub fn kind(&self) -> &'static str {
        match self {
            DdlStatement::CreateTable(_) => "CREATE TABLE",
            DdlStatement::CreateIndex(_) => "CREATE INDEX",
            DdlStatement::AlterTable(_) => "ALTER TABLE",
            DdlStatement::DropTable(_) => "DROP TABLE",
            DdlStatement::DropIndex(_) => "DROP INDEX",
        }
    }
}

impl From<CreateTablePlan> for DdlStatement {
    fn from(plan: CreateTablePlan) -> Self {
        DdlStatement::CreateTable(plan)
    }
}

impl From<CreateIndexPlan> for DdlStatement {
    fn from(plan: CreateIndexPlan) -> Self {
        DdlStatement::CreateIndex(plan)
    }
}

impl From<AlterTablePlan> for DdlStatement {
    fn from(plan: AlterTablePlan) -> Self {
        DdlStatement::AlterTable(plan)
    }
}
