use std::fmt;

use thiserror::Error as ThisError;

/// The kind of schema object a name-resolution error refers to.
///
/// Carried by [`Error::NameAlreadyExists`] and [`Error::NameNotFound`] so
/// callers can distinguish, say, a missing table from a missing column without
/// parsing the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Table,
    Column,
    Index,
    Constraint,
    /// A name that is reserved or shared across object namespaces.
    SchemaObject,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::Index => "index",
            ObjectKind::Constraint => "constraint",
            ObjectKind::SchemaObject => "schema object",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for all spandb schema operations.
///
/// # Examples
///
/// ```
/// use spandb_result::{Error, ObjectKind};
///
/// let err = Error::name_not_found(ObjectKind::Table, "Users");
/// assert!(matches!(err, Error::NameNotFound { .. }));
/// ```
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A created object's name collides with an existing object in the same
    /// namespace.
    ///
    /// Which objects share a namespace depends on the editor's namespace
    /// configuration; tables and indexes may or may not collide with each
    /// other, while constraints always share a namespace with indexes.
    #[error("{kind} already exists: {name}")]
    NameAlreadyExists { kind: ObjectKind, name: String },

    /// A referenced object does not exist.
    ///
    /// Raised when a statement names a table, column, index or constraint
    /// that is absent from both the base schema and the staged changes of
    /// the current batch.
    #[error("{kind} not found: {name}")]
    NameNotFound { kind: ObjectKind, name: String },

    /// A structurally valid change that violates a schema rule.
    ///
    /// Covers key-prefix violations for interleaved tables, dropping objects
    /// that other objects depend on, illegal column type transitions, foreign
    /// key column mismatches, and similar semantic failures.
    #[error("invalid schema change: {0}")]
    InvalidSchemaChange(String),

    /// A recognized capability that this engine does not implement.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// An internal invariant was violated. Always indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a [`Error::NameAlreadyExists`] error.
    #[inline]
    pub fn name_already_exists(kind: ObjectKind, name: impl Into<String>) -> Self {
        Error::NameAlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Creates a [`Error::NameNotFound`] error.
    #[inline]
    pub fn name_not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        Error::NameNotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates an [`Error::InvalidSchemaChange`] error.
    #[inline]
    pub fn invalid_schema_change(msg: impl Into<String>) -> Self {
        Error::InvalidSchemaChange(msg.into())
    }

    /// Creates an [`Error::UnsupportedFeature`] error.
    #[inline]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedFeature(msg.into())
    }

    /// Creates an [`Error::Internal`] error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_object_kind_and_name() {
        let err = Error::name_already_exists(ObjectKind::Index, "IDX_Users_Email_U_deadbeefdeadbeef");
        assert_eq!(
            err.to_string(),
            "index already exists: IDX_Users_Email_U_deadbeefdeadbeef"
        );
    }

    #[test]
    fn errors_are_matchable() {
        let err = Error::invalid_schema_change("key prefix mismatch");
        match err {
            Error::InvalidSchemaChange(msg) => assert!(msg.contains("prefix")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
