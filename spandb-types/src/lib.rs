//! Column type model and shared schema vocabulary for spandb.
//!
//! Types render to their canonical DDL spelling via [`fmt::Display`]:
//! `INT64`, `STRING(256)`, `BYTES(MAX)`, `ARRAY<BOOL>` and so on. The
//! canonical spelling is what the information schema reports in
//! `SPANNER_TYPE` columns, so the formatting here is load-bearing.

use std::fmt;

use spandb_result::{Error, Result};

/// Maximum declarable length for `STRING(N)` columns.
pub const MAX_STRING_LENGTH: u32 = 2_621_440;

/// Maximum declarable length for `BYTES(N)` columns.
pub const MAX_BYTES_LENGTH: u32 = 10_485_760;

/// Declared length of a `STRING` or `BYTES` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeLength {
    /// An explicit bound, e.g. `STRING(256)`.
    Fixed(u32),
    /// The type's maximum, spelled `MAX` in DDL.
    Max,
}

impl fmt::Display for TypeLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLength::Fixed(n) => write!(f, "{n}"),
            TypeLength::Max => f.write_str("MAX"),
        }
    }
}

/// A scalar (non-array) column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int64,
    Float64,
    String(TypeLength),
    Bytes(TypeLength),
    Timestamp,
    Date,
}

impl ScalarType {
    /// Checks declared lengths against the per-type maxima. Zero-length
    /// declarations are rejected as well.
    pub fn validate(&self) -> Result<()> {
        let (limit, length) = match self {
            ScalarType::String(len) => (MAX_STRING_LENGTH, len),
            ScalarType::Bytes(len) => (MAX_BYTES_LENGTH, len),
            _ => return Ok(()),
        };
        if let TypeLength::Fixed(n) = length {
            if *n == 0 || *n > limit {
                return Err(Error::invalid_schema_change(format!(
                    "declared length {n} for type {self} is outside the range [1, {limit}]"
                )));
            }
        }
        Ok(())
    }

    /// Whether this type supports the `allow_commit_timestamp` column option.
    pub fn allows_commit_timestamp(&self) -> bool {
        matches!(self, ScalarType::Timestamp)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => f.write_str("BOOL"),
            ScalarType::Int64 => f.write_str("INT64"),
            ScalarType::Float64 => f.write_str("FLOAT64"),
            ScalarType::String(len) => write!(f, "STRING({len})"),
            ScalarType::Bytes(len) => write!(f, "BYTES({len})"),
            ScalarType::Timestamp => f.write_str("TIMESTAMP"),
            ScalarType::Date => f.write_str("DATE"),
        }
    }
}

/// A full column type: a scalar or a one-dimensional array of scalars.
///
/// Arrays of arrays are unrepresentable, which matches the DDL grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Scalar(ScalarType),
    Array(ScalarType),
}

impl ColumnType {
    /// Checks declared lengths on the element type.
    pub fn validate(&self) -> Result<()> {
        match self {
            ColumnType::Scalar(inner) | ColumnType::Array(inner) => inner.validate(),
        }
    }

    /// Whether this type may participate in a primary key or index key.
    /// Array columns never can.
    pub fn is_key_compatible(&self) -> bool {
        matches!(self, ColumnType::Scalar(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ColumnType::Array(_))
    }

    /// The scalar element type: the type itself for scalars, the element
    /// type for arrays.
    pub fn element(&self) -> ScalarType {
        match self {
            ColumnType::Scalar(inner) | ColumnType::Array(inner) => *inner,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Scalar(inner) => write!(f, "{inner}"),
            ColumnType::Array(inner) => write!(f, "ARRAY<{inner}>"),
        }
    }
}

/// Sort direction of a key part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delete behavior of an interleaved child table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OnDeleteAction {
    #[default]
    NoAction,
    Cascade,
}

impl OnDeleteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDeleteAction::NoAction => "NO ACTION",
            OnDeleteAction::Cascade => "CASCADE",
        }
    }
}

impl fmt::Display for OnDeleteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_type_strings() {
        assert_eq!(ColumnType::Scalar(ScalarType::Int64).to_string(), "INT64");
        assert_eq!(
            ColumnType::Scalar(ScalarType::String(TypeLength::Fixed(256))).to_string(),
            "STRING(256)"
        );
        assert_eq!(
            ColumnType::Scalar(ScalarType::Bytes(TypeLength::Max)).to_string(),
            "BYTES(MAX)"
        );
        assert_eq!(
            ColumnType::Array(ScalarType::String(TypeLength::Max)).to_string(),
            "ARRAY<STRING(MAX)>"
        );
        assert_eq!(
            ColumnType::Array(ScalarType::Timestamp).to_string(),
            "ARRAY<TIMESTAMP>"
        );
    }

    #[test]
    fn length_limits_are_enforced() {
        assert!(ScalarType::String(TypeLength::Fixed(MAX_STRING_LENGTH)).validate().is_ok());
        assert!(ScalarType::String(TypeLength::Fixed(MAX_STRING_LENGTH + 1)).validate().is_err());
        assert!(ScalarType::Bytes(TypeLength::Fixed(0)).validate().is_err());
        assert!(ScalarType::Bytes(TypeLength::Max).validate().is_ok());
        assert!(ColumnType::Array(ScalarType::String(TypeLength::Fixed(0))).validate().is_err());
    }

    #[test]
    fn arrays_are_not_key_compatible() {
        assert!(ColumnType::Scalar(ScalarType::Date).is_key_compatible());
        assert!(!ColumnType::Array(ScalarType::Int64).is_key_compatible());
    }

    #[test]
    fn commit_timestamp_option_only_on_timestamp() {
        assert!(ScalarType::Timestamp.allows_commit_timestamp());
        assert!(!ScalarType::String(TypeLength::Max).allows_commit_timestamp());
    }
}
