use std::fmt;

use crate::error::Error;

/// A failure produced while applying a batch of DDL statements.
///
/// Batches are all-or-nothing: the first failing statement aborts the whole
/// batch and no schema change is published. `statement_index` is the
/// zero-based position of the statement the failure is attributed to. It is
/// `None` only for failures that cannot be pinned to a single statement,
/// such as a whole-graph validation error after every statement staged
/// cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub statement_index: Option<usize>,
    pub error: Error,
}

impl BatchError {
    /// Attributes `error` to the statement at `index`.
    #[inline]
    pub fn at(index: usize, error: Error) -> Self {
        BatchError {
            statement_index: Some(index),
            error,
        }
    }

    /// Wraps an error that applies to the batch as a whole.
    #[inline]
    pub fn whole_batch(error: Error) -> Self {
        BatchError {
            statement_index: None,
            error,
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.statement_index {
            Some(index) => write!(f, "statement {index}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<Error> for BatchError {
    fn from(error: Error) -> Self {
        BatchError::whole_batch(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObjectKind;

    #[test]
    fn display_prefixes_statement_index() {
        let err = BatchError::at(2, Error::name_not_found(ObjectKind::Table, "Albums"));
        assert_eq!(err.to_string(), "statement 2: table not found: Albums");
    }

    #[test]
    fn whole_batch_errors_have_no_index() {
        let err = BatchError::whole_batch(Error::internal("validation failed"));
        assert_eq!(err.statement_index, None);
    }
}
