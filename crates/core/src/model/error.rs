use thiserror::Error;

use crate::types::CoercionError;

/// Errors raised while reading or mutating a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Key attribute '{0}' is read-only")]
    ReadOnlyKey(String),
    #[error("Missing key attribute: {0}")]
    MissingKey(String),
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}
