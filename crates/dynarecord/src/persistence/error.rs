use dynarecord_core::model::{RecordError, ValidationErrors};
use dynarecord_core::storage::RepositoryError;
use dynarecord_core::types::{CoercionError, DeclarationError};
use thiserror::Error;

/// Errors returned by model operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{model} not found: {key}")]
    NotFound { model: String, key: String },
    #[error("{model} failed validation: {errors}")]
    ValidationFailed {
        model: String,
        errors: ValidationErrors,
    },
    #[error("Batch of {requested} keys exceeds the limit of {limit}")]
    BatchSizeExceeded { requested: usize, limit: usize },
    #[error("Cannot touch {model}: record has not been saved")]
    StaleRecord { model: String },
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CoercionError> for Error {
    fn from(err: CoercionError) -> Self {
        Self::Record(RecordError::Coercion(err))
    }
}

impl Error {
    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;
