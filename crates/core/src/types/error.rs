use thiserror::Error;

use super::Format;

/// Errors raised while declaring attribute types on a model.
///
/// These are programmer errors surfaced at model-definition time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("Unsupported attribute type: {0}")]
    UnsupportedType(String),
    #[error("Invalid declaration for attribute '{attribute}': {reason}")]
    InvalidDeclaration { attribute: String, reason: String },
}

/// Errors raised while coercing a value through a format rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("Attribute '{attribute}' expects an array or set, got {kind}")]
    InvalidEnumerableValue {
        attribute: String,
        kind: &'static str,
    },
    #[error("Cannot coerce {kind} value '{value}' to {format}")]
    InvalidValue {
        format: Format,
        kind: &'static str,
        value: String,
    },
}
