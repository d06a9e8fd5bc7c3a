use std::fmt;

use super::Record;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub attribute: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.attribute, self.message)
    }
}

/// Failures collected by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError {
            attribute: attribute.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Returns true if any failure concerns `attribute`.
    pub fn on(&self, attribute: &str) -> bool {
        self.0.iter().any(|e| e.attribute == attribute)
    }

    /// `Ok(())` when empty, otherwise the collected failures.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validation capability injected into a model.
///
/// The rule set is up to the implementor; records only consume the result.
pub trait Validate: Send + Sync {
    fn validate(&self, record: &Record) -> Result<(), ValidationErrors>;
}

impl<F> Validate for F
where
    F: Fn(&Record) -> Result<(), ValidationErrors> + Send + Sync,
{
    fn validate(&self, record: &Record) -> Result<(), ValidationErrors> {
        self(record)
    }
}

/// Accepts every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl Validate for AlwaysValid {
    fn validate(&self, _record: &Record) -> Result<(), ValidationErrors> {
        Ok(())
    }
}
