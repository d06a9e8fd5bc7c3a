use std::collections::HashMap;

use super::coercion::CoercionMode;
use super::declaration::{TypeDeclaration, TypeOptions};
use super::error::{CoercionError, DeclarationError};
use super::{Format, Value};

/// Per-model table of attribute declarations keyed by attribute name.
///
/// Names that were never declared are untyped: values pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    declarations: HashMap<String, TypeDeclaration>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` with the given format name, replacing any earlier declaration.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        format: impl AsRef<str>,
        options: TypeOptions,
    ) -> Result<(), DeclarationError> {
        let format: Format = format.as_ref().parse()?;
        let declaration = TypeDeclaration::new(name, format, options)?;
        self.declarations
            .insert(declaration.name().to_string(), declaration);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn format_of(&self, name: &str) -> Option<Format> {
        self.get(name).map(TypeDeclaration::format)
    }

    /// Iterates over declared attribute names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Applies the write rule for `name`, or returns `value` unchanged if untyped.
    pub fn write(
        &self,
        name: &str,
        value: Value,
        mode: CoercionMode,
    ) -> Result<Value, CoercionError> {
        match self.get(name) {
            Some(declaration) => declaration.write(value, mode),
            None => Ok(value),
        }
    }

    /// Applies the read rule for `name` to an optional raw value.
    ///
    /// Absent raw values read as the declared default, or null if untyped.
    pub fn read(&self, name: &str, raw: Option<&Value>) -> Result<Value, CoercionError> {
        match (self.get(name), raw) {
            (Some(declaration), Some(raw)) => declaration.read(raw),
            (Some(declaration), None) => declaration.read(&Value::Null),
            (None, Some(raw)) => Ok(raw.clone()),
            (None, None) => Ok(Value::Null),
        }
    }
}
