use super::coercion::{self, Accessor, CoercionMode};
use super::error::{CoercionError, DeclarationError};
use super::{Format, Value};

/// Options accepted when declaring an attribute.
#[derive(Debug, Clone, Default)]
pub struct TypeOptions {
    /// Format each element of an `array` or `set` is coerced to.
    pub element_format: Option<Format>,
    /// Value used when the attribute is absent or written as null.
    pub default: Option<Value>,
}

impl TypeOptions {
    /// Sets the element format for enumerables.
    pub fn of(mut self, format: Format) -> Self {
        self.element_format = Some(format);
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A declared attribute: its format, element format, default and accessor pair.
///
/// Immutable once built and shared by every record of the model.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    name: String,
    format: Format,
    element_format: Option<Format>,
    default: Value,
    accessor: Accessor,
    element: Option<Accessor>,
}

impl TypeDeclaration {
    pub fn new(
        name: impl Into<String>,
        format: Format,
        options: TypeOptions,
    ) -> Result<Self, DeclarationError> {
        let name = name.into();

        if let Some(element_format) = options.element_format {
            if !format.is_enumerable() {
                return Err(DeclarationError::InvalidDeclaration {
                    attribute: name,
                    reason: format!("element format is only allowed on array or set, not {format}"),
                });
            }
            if element_format.is_enumerable() {
                return Err(DeclarationError::InvalidDeclaration {
                    attribute: name,
                    reason: format!(
                        "nested enumerables are not supported ({format} of {element_format})"
                    ),
                });
            }
        }

        let mut declaration = Self {
            format,
            element_format: options.element_format,
            default: format.natural_default(),
            accessor: format.accessor(),
            element: options.element_format.map(|f| f.accessor()),
            name,
        };

        if let Some(default) = options.default {
            declaration.default = declaration
                .write(default, CoercionMode::Lenient)
                .map_err(|e| DeclarationError::InvalidDeclaration {
                    attribute: declaration.name.clone(),
                    reason: format!("invalid default: {e}"),
                })?;
        }

        Ok(declaration)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn element_format(&self) -> Option<Format> {
        self.element_format
    }

    /// The raw default stored when the attribute is written as null.
    pub fn default_raw(&self) -> &Value {
        &self.default
    }

    /// Coerces an incoming value to its raw wire form.
    pub fn write(&self, value: Value, mode: CoercionMode) -> Result<Value, CoercionError> {
        if value.is_null() {
            return Ok(self.default.clone());
        }
        let value = if self.format.is_enumerable() {
            let value = if value.is_enumerable() {
                value
            } else if mode == CoercionMode::Strict {
                return Err(CoercionError::InvalidEnumerableValue {
                    attribute: self.name.clone(),
                    kind: value.kind(),
                });
            } else {
                // Wrap first so the element rule sees the lone scalar too.
                (self.accessor.write)(value)?
            };
            match self.element {
                Some(element) => coercion::map_elements(value, element.write)?,
                None => value,
            }
        } else {
            value
        };
        (self.accessor.write)(value)
    }

    /// Coerces a raw wire value to its typed form.
    pub fn read(&self, raw: &Value) -> Result<Value, CoercionError> {
        if raw.is_null() {
            return self.read_default();
        }
        let value = match self.element {
            Some(element) if self.format.is_enumerable() => {
                coercion::map_elements(raw.clone(), element.read)?
            }
            _ => raw.clone(),
        };
        (self.accessor.read)(value)
    }

    fn read_default(&self) -> Result<Value, CoercionError> {
        if self.default.is_null() {
            return Ok(Value::Null);
        }
        let value = match self.element {
            Some(element) => coercion::map_elements(self.default.clone(), element.read)?,
            None => self.default.clone(),
        };
        (self.accessor.read)(value)
    }
}
