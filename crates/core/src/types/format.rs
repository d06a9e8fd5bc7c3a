use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::coercion::{self, Accessor};
use super::error::DeclarationError;
use super::value::{Value, ValueSet};

/// The declared storage format of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Integer,
    Float,
    String,
    Symbol,
    Boolean,
    Date,
    Time,
    Array,
    Set,
}

impl Format {
    /// Every supported format, in declaration order.
    pub const ALL: [Format; 9] = [
        Format::Integer,
        Format::Float,
        Format::String,
        Format::Symbol,
        Format::Boolean,
        Format::Date,
        Format::Time,
        Format::Array,
        Format::Set,
    ];

    /// Returns the lowercase name used in declarations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Integer => "integer",
            Format::Float => "float",
            Format::String => "string",
            Format::Symbol => "symbol",
            Format::Boolean => "boolean",
            Format::Date => "date",
            Format::Time => "time",
            Format::Array => "array",
            Format::Set => "set",
        }
    }

    /// Returns true for `array` and `set`.
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Format::Array | Format::Set)
    }

    /// The value used when no raw value is present and no default was declared.
    pub fn natural_default(&self) -> Value {
        match self {
            Format::Array => Value::List(Vec::new()),
            Format::Set => Value::Set(ValueSet::new()),
            _ => Value::Null,
        }
    }

    /// Returns the read/write rule pair for this format.
    pub fn accessor(&self) -> Accessor {
        match self {
            Format::Integer => Accessor::new(coercion::to_integer, coercion::to_integer),
            Format::Float => Accessor::new(coercion::to_float, coercion::to_float),
            Format::String => Accessor::new(coercion::stringify, coercion::stringify),
            Format::Symbol => Accessor::new(coercion::to_symbol, coercion::stringify),
            Format::Boolean => Accessor::new(coercion::pass_through, coercion::pass_through),
            Format::Date => Accessor::new(coercion::to_date, coercion::to_epoch_seconds),
            Format::Time => Accessor::new(coercion::to_time, coercion::to_epoch_seconds),
            Format::Array => Accessor::new(coercion::to_list, coercion::to_list),
            Format::Set => Accessor::new(coercion::to_set, coercion::to_set),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Format {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Format {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| DeclarationError::UnsupportedType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_format_name() {
        for format in Format::ALL {
            assert_eq!(format.as_str().parse::<Format>().unwrap(), format);
        }
    }

    #[test]
    fn test_parse_unknown_format() {
        let result = "decimal".parse::<Format>();
        assert_eq!(
            result,
            Err(DeclarationError::UnsupportedType("decimal".to_string()))
        );
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Integer".parse::<Format>().is_err());
    }

    #[test]
    fn test_natural_defaults() {
        assert_eq!(Format::Array.natural_default(), Value::List(vec![]));
        assert_eq!(Format::Set.natural_default(), Value::Set(ValueSet::new()));
        assert_eq!(Format::Integer.natural_default(), Value::Null);
        assert_eq!(Format::Time.natural_default(), Value::Null);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Format::Boolean).unwrap();
        assert_eq!(json, "\"boolean\"");
        let parsed: Format = serde_json::from_str("\"set\"").unwrap();
        assert_eq!(parsed, Format::Set);
    }
}
