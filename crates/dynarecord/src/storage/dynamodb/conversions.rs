//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between `AttributeValue` maps and wire
//! values. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use dynarecord_core::model::Key;
use dynarecord_core::storage::{Item, RepositoryError};
use dynarecord_core::types::{Value, ValueSet};

pub type AttributeMap = HashMap<String, AttributeValue>;

/// Convert a wire value to a DynamoDB attribute.
///
/// Sets of strings become `SS`, sets of numbers `NS`, other sets `L`. An
/// empty set has no DynamoDB form and is stored as `NULL`.
pub fn to_attribute(value: &Value) -> Result<AttributeValue, RepositoryError> {
    let attribute = match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Integer(_) | Value::Float(_) => AttributeValue::N(number(value)?),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Symbol(s) => AttributeValue::S(s.as_str().to_string()),
        Value::Date(d) => AttributeValue::S(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => AttributeValue::S(t.to_rfc3339()),
        Value::List(items) => {
            AttributeValue::L(items.iter().map(to_attribute).collect::<Result<_, _>>()?)
        }
        Value::Set(set) => set_to_attribute(set)?,
    };
    Ok(attribute)
}

fn set_to_attribute(set: &ValueSet) -> Result<AttributeValue, RepositoryError> {
    if set.is_empty() {
        return Ok(AttributeValue::Null(true));
    }

    if set.iter().all(|v| matches!(v, Value::String(_) | Value::Symbol(_))) {
        let strings = set
            .iter()
            .filter_map(|v| match v {
                Value::Symbol(s) => Some(s.as_str().to_string()),
                other => other.as_str().map(str::to_string),
            })
            .collect();
        return Ok(AttributeValue::Ss(strings));
    }

    if set.iter().all(|v| matches!(v, Value::Integer(_) | Value::Float(_))) {
        let numbers = set.iter().map(number).collect::<Result<_, _>>()?;
        return Ok(AttributeValue::Ns(numbers));
    }

    Ok(AttributeValue::L(
        set.iter().map(to_attribute).collect::<Result<_, _>>()?,
    ))
}

fn number(value: &Value) -> Result<String, RepositoryError> {
    match value {
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) if f.is_finite() => Ok(f.to_string()),
        other => Err(RepositoryError::Serialization(format!(
            "Cannot store {other:?} as a number"
        ))),
    }
}

/// Convert a DynamoDB attribute to a wire value.
pub fn from_attribute(attribute: &AttributeValue) -> Result<Value, RepositoryError> {
    let value = match attribute {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(items) => {
            Value::List(items.iter().map(from_attribute).collect::<Result<_, _>>()?)
        }
        AttributeValue::Ss(strings) => {
            Value::Set(strings.iter().map(|s| Value::from(s.as_str())).collect())
        }
        AttributeValue::Ns(numbers) => Value::Set(
            numbers
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<ValueSet, _>>()?,
        ),
        other => {
            return Err(RepositoryError::InvalidData(format!(
                "Unsupported attribute type: {other:?}"
            )))
        }
    };
    Ok(value)
}

fn parse_number(n: &str) -> Result<Value, RepositoryError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    n.parse::<f64>()
        .map(Value::Float)
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid number {}: {}", n, e)))
}

/// Convert an item to a DynamoDB attribute map.
pub fn item_to_attributes(item: &Item) -> Result<AttributeMap, RepositoryError> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), to_attribute(value)?)))
        .collect()
}

/// Convert a DynamoDB attribute map to an item. `NULL` attributes are dropped.
pub fn attributes_to_item(attributes: &AttributeMap) -> Result<Item, RepositoryError> {
    let mut item = Item::with_capacity(attributes.len());
    for (name, attribute) in attributes {
        let value = from_attribute(attribute)?;
        if !value.is_null() {
            item.insert(name.clone(), value);
        }
    }
    Ok(item)
}

/// Convert a key to the DynamoDB key map.
pub fn key_to_attributes(key: &Key) -> Result<AttributeMap, RepositoryError> {
    key.parts()
        .map(|part| Ok((part.name.clone(), to_attribute(&part.value)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use dynarecord_core::model::KeyPart;

    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(to_attribute(&Value::Integer(42)).unwrap(), AttributeValue::N("42".into()));
        assert_eq!(to_attribute(&Value::Float(1.5)).unwrap(), AttributeValue::N("1.5".into()));
        assert_eq!(to_attribute(&Value::from("hi")).unwrap(), AttributeValue::S("hi".into()));
        assert_eq!(to_attribute(&Value::Bool(true)).unwrap(), AttributeValue::Bool(true));
        assert_eq!(to_attribute(&Value::Null).unwrap(), AttributeValue::Null(true));
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        let result = to_attribute(&Value::Float(f64::NAN));
        assert!(matches!(result, Err(RepositoryError::Serialization(_))));
    }

    #[test]
    fn test_numbers_parse_as_integer_when_possible() {
        assert_eq!(
            from_attribute(&AttributeValue::N("2015".into())).unwrap(),
            Value::Integer(2015)
        );
        assert_eq!(
            from_attribute(&AttributeValue::N("1420070400.25".into())).unwrap(),
            Value::Float(1420070400.25)
        );
        assert!(from_attribute(&AttributeValue::N("abc".into())).is_err());
    }

    #[test]
    fn test_string_and_number_sets() {
        let strings: ValueSet = [Value::from("a"), Value::from("b")].into_iter().collect();
        let numbers: ValueSet = [Value::Integer(1), Value::Integer(2)].into_iter().collect();

        match to_attribute(&Value::Set(strings.clone())).unwrap() {
            AttributeValue::Ss(mut values) => {
                values.sort();
                assert_eq!(values, ["a", "b"]);
            }
            other => panic!("expected SS, got {other:?}"),
        }
        assert!(matches!(
            to_attribute(&Value::Set(numbers.clone())).unwrap(),
            AttributeValue::Ns(_)
        ));

        let back = from_attribute(&AttributeValue::Ns(vec!["2".into(), "1".into()])).unwrap();
        assert_eq!(back, Value::Set(numbers));
    }

    #[test]
    fn test_mixed_and_empty_sets() {
        let mixed: ValueSet = [Value::from("a"), Value::Integer(1)].into_iter().collect();

        assert!(matches!(
            to_attribute(&Value::Set(mixed)).unwrap(),
            AttributeValue::L(items) if items.len() == 2
        ));
        assert_eq!(
            to_attribute(&Value::Set(ValueSet::new())).unwrap(),
            AttributeValue::Null(true)
        );
    }

    #[test]
    fn test_unsupported_attribute_types() {
        let map = AttributeValue::M(HashMap::new());
        assert!(matches!(
            from_attribute(&map),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_item_conversion_drops_nulls() {
        let attributes: AttributeMap = [
            ("id".to_string(), AttributeValue::S("a".into())),
            ("gone".to_string(), AttributeValue::Null(true)),
        ]
        .into_iter()
        .collect();

        let item = attributes_to_item(&attributes).unwrap();

        assert_eq!(item.len(), 1);
        assert_eq!(item.get("id"), Some(&Value::from("a")));
    }

    #[test]
    fn test_key_to_attributes() {
        let key = Key::new(KeyPart::new("room", "lobby")).with_range(KeyPart::new("seq", 3));

        let attributes = key_to_attributes(&key).unwrap();

        assert_eq!(attributes.get("room"), Some(&AttributeValue::S("lobby".into())));
        assert_eq!(attributes.get("seq"), Some(&AttributeValue::N("3".into())));
    }
}
