//! Format coercion rules.
//!
//! Every rule takes a non-null value and returns its coerced form. Null
//! handling and element coercion for enumerables are applied by
//! [`TypeDeclaration`](super::TypeDeclaration) before a rule runs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::error::CoercionError;
use super::{Format, Symbol, Value, ValueSet};

/// A single coercion rule.
pub type Rule = fn(Value) -> Result<Value, CoercionError>;

/// The getter/setter pair installed for a declared attribute.
#[derive(Debug, Clone, Copy)]
pub struct Accessor {
    /// Raw wire value to typed value.
    pub read: Rule,
    /// Incoming value to raw wire value.
    pub write: Rule,
}

impl Accessor {
    pub fn new(read: Rule, write: Rule) -> Self {
        Self { read, write }
    }
}

/// Whether a scalar may stand in for an enumerable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionMode {
    /// Setters: a scalar is wrapped into a one-element collection.
    #[default]
    Lenient,
    /// Validated lookups: a scalar where an enumerable is declared is an error.
    Strict,
}

fn invalid(format: Format, value: &Value) -> CoercionError {
    CoercionError::InvalidValue {
        format,
        kind: value.kind(),
        value: value.to_string(),
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(midnight)
        })
}

/// Truncates to an integer.
pub fn to_integer(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(i)),
        Value::Float(f) if f.is_finite() => Ok(Value::Integer(f.trunc() as i64)),
        Value::String(_) | Value::Symbol(_) => value
            .as_str()
            .and_then(parse_integer)
            .map(Value::Integer)
            .ok_or_else(|| invalid(Format::Integer, &value)),
        Value::Time(t) => Ok(Value::Integer(t.timestamp())),
        other => Err(invalid(Format::Integer, &other)),
    }
}

/// Casts to a floating point number.
pub fn to_float(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Integer(i) => Ok(Value::Float(i as f64)),
        Value::String(_) | Value::Symbol(_) => value
            .as_str()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(Value::Float)
            .ok_or_else(|| invalid(Format::Float, &value)),
        Value::Date(d) => Ok(Value::Float(epoch_seconds(midnight(d)))),
        Value::Time(t) => Ok(Value::Float(epoch_seconds(t))),
        other => Err(invalid(Format::Float, &other)),
    }
}

pub fn stringify(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::String(s) => Ok(Value::String(s)),
        other => Ok(Value::String(other.to_string())),
    }
}

pub fn to_symbol(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Symbol(s) => Ok(Value::Symbol(s)),
        Value::String(s) => Ok(Value::Symbol(Symbol::intern(&s))),
        other => Ok(Value::Symbol(Symbol::intern(&other.to_string()))),
    }
}

pub fn pass_through(value: Value) -> Result<Value, CoercionError> {
    Ok(value)
}

/// Converts dates, times, numbers and timestamp strings to epoch seconds.
pub fn to_epoch_seconds(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Integer(i) => Ok(Value::Float(i as f64)),
        Value::Date(d) => Ok(Value::Float(epoch_seconds(midnight(d)))),
        Value::Time(t) => Ok(Value::Float(epoch_seconds(t))),
        Value::String(ref s) => parse_time(s)
            .map(|t| Value::Float(epoch_seconds(t)))
            .ok_or_else(|| invalid(Format::Time, &value)),
        other => Err(invalid(Format::Time, &other)),
    }
}

fn time_of(value: &Value, format: Format) -> Result<DateTime<Utc>, CoercionError> {
    let time = match value {
        Value::Time(t) => Some(*t),
        Value::Date(d) => Some(midnight(*d)),
        Value::Float(f) => from_epoch_seconds(*f),
        Value::Integer(i) => DateTime::from_timestamp(*i, 0),
        Value::String(s) => parse_time(s).or_else(|| {
            s.trim()
                .parse::<f64>()
                .ok()
                .and_then(from_epoch_seconds)
        }),
        _ => None,
    };
    time.ok_or_else(|| invalid(format, value))
}

/// Interprets epoch seconds as a UTC timestamp.
pub fn to_time(value: Value) -> Result<Value, CoercionError> {
    time_of(&value, Format::Time).map(Value::Time)
}

/// Interprets epoch seconds as a UTC calendar date.
pub fn to_date(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Date(d) => Ok(Value::Date(d)),
        other => time_of(&other, Format::Date).map(|t| Value::Date(t.date_naive())),
    }
}

/// Collects any enumerable into an ordered list; a scalar is wrapped.
pub fn to_list(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::List(items) => Ok(Value::List(items)),
        Value::Set(set) => Ok(Value::List(set.into_iter().collect())),
        scalar => Ok(Value::List(vec![scalar])),
    }
}

/// Collects any enumerable into a deduplicated set; a scalar is wrapped.
pub fn to_set(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Set(set) => Ok(Value::Set(set)),
        Value::List(items) => Ok(Value::Set(items.into_iter().collect())),
        scalar => Ok(Value::Set(ValueSet::from_iter([scalar]))),
    }
}

/// Applies `rule` to every non-null element of a list or set.
///
/// Scalars are returned untouched; the outer rule wraps them.
pub fn map_elements(value: Value, rule: Rule) -> Result<Value, CoercionError> {
    let apply = |item: Value| {
        if item.is_null() {
            Ok(item)
        } else {
            rule(item)
        }
    };
    match value {
        Value::List(items) => items
            .into_iter()
            .map(apply)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Value::Set(set) => set
            .into_iter()
            .map(apply)
            .collect::<Result<ValueSet, _>>()
            .map(Value::Set),
        scalar => Ok(scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_integer_from_numeric_string() {
        assert_eq!(to_integer(Value::from("2015")).unwrap(), Value::Integer(2015));
        assert_eq!(to_integer(Value::from(" 42 ")).unwrap(), Value::Integer(42));
        assert_eq!(to_integer(Value::from("3.9")).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_integer_truncates_floats() {
        assert_eq!(to_integer(Value::Float(-2.7)).unwrap(), Value::Integer(-2));
    }

    #[test]
    fn test_integer_rejects_garbage() {
        assert!(matches!(
            to_integer(Value::from("abc")),
            Err(CoercionError::InvalidValue {
                format: Format::Integer,
                ..
            })
        ));
        assert!(to_integer(Value::Bool(true)).is_err());
    }

    #[test]
    fn test_float_cast() {
        assert_eq!(to_float(Value::Integer(3)).unwrap(), Value::Float(3.0));
        assert_eq!(to_float(Value::from("1.5")).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(Value::Integer(7)).unwrap(), Value::from("7"));
        assert_eq!(
            stringify(Value::Symbol(Symbol::intern("on"))).unwrap(),
            Value::from("on")
        );
    }

    #[test]
    fn test_symbol_read_interns() {
        let value = to_symbol(Value::from("draft")).unwrap();
        assert_eq!(value.as_symbol(), Some(&Symbol::intern("draft")));
    }

    #[test]
    fn test_date_write_and_read() {
        let raw = to_epoch_seconds(Value::Date(date(2024, 6, 15))).unwrap();
        assert_eq!(raw, Value::Float(1_718_409_600.0));
        assert_eq!(to_date(raw).unwrap(), Value::Date(date(2024, 6, 15)));
    }

    #[test]
    fn test_date_read_drops_time_of_day() {
        let noon = date(2024, 6, 15).and_hms_opt(12, 30, 0).unwrap().and_utc();
        let raw = to_epoch_seconds(Value::Time(noon)).unwrap();
        assert_eq!(to_date(raw).unwrap(), Value::Date(date(2024, 6, 15)));
    }

    #[test]
    fn test_time_keeps_subsecond_precision() {
        let time = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        let raw = to_epoch_seconds(Value::Time(time)).unwrap();
        assert_eq!(raw, Value::Float(1_700_000_000.25));
        assert_eq!(to_time(raw).unwrap(), Value::Time(time));
    }

    #[test]
    fn test_time_from_strings() {
        let raw = to_epoch_seconds(Value::from("2024-01-15T10:30:00Z")).unwrap();
        assert_eq!(raw, Value::Float(1_705_314_600.0));
        let raw = to_epoch_seconds(Value::from("2024-01-15")).unwrap();
        assert_eq!(raw, Value::Float(1_705_276_800.0));
        assert!(to_epoch_seconds(Value::from("yesterday")).is_err());
    }

    #[test]
    fn test_list_wraps_scalar() {
        assert_eq!(to_list(Value::Integer(1)).unwrap(), Value::from(vec![1]));
    }

    #[test]
    fn test_set_from_list_deduplicates() {
        let set = to_set(Value::from(vec![1, 1, 2])).unwrap();
        assert_eq!(set.as_set().map(ValueSet::len), Some(2));
    }

    #[test]
    fn test_map_elements_keeps_nulls_and_scalars() {
        let list = Value::List(vec![Value::from("1"), Value::Null]);
        assert_eq!(
            map_elements(list, to_integer).unwrap(),
            Value::List(vec![Value::Integer(1), Value::Null])
        );
        assert_eq!(
            map_elements(Value::from("5"), to_integer).unwrap(),
            Value::from("5")
        );
    }
}
