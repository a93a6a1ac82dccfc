//! Scalar values exchanged with drivers, and the conversion table between kinds.
//!
//! Every model property and every bound parameter is a [`Value`]. Reading a
//! column into a property goes through [`Value::convert`], which resolves the
//! target by its [`ValueKind`] tag instead of by runtime type inspection.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind tag of a non-null [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    Text,
    Bytes,
    Date,
    DateTime,
    DateTimeUtc,
    Uuid,
}

impl ValueKind {
    /// Returns `true` for kinds whose values are right-trimmed when read.
    pub fn is_textual(self) -> bool {
        matches!(self, ValueKind::Text)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Text => "text",
            ValueKind::Bytes => "bytes",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::DateTimeUtc => "datetime_utc",
            ValueKind::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A nullable scalar value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    Uuid(Uuid),
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl Value {
    /// Kind tag, `None` for [`Value::Null`].
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ValueKind::Bool,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::DateTimeUtc(_) => ValueKind::DateTimeUtc,
            Value::Uuid(_) => ValueKind::Uuid,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn kind_name(&self) -> String {
        self.kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::I16(n) => Some(i64::from(*n)),
            Value::I32(n) => Some(i64::from(*n)),
            Value::I64(n) => Some(*n),
            Value::F32(f) => whole_float(f64::from(*f)),
            Value::F64(f) => whole_float(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::I16(n) => Some(f64::from(*n)),
            Value::I32(n) => Some(f64::from(*n)),
            Value::I64(n) => Some(*n as f64),
            Value::F32(f) => Some(f64::from(*f)),
            Value::F64(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert to the given kind using the conversion table.
    ///
    /// `Null` converts to `Null` for every kind. Unsupported pairs and values
    /// out of range for the target fail with [`DbError::Conversion`].
    pub fn convert(self, to: ValueKind) -> DbResult<Value> {
        if self.is_null() || self.kind() == Some(to) {
            return Ok(self);
        }
        let from = self.kind_name();
        let unsupported = || DbError::conversion(from.clone(), to.to_string(), "unsupported");

        let converted = match to {
            ValueKind::Bool => match &self {
                Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "1" => Some(Value::Bool(true)),
                    "false" | "f" | "no" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                Value::I16(_) | Value::I32(_) | Value::I64(_) => {
                    self.as_integer().map(|n| Value::Bool(n != 0))
                }
                _ => return Err(unsupported()),
            },
            ValueKind::I16 => integer_in_range(&self, |n| i16::try_from(n).ok().map(Value::I16)),
            ValueKind::I32 => integer_in_range(&self, |n| i32::try_from(n).ok().map(Value::I32)),
            ValueKind::I64 => integer_in_range(&self, |n| Some(Value::I64(n))),
            ValueKind::F32 => self.as_float().map(|f| Value::F32(f as f32)),
            ValueKind::F64 => self.as_float().map(Value::F64),
            ValueKind::Text => {
                return Ok(Value::Text(match self {
                    Value::Bool(b) => b.to_string(),
                    Value::I16(n) => n.to_string(),
                    Value::I32(n) => n.to_string(),
                    Value::I64(n) => n.to_string(),
                    Value::F32(f) => f.to_string(),
                    Value::F64(f) => f.to_string(),
                    Value::Bytes(b) => String::from_utf8(b).map_err(|e| {
                        DbError::conversion(from.clone(), to.to_string(), e.to_string())
                    })?,
                    Value::Date(d) => d.format("%Y-%m-%d").to_string(),
                    Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
                    Value::DateTimeUtc(dt) => dt.to_rfc3339(),
                    Value::Uuid(u) => u.hyphenated().to_string(),
                    Value::Null | Value::Text(_) => return Err(unsupported()),
                }));
            }
            ValueKind::Bytes => {
                return match self {
                    Value::Text(s) => Ok(Value::Bytes(s.into_bytes())),
                    Value::Uuid(u) => Ok(Value::Bytes(u.as_bytes().to_vec())),
                    _ => Err(unsupported()),
                };
            }
            ValueKind::Date => match &self {
                Value::Text(s) => parse_date(s).map(Value::Date),
                Value::DateTime(dt) => Some(Value::Date(dt.date())),
                Value::DateTimeUtc(dt) => Some(Value::Date(dt.date_naive())),
                _ => return Err(unsupported()),
            },
            ValueKind::DateTime => match &self {
                Value::Text(s) => parse_datetime(s).map(Value::DateTime),
                Value::Date(d) => Some(Value::DateTime(d.and_time(NaiveTime::MIN))),
                Value::DateTimeUtc(dt) => Some(Value::DateTime(dt.naive_utc())),
                _ => return Err(unsupported()),
            },
            ValueKind::DateTimeUtc => match &self {
                Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
                    .or_else(|| parse_datetime(s).map(|dt| dt.and_utc()))
                    .map(Value::DateTimeUtc),
                Value::DateTime(dt) => Some(Value::DateTimeUtc(dt.and_utc())),
                Value::Date(d) => Some(Value::DateTimeUtc(d.and_time(NaiveTime::MIN).and_utc())),
                _ => return Err(unsupported()),
            },
            ValueKind::Uuid => match &self {
                Value::Text(s) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),
                Value::Bytes(b) => Uuid::from_slice(b).ok().map(Value::Uuid),
                _ => return Err(unsupported()),
            },
        };

        converted.ok_or_else(|| {
            DbError::conversion(from, to.to_string(), format!("invalid value {self:?}"))
        })
    }
}

/// A float with no fractional part inside the `i64` range, as an integer.
fn whole_float(f: f64) -> Option<i64> {
    // 2^63; `i64::MAX as f64` rounds up to it.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-BOUND..BOUND).contains(&f)).then(|| f as i64)
}

fn integer_in_range(value: &Value, narrow: impl Fn(i64) -> Option<Value>) -> Option<Value> {
    value.as_integer().and_then(narrow)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::I16(n) => write!(f, "{n}"),
            Value::I32(n) => write!(f, "{n}"),
            Value::I64(n) => write!(f, "{n}"),
            Value::F32(n) => write!(f, "{n}"),
            Value::F64(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
            Value::DateTimeUtc(dt) => write!(f, "{dt}"),
            Value::Uuid(u) => write!(f, "{u}"),
        }
    }
}

/// Extract a typed value from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> DbResult<Self>;
}

/// A property type that can be mapped to a column.
///
/// Implemented for the supported scalars and for `Option<T>` of them. Model
/// descriptors record [`ScalarValue::KIND`] and [`ScalarValue::NULLABLE`] per
/// property.
pub trait ScalarValue: FromValue {
    /// Kind the column value is converted to before assignment.
    const KIND: ValueKind;
    /// Whether a `NULL` column can be stored in the property.
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;
}

macro_rules! impl_scalar {
    ($ty:ty, $kind:ident) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> DbResult<Self> {
                match value.convert(ValueKind::$kind)? {
                    Value::$kind(v) => Ok(v),
                    other => Err(DbError::conversion(
                        other.kind_name(),
                        stringify!($ty),
                        "unexpected value",
                    )),
                }
            }
        }

        impl ScalarValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn to_value(&self) -> Value {
                Value::$kind(self.clone())
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$kind(v)
            }
        }
    };
}

impl_scalar!(bool, Bool);
impl_scalar!(i16, I16);
impl_scalar!(i32, I32);
impl_scalar!(i64, I64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);
impl_scalar!(String, Text);
impl_scalar!(Vec<u8>, Bytes);
impl_scalar!(NaiveDate, Date);
impl_scalar!(NaiveDateTime, DateTime);
impl_scalar!(DateTime<Utc>, DateTimeUtc);
impl_scalar!(Uuid, Uuid);

impl FromValue for char {
    fn from_value(value: Value) -> DbResult<Self> {
        let text = String::from_value(value)?;
        text.chars()
            .next()
            .ok_or_else(|| DbError::conversion("text", "char", "empty string"))
    }
}

impl ScalarValue for char {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Text(c.to_string())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> DbResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: ScalarValue> ScalarValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::I16(i16::from(n))
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::I32(i32::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::I64(i64::from(n))
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> DbResult<Self> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_converts_to_null_for_every_kind() {
        assert_eq!(Value::Null.convert(ValueKind::I32).unwrap(), Value::Null);
        assert_eq!(Value::Null.convert(ValueKind::Text).unwrap(), Value::Null);
    }

    #[test]
    fn integers_narrow_with_range_check() {
        assert_eq!(Value::I64(42).convert(ValueKind::I32).unwrap(), Value::I32(42));
        assert_eq!(Value::I64(7).convert(ValueKind::I16).unwrap(), Value::I16(7));
        let err = Value::I64(i64::from(i32::MAX) + 1)
            .convert(ValueKind::I32)
            .unwrap_err();
        assert!(matches!(err, DbError::Conversion { .. }));
    }

    #[test]
    fn floats_outside_the_integer_range_do_not_saturate() {
        assert_eq!(Value::F64(12.0).convert(ValueKind::I64).unwrap(), Value::I64(12));
        for f in [1e20, -1e20, f64::NAN, f64::INFINITY] {
            let err = Value::F64(f).convert(ValueKind::I64).unwrap_err();
            assert!(matches!(err, DbError::Conversion { .. }));
        }
        assert!(Value::F32(3.0e19).convert(ValueKind::I64).is_err());
        assert!(Value::F64(2.5).convert(ValueKind::I32).is_err());
    }

    #[test]
    fn integer_to_bool_and_back() {
        assert_eq!(Value::I64(1).convert(ValueKind::Bool).unwrap(), Value::Bool(true));
        assert_eq!(Value::I64(0).convert(ValueKind::Bool).unwrap(), Value::Bool(false));
        assert_eq!(Value::Bool(true).convert(ValueKind::I64).unwrap(), Value::I64(1));
    }

    #[test]
    fn text_parses_into_dates_and_uuids() {
        let d = Value::Text("2024-03-01".into())
            .convert(ValueKind::Date)
            .unwrap();
        assert_eq!(d, Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));

        let dt = Value::Text("2024-03-01 10:20:30".into())
            .convert(ValueKind::DateTime)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(dt, Value::DateTime(expected));

        let id = Uuid::new_v4();
        let parsed = Value::Text(id.to_string()).convert(ValueKind::Uuid).unwrap();
        assert_eq!(parsed, Value::Uuid(id));
    }

    #[test]
    fn datetime_round_trips_through_text() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 58, 125)
            .unwrap();
        let text = Value::DateTime(dt).convert(ValueKind::Text).unwrap();
        assert_eq!(text.convert(ValueKind::DateTime).unwrap(), Value::DateTime(dt));
    }

    #[test]
    fn unsupported_pair_fails() {
        let err = Value::Bool(true).convert(ValueKind::Date).unwrap_err();
        assert!(matches!(err, DbError::Conversion { .. }));
        assert!(Value::Text("abc".into()).convert(ValueKind::I32).is_err());
    }

    #[test]
    fn option_scalars_accept_null() {
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(Value::I64(5)).unwrap(), Some(5));
        assert!(i32::from_value(Value::Null).is_err());
        assert!(<Option<String> as ScalarValue>::NULLABLE);
        assert_eq!(<Option<String> as ScalarValue>::KIND, ValueKind::Text);
    }

    #[test]
    fn char_reads_first_character() {
        assert_eq!(char::from_value(Value::Text("xyz".into())).unwrap(), 'x');
        assert!(char::from_value(Value::Text(String::new())).is_err());
    }
}
