//! Scalar kinds and the values constraints are evaluated against

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Kind of a scalar property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarKind {
    String,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    DateTime,
    DateTimeOffset,
    Guid,
}

impl ScalarKind {
    /// Canonical data type tag used in schemas
    pub fn data_type(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Decimal => "money",
            ScalarKind::Boolean => "boolean",
            ScalarKind::DateTime => "dateTime",
            ScalarKind::DateTimeOffset => "dateTimeOffset",
            ScalarKind::Guid => "guid",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_type())
    }
}

/// A single scalar value.
///
/// Serialized externally tagged (`{"int": 14}`) so descriptor files keep the
/// exact kind of a bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Monetary amounts; serialized as a string so no digit is lost
    Decimal(Decimal),
    Boolean(bool),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Guid(Uuid),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Int(_) => ScalarKind::Int,
            ScalarValue::Long(_) => ScalarKind::Long,
            ScalarValue::Float(_) => ScalarKind::Float,
            ScalarValue::Double(_) => ScalarKind::Double,
            ScalarValue::Decimal(_) => ScalarKind::Decimal,
            ScalarValue::Boolean(_) => ScalarKind::Boolean,
            ScalarValue::DateTime(_) => ScalarKind::DateTime,
            ScalarValue::DateTimeOffset(_) => ScalarKind::DateTimeOffset,
            ScalarValue::Guid(_) => ScalarKind::Guid,
        }
    }

    /// Compare two values of the same kind. Values of different kinds, and
    /// NaN floats, are not comparable.
    pub fn compare(&self, other: &ScalarValue) -> Option<Ordering> {
        use ScalarValue as S;
        match (self, other) {
            (S::String(a), S::String(b)) => Some(a.cmp(b)),
            (S::Int(a), S::Int(b)) => Some(a.cmp(b)),
            (S::Long(a), S::Long(b)) => Some(a.cmp(b)),
            (S::Float(a), S::Float(b)) => a.partial_cmp(b),
            (S::Double(a), S::Double(b)) => a.partial_cmp(b),
            (S::Decimal(a), S::Decimal(b)) => Some(a.cmp(b)),
            (S::Boolean(a), S::Boolean(b)) => Some(a.cmp(b)),
            (S::DateTime(a), S::DateTime(b)) => Some(a.cmp(b)),
            (S::DateTimeOffset(a), S::DateTimeOffset(b)) => Some(a.cmp(b)),
            (S::Guid(a), S::Guid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// False for NaN and infinite floats, which have no JSON number form
    pub fn is_finite(&self) -> bool {
        match self {
            ScalarValue::Float(v) => v.is_finite(),
            ScalarValue::Double(v) => v.is_finite(),
            _ => true,
        }
    }
}

/// A property value as seen by a constraint: a scalar, a list or an object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ScalarValue),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(scalar: ScalarValue) -> Self {
        Value::Scalar(scalar)
    }
}

/// Rust types that map onto a [`ScalarKind`]
pub trait Scalar {
    const KIND: ScalarKind;

    fn into_scalar(self) -> ScalarValue;
}

macro_rules! impl_scalar {
    ($ty:ty, $kind:ident) => {
        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn into_scalar(self) -> ScalarValue {
                ScalarValue::$kind(self)
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Scalar(value.into_scalar())
            }
        }
    };
}

impl_scalar!(String, String);
impl_scalar!(i32, Int);
impl_scalar!(i64, Long);
impl_scalar!(f32, Float);
impl_scalar!(f64, Double);
impl_scalar!(Decimal, Decimal);
impl_scalar!(bool, Boolean);
impl_scalar!(NaiveDateTime, DateTime);
impl_scalar!(DateTime<FixedOffset>, DateTimeOffset);
impl_scalar!(Uuid, Guid);

impl Scalar for &str {
    const KIND: ScalarKind = ScalarKind::String;

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::String(self.to_string())
    }
}

/// A monetary amount, mapped onto the `money` data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(pub Decimal);

impl Scalar for Money {
    const KIND: ScalarKind = ScalarKind::Decimal;

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Decimal(self.0)
    }
}

impl From<Money> for Value {
    fn from(value: Money) -> Self {
        Value::Scalar(value.into_scalar())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(value.into_scalar())
    }
}
