//! XML-RPC Value Model
//!
//! The dynamic value tree produced by the decoder and accepted by the encoder.

use std::collections::BTreeMap;
use std::fmt;
use std::num::TryFromIntError;

use chrono::{DateTime, FixedOffset, Utc};
use serde::ser::{Serialize, Serializer};
use serde_bytes::{ByteBuf, Bytes};

use crate::protocol::encode::{DATETIME_FORMAT, DATETIME_NEWTYPE};

/// Ordered sequence of values (`<array>`, and the decoded `<params>` list).
pub type Array = Vec<Value>;

/// String-keyed structure (`<struct>`). Member order carries no meaning.
pub type Struct = BTreeMap<String, Value>;

/// A decoded or encodable XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<nil/>`
    Nil,
    /// `<boolean>`
    Boolean(bool),
    /// `<int>`, `<i1>`, `<i2>`, `<i4>`, `<i8>`
    Integer(i64),
    /// `<double>`
    Double(f64),
    /// `<string>`, or untyped character data inside `<value>`
    String(String),
    /// `<dateTime.iso8601>`; forms without an offset are read as UTC
    DateTime(DateTime<FixedOffset>),
    /// `<base64>`
    Binary(Vec<u8>),
    /// `<array><data>`
    Array(Array),
    /// `<struct>`
    Struct(Struct),
}

/// The kind of a [`Value`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Nil,
    Boolean,
    Integer,
    Double,
    String,
    DateTime,
    Binary,
    Array,
    Struct,
}

impl Kind {
    /// Returns the wire element name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Boolean => "boolean",
            Kind::Integer => "int",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::DateTime => "dateTime.iso8601",
            Kind::Binary => "base64",
            Kind::Array => "array",
            Kind::Struct => "struct",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Boolean(_) => Kind::Boolean,
            Value::Integer(_) => Kind::Integer,
            Value::Double(_) => Kind::Double,
            Value::String(_) => Kind::String,
            Value::DateTime(_) => Kind::DateTime,
            Value::Binary(_) => Kind::Binary,
            Value::Array(_) => Kind::Array,
            Value::Struct(_) => Kind::Struct,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a struct member by name. Returns `None` for non-struct values.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|s| s.get(key))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Double(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime(dt) => serializer
                .serialize_newtype_struct(DATETIME_NEWTYPE, &dt.format(DATETIME_FORMAT).to_string()),
            Value::Binary(b) => serializer.serialize_bytes(b),
            Value::Array(a) => serializer.collect_seq(a),
            Value::Struct(s) => serializer.collect_map(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Integer(i64::from(i))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! try_from_integer {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for Value {
                type Error = TryFromIntError;

                fn try_from(i: $t) -> Result<Self, Self::Error> {
                    i64::try_from(i).map(Value::Integer)
                }
            }
        )*
    };
}

// `<i8>` is the widest integer on the wire.
try_from_integer!(u64, usize, isize, i128, u128);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Double(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt.fixed_offset())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Binary(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Binary(bytes.to_vec())
    }
}

impl From<ByteBuf> for Value {
    fn from(bytes: ByteBuf) -> Self {
        Value::Binary(bytes.into_vec())
    }
}

impl From<&Bytes> for Value {
    fn from(bytes: &Bytes) -> Self {
        Value::Binary(bytes.to_vec())
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Value::Struct(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nil, Into::into)
    }
}
