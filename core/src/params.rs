//! Dynamically-typed request parameters.
//!
//! # Design
//! `ParamValue` is a closed set of variants. The query encoder knows how to
//! write strings, bytes, integers, and nested maps; floats, booleans, lists,
//! and null are carried so they still reach JSON bodies, but the query
//! encoder skips them.
//!
//! `ParamMap` is ordered by key so encoded output is stable between runs.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::ser::{Error as _, Serialize, Serializer};

/// Parameter structure supplied by the caller for a query string or body.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Bytes(Vec<u8>),
    Map(ParamMap),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    List(Vec<ParamValue>),
    Null,
}

impl ParamValue {
    /// Returns the nested map, if this value is one.
    pub fn into_map(self) -> Option<ParamMap> {
        match self {
            ParamValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Str(s) => serializer.serialize_str(s),
            ParamValue::Bytes(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            ParamValue::Map(map) => serializer.collect_map(map),
            ParamValue::Int(n) => serializer.serialize_i64(*n),
            ParamValue::Uint(n) => serializer.serialize_u64(*n),
            ParamValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            ParamValue::Float(f) => Err(S::Error::custom(format!("unsupported value: {f}"))),
            ParamValue::Bool(b) => serializer.serialize_bool(*b),
            ParamValue::List(items) => serializer.collect_seq(items),
            ParamValue::Null => serializer.serialize_unit(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        ParamValue::Bytes(value)
    }
}

impl From<&[u8]> for ParamValue {
    fn from(value: &[u8]) -> Self {
        ParamValue::Bytes(value.to_vec())
    }
}

impl From<ParamMap> for ParamValue {
    fn from(value: ParamMap) -> Self {
        ParamValue::Map(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(value: Vec<ParamValue>) -> Self {
        ParamValue::List(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(f64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                ParamValue::Int(value as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                ParamValue::Uint(value as u64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ParamValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    ParamValue::Uint(u)
                } else {
                    n.as_f64().map_or(ParamValue::Null, ParamValue::Float)
                }
            }
            Value::String(s) => ParamValue::Str(s),
            Value::Array(items) => ParamValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ParamValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Build a [`ParamMap`] from `key => value` pairs.
///
/// ```
/// use requests_core::{params, ParamValue};
///
/// let p = params! { "q" => "rust", "page" => 2, "filter" => params! { "lang" => "en" } };
/// assert_eq!(p["page"], ParamValue::Int(2));
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::ParamMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::ParamMap::new();
        $( map.insert(::std::string::String::from($key), $crate::ParamValue::from($value)); )+
        map
    }};
}
