//! Key/value pairs attached to a log call

use serde::Serialize;

/// Dynamically typed value carried by an [`Extra`]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Str(String),
    /// Any signed integer width
    Int(i128),
    /// Any unsigned integer width
    Uint(u128),
    Bytes(Vec<u8>),
    /// Anything else, already reduced to its structural form
    Other(serde_json::Value),
}

impl Value {
    /// Capture an arbitrary serializable value.
    ///
    /// A value that refuses to serialize is kept as a string describing the
    /// failure, so building a `Value` never fails.
    pub fn reflect<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Value::Other(v),
            Err(e) => Value::Other(serde_json::Value::String(format!("reflect error: {}", e))),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Other(v)
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $wide)
                }
            }
        )*
    };
}

impl_from_int!(Int, i128: i8, i16, i32, i64, i128, isize);
impl_from_int!(Uint, u128: u8, u16, u32, u64, u128, usize);

/// A named value attached to a single log call.
///
/// Extras are consumed by the call they are passed to and never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Extra {
    pub key: String,
    pub value: Value,
}

impl Extra {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Attach any serializable value through its structural form
    pub fn reflect<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        Self {
            key: key.into(),
            value: Value::reflect(value),
        }
    }
}
