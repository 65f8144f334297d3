//! Translation of extras into encoder fields
//!
//! Every [`Value`] maps to exactly one field kind. Integers of any width are
//! rendered as decimal strings so the record carries a single integer shape.

use super::extra::{Extra, Value};

/// Encoder-native representation of one extra
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Bool(bool),
    String(String),
    Binary(Vec<u8>),
    Reflect(serde_json::Value),
}

/// A translated extra, ready for encoding
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub kind: FieldKind,
}

/// Translate a single extra
pub fn translate(extra: &Extra) -> Field {
    let kind = match &extra.value {
        Value::Bool(b) => FieldKind::Bool(*b),
        Value::Str(s) => FieldKind::String(s.clone()),
        Value::Int(i) => FieldKind::String(i.to_string()),
        Value::Uint(u) => FieldKind::String(u.to_string()),
        Value::Bytes(b) => FieldKind::Binary(b.clone()),
        Value::Other(v) => FieldKind::Reflect(v.clone()),
    };
    Field {
        key: extra.key.clone(),
        kind,
    }
}

/// Translate a slice of extras, preserving order
pub fn translate_all(extras: &[Extra]) -> Vec<Field> {
    extras.iter().map(translate).collect()
}
