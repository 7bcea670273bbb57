//! Typed field values and conversions to and from model property types.

use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use std::fmt;

/// A decoded, typed field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Local>),
    /// Generic JSON document.
    Json(serde_json::Value),
    /// JSON object decoded as an insertion-ordered map.
    Assoc(IndexMap<String, serde_json::Value>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// JSON form of the value; dates use the storage format.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(i) => serde_json::Value::from(*i),
            FieldValue::Float(v) => serde_json::Value::from(*v),
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::DateTime(_) => serde_json::Value::String(self.to_string()),
            FieldValue::Json(json) => json.clone(),
            FieldValue::Assoc(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::DateTime(_) => "date-time",
            FieldValue::Json(_) => "json",
            FieldValue::Assoc(_) => "json-assoc",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Json(json) => write!(f, "{json}"),
            FieldValue::Assoc(map) => match serde_json::to_string(map) {
                Ok(text) => f.write_str(&text),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

/// Conversion of a model property into a [`FieldValue`].
pub trait IntoFieldValue {
    fn into_field_value(self) -> FieldValue;
}

/// Conversion of a [`FieldValue`] into a model property type.
///
/// A value of the wrong shape is a data error.
pub trait FromFieldValue: Sized {
    fn from_field_value(value: FieldValue) -> OrmResult<Self>;
}

fn mismatch<T>(value: &FieldValue, expected: &str) -> OrmResult<T> {
    Err(OrmError::data(format!(
        "Value of type {} can not be assigned to a {expected} property.",
        value.kind()
    )))
}

impl IntoFieldValue for FieldValue {
    fn into_field_value(self) -> FieldValue {
        self
    }
}

impl FromFieldValue for FieldValue {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        Ok(value)
    }
}

impl IntoFieldValue for bool {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Bool(self)
    }
}

impl FromFieldValue for bool {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::Bool(b) => Ok(b),
            FieldValue::Int(i) => Ok(i != 0),
            other => mismatch(&other, "bool"),
        }
    }
}

impl IntoFieldValue for i64 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Int(self)
    }
}

impl FromFieldValue for i64 {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::Int(i) => Ok(i),
            FieldValue::DateTime(dt) => Ok(dt.timestamp()),
            other => mismatch(&other, "i64"),
        }
    }
}

impl IntoFieldValue for i32 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Int(i64::from(self))
    }
}

impl FromFieldValue for i32 {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::Int(i) => i32::try_from(i)
                .map_err(|_| OrmError::data(format!("Value {i} does not fit an i32 property."))),
            other => mismatch(&other, "i32"),
        }
    }
}

impl IntoFieldValue for f64 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Float(self)
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::Float(v) => Ok(v),
            FieldValue::Int(i) => Ok(i as f64),
            other => mismatch(&other, "f64"),
        }
    }
}

impl IntoFieldValue for String {
    fn into_field_value(self) -> FieldValue {
        FieldValue::String(self)
    }
}

impl IntoFieldValue for &str {
    fn into_field_value(self) -> FieldValue {
        FieldValue::String(self.to_string())
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::String(s) => Ok(s),
            other => mismatch(&other, "String"),
        }
    }
}

impl IntoFieldValue for DateTime<Local> {
    fn into_field_value(self) -> FieldValue {
        FieldValue::DateTime(self)
    }
}

impl FromFieldValue for DateTime<Local> {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::DateTime(dt) => Ok(dt),
            other => mismatch(&other, "DateTime"),
        }
    }
}

impl IntoFieldValue for serde_json::Value {
    fn into_field_value(self) -> FieldValue {
        match self {
            serde_json::Value::Null => FieldValue::Null,
            json => FieldValue::Json(json),
        }
    }
}

impl FromFieldValue for serde_json::Value {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::Null => Ok(serde_json::Value::Null),
            FieldValue::Json(json) => Ok(json),
            FieldValue::Assoc(map) => Ok(serde_json::Value::Object(map.into_iter().collect())),
            other => mismatch(&other, "JSON"),
        }
    }
}

impl IntoFieldValue for IndexMap<String, serde_json::Value> {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Assoc(self)
    }
}

impl FromFieldValue for IndexMap<String, serde_json::Value> {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::Assoc(map) => Ok(map),
            FieldValue::Json(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
            other => mismatch(&other, "JSON object"),
        }
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Option<T> {
    fn into_field_value(self) -> FieldValue {
        self.map_or(FieldValue::Null, IntoFieldValue::into_field_value)
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field_value(value: FieldValue) -> OrmResult<Self> {
        match value {
            FieldValue::Null => Ok(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}
