use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;

/// Ordered property bag. BTreeMap keeps key order stable so encoding the
/// same bag twice yields identical bytes.
pub type Props = BTreeMap<String, PropValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Date(DateTime<Utc>),
    String(String),
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Bool(bool),
    List(Vec<PropValue>),
    Object(Props),
    Null,
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            PropValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            PropValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::String(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::String(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Number(Decimal::from(v))
    }
}

impl From<Decimal> for PropValue {
    fn from(v: Decimal) -> Self {
        PropValue::Number(v)
    }
}

/// Replaces nested object/list values with their JSON string rendering.
/// One level deep per value: the value itself becomes a string, nothing
/// inside it is visited.
pub fn stringify_nested(props: &mut Props) -> Result<()> {
    let nested: Vec<String> = props
        .iter()
        .filter(|(_, v)| matches!(v, PropValue::Object(_) | PropValue::List(_)))
        .map(|(k, _)| k.clone())
        .collect();
    for key in nested {
        if let Some(v) = props.get(&key) {
            let s = serde_json::to_string(v)?;
            props.insert(key, PropValue::String(s));
        }
    }
    Ok(())
}

/// Drops keys holding null values.
pub fn strip_nulls(props: &mut Props) {
    props.retain(|_, v| !v.is_null());
}

/// Lowercases a list of names for case-insensitive membership checks.
pub fn lowercase_all(list: &[String]) -> Vec<String> {
    list.iter().map(|v| v.to_lowercase()).collect()
}
