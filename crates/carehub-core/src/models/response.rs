use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::ids::ItemId;

/// A single response value. The concrete shape is dictated by the owning
/// item's response type: boolean for YES_NO, number for SCALE/NUMBER,
/// string for TEXT/DATE/SINGLE_CHOICE, string list for MULTIPLE_CHOICE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum ResponseValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl ResponseValue {
    /// Null, the empty string, and the empty list are all "no answer".
    pub fn is_empty(&self) -> bool {
        match self {
            ResponseValue::Null => true,
            ResponseValue::Text(s) => s.is_empty(),
            ResponseValue::List(values) => values.is_empty(),
            ResponseValue::Bool(_) | ResponseValue::Number(_) => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ResponseValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResponseValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ResponseValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Short name of the value's shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            ResponseValue::Null => "null",
            ResponseValue::Bool(_) => "boolean",
            ResponseValue::Number(_) => "number",
            ResponseValue::Text(_) => "string",
            ResponseValue::List(_) => "list",
        }
    }
}

impl fmt::Display for ResponseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseValue::Null => f.write_str("null"),
            ResponseValue::Bool(b) => write!(f, "{b}"),
            ResponseValue::Number(n) => write!(f, "{n}"),
            ResponseValue::Text(s) => write!(f, "\"{s}\""),
            ResponseValue::List(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<bool> for ResponseValue {
    fn from(b: bool) -> Self {
        ResponseValue::Bool(b)
    }
}

impl From<f64> for ResponseValue {
    fn from(n: f64) -> Self {
        ResponseValue::Number(n)
    }
}

impl From<&str> for ResponseValue {
    fn from(s: &str) -> Self {
        ResponseValue::Text(s.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(s: String) -> Self {
        ResponseValue::Text(s)
    }
}

impl From<Vec<String>> for ResponseValue {
    fn from(values: Vec<String>) -> Self {
        ResponseValue::List(values)
    }
}

impl From<Vec<&str>> for ResponseValue {
    fn from(values: Vec<&str>) -> Self {
        ResponseValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// The emptiness predicate shared by required-value validation and
/// progress counting. A missing entry is blank.
pub fn is_blank(value: Option<&ResponseValue>) -> bool {
    value.is_none_or(ResponseValue::is_empty)
}

/// Responses for one form instance, keyed by item identity.
///
/// Only meaningful against the template version it was filled against.
/// Entries for item identities absent from that template are orphans: kept
/// as-is, never reinterpreted against another item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseSet(BTreeMap<ItemId, ResponseValue>);

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item: ItemId) -> Option<&ResponseValue> {
        self.0.get(&item)
    }

    /// Insert or replace the value for an item, returning the previous one.
    pub fn set(&mut self, item: ItemId, value: impl Into<ResponseValue>) -> Option<ResponseValue> {
        self.0.insert(item, value.into())
    }

    pub fn remove(&mut self, item: ItemId) -> Option<ResponseValue> {
        self.0.remove(&item)
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.0.contains_key(&item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &ResponseValue)> {
        self.0.iter().map(|(id, value)| (*id, value))
    }

    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ItemId, ResponseValue)> for ResponseSet {
    fn from_iter<T: IntoIterator<Item = (ItemId, ResponseValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
