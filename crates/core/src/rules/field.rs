use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A value read from a record by field name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    List(Vec<String>),
    Flag(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    List,
    Flag,
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Number(_) => FieldKind::Number,
            Self::List(_) => FieldKind::List,
            Self::Flag(_) => FieldKind::Flag,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::List => "list",
            Self::Flag => "flag",
        };
        f.write_str(label)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Named-field lookup the evaluator runs against. Implementations decide how a
/// field name maps onto their record; the evaluator only sees values.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl<S: FieldSource + ?Sized> FieldSource for &S {
    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }
}

impl FieldSource for BTreeMap<String, FieldValue> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name)
            .or_else(|| {
                self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value)
            })
            .cloned()
    }
}

impl FieldSource for HashMap<String, FieldValue> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name)
            .or_else(|| {
                self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value)
            })
            .cloned()
    }
}

pub(crate) fn normalize_field_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
