use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single field of a return record as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(Decimal),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Flag(_) | FieldValue::Text(_) => None,
        }
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

pub type Record = BTreeMap<String, FieldValue>;

/// Records grouped by scope, e.g. `salary`, `house_property`, `summary`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    scopes: BTreeMap<String, Vec<Record>>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: impl Into<String>, record: Record) {
        self.scopes.entry(scope.into()).or_default().push(record);
    }

    pub fn with(mut self, scope: impl Into<String>, record: Record) -> Self {
        self.push(scope, record);
        self
    }

    pub fn records(&self, scope: &str) -> &[Record] {
        self.scopes.get(scope).map_or(&[], Vec::as_slice)
    }
}

/// Builds a record of numeric fields.
pub fn numeric_record<'a>(fields: impl IntoIterator<Item = (&'a str, Decimal)>) -> Record {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), FieldValue::Number(value)))
        .collect()
}
