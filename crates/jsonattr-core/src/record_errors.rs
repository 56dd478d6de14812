use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message key used when a rule does not configure its own.
pub const DEFAULT_MESSAGE_KEY: &str = "invalid_json";

/// Symbolic error key attached to every recorded error (`invalid_json` by default).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageKey {
    fn default() -> Self {
        Self(DEFAULT_MESSAGE_KEY.to_string())
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MessageKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One error recorded against an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordError {
    pub attribute: String,
    pub message: MessageKey,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl RecordError {
    /// Human-readable detail stored under the `error` context key, if any.
    pub fn detail(&self) -> Option<&str> {
        self.details.get("error").and_then(Value::as_str)
    }

    /// `"<attribute> <message>: <detail>"`, or without the detail when absent.
    pub fn full_message(&self) -> String {
        match self.detail() {
            Some(detail) => format!("{} {}: {}", self.attribute, self.message, detail),
            None => format!("{} {}", self.attribute, self.message),
        }
    }
}

/// Ordered error collection owned by a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordErrors {
    entries: Vec<RecordError>,
}

impl RecordErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error for `attribute` tagged with `message` and structured `details`.
    pub fn add(
        &mut self,
        attribute: impl Into<String>,
        message: MessageKey,
        details: BTreeMap<String, Value>,
    ) {
        self.entries.push(RecordError {
            attribute: attribute.into(),
            message,
            details,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordError> {
        self.entries.iter()
    }

    /// Errors recorded for a single attribute, in insertion order.
    pub fn on<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a RecordError> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.attribute == attribute)
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.entries.iter().map(RecordError::full_message).collect()
    }
}

impl<'a> IntoIterator for &'a RecordErrors {
    type Item = &'a RecordError;
    type IntoIter = std::slice::Iter<'a, RecordError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
