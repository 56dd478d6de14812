use std::collections::BTreeMap;

use serde_json::Value;

use crate::record_errors::RecordErrors;
use crate::schema::SchemaSource;

/// Host record contract consumed by [`JsonValidator`](crate::JsonValidator).
///
/// `write_json_attribute` is the record's original storage operation; the
/// JSON setter decodes input and then delegates to it.
pub trait Record {
    /// Current value of `attribute`; `Value::Null` when unset.
    fn read_json_attribute(&self, attribute: &str) -> Value;

    fn write_json_attribute(&mut self, attribute: &str, value: Value);

    fn invalid_json_flags(&self) -> &InvalidJsonFlags;

    fn invalid_json_flags_mut(&mut self) -> &mut InvalidJsonFlags;

    fn errors(&self) -> &RecordErrors;

    fn errors_mut(&mut self) -> &mut RecordErrors;

    /// Answer a named, zero-argument schema method.
    ///
    /// Returns `None` when the record has no method of that name.
    fn schema_method(&self, name: &str) -> Option<SchemaSource<Self>>
    where
        Self: Sized,
    {
        let _ = name;
        None
    }
}

/// Per-attribute raw input of the most recent assignment that failed to parse.
///
/// Only the JSON setter mutates the flags; validation reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidJsonFlags {
    raw: BTreeMap<String, String>,
}

impl InvalidJsonFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.raw.get(attribute).map(String::as_str)
    }

    pub fn is_set(&self, attribute: &str) -> bool {
        self.raw.contains_key(attribute)
    }

    pub(crate) fn clear(&mut self, attribute: &str) {
        self.raw.remove(attribute);
    }

    pub(crate) fn mark(&mut self, attribute: &str, raw: String) {
        self.raw.insert(attribute.to_string(), raw);
    }
}

/// Read accessor for the invalid JSON flag on any [`Record`].
pub trait JsonRecordExt: Record {
    /// Raw input of the last assignment to `attribute` if it was not valid JSON.
    fn invalid_json(&self, attribute: &str) -> Option<&str> {
        self.invalid_json_flags().get(attribute)
    }
}

impl<R: Record + ?Sized> JsonRecordExt for R {}
