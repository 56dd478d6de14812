use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::record::{InvalidJsonFlags, Record};
use crate::record_errors::RecordErrors;
use crate::schema::SchemaSource;

/// Map-backed record with named schema methods.
#[derive(Debug, Clone, Default)]
pub struct JsonDocument {
    attributes: BTreeMap<String, Value>,
    schema_methods: BTreeMap<String, SchemaSource<JsonDocument>>,
    flags: InvalidJsonFlags,
    errors: RecordErrors,
}

impl JsonDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `attribute`, `Value::Null` when unset.
    pub fn get(&self, attribute: &str) -> Value {
        self.attributes.get(attribute).cloned().unwrap_or(Value::Null)
    }

    /// Store `value` directly, bypassing any JSON setter.
    pub fn set(&mut self, attribute: impl Into<String>, value: Value) {
        self.attributes.insert(attribute.into(), value);
    }

    /// Answer `name` as a schema method returning `source`.
    pub fn define_schema_method(
        &mut self,
        name: impl Into<String>,
        source: impl Into<SchemaSource<JsonDocument>>,
    ) {
        self.schema_methods.insert(name.into(), source.into());
    }

    /// Attributes as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl Record for JsonDocument {
    fn read_json_attribute(&self, attribute: &str) -> Value {
        self.get(attribute)
    }

    fn write_json_attribute(&mut self, attribute: &str, value: Value) {
        self.set(attribute, value);
    }

    fn invalid_json_flags(&self) -> &InvalidJsonFlags {
        &self.flags
    }

    fn invalid_json_flags_mut(&mut self) -> &mut InvalidJsonFlags {
        &mut self.flags
    }

    fn errors(&self) -> &RecordErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut RecordErrors {
        &mut self.errors
    }

    fn schema_method(&self, name: &str) -> Option<SchemaSource<Self>> {
        self.schema_methods.get(name).cloned()
    }
}
