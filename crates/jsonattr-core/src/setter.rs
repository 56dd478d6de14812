use serde_json::{Map, Value};

use crate::record::Record;

/// Value handed to a JSON setter.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeInput {
    /// Raw text; decoded as JSON before storage.
    Text(String),
    /// Already structured; stored as is.
    Json(Value),
}

impl From<&str> for AttributeInput {
    fn from(value: &str) -> Self {
        AttributeInput::Text(value.to_string())
    }
}

impl From<String> for AttributeInput {
    fn from(value: String) -> Self {
        AttributeInput::Text(value)
    }
}

impl From<Value> for AttributeInput {
    fn from(value: Value) -> Self {
        AttributeInput::Json(value)
    }
}

impl<T: Into<AttributeInput>> From<Option<T>> for AttributeInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeInput::Json(Value::Null), Into::into)
    }
}

/// Setter for one governed attribute, wrapping the record's own storage.
///
/// Created by [`JsonValidator`](crate::JsonValidator) when the rule is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSetter {
    attribute: String,
}

impl JsonSetter {
    pub(crate) fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Assign `input`, decoding text as JSON first.
    ///
    /// The invalid JSON flag is cleared on every call. Text that fails to
    /// decode is remembered in the flag and an empty object is stored instead.
    pub fn assign<R: Record + ?Sized>(&self, record: &mut R, input: impl Into<AttributeInput>) {
        record.invalid_json_flags_mut().clear(&self.attribute);
        let value = match input.into() {
            AttributeInput::Json(value) => value,
            AttributeInput::Text(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::debug!(
                        target: "jsonattr::setter",
                        attribute = %self.attribute,
                        error = %err,
                        "assigned text is not valid JSON; storing empty object"
                    );
                    record.invalid_json_flags_mut().mark(&self.attribute, raw);
                    Value::Object(Map::new())
                }
            },
        };
        record.write_json_attribute(&self.attribute, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonDocument;
    use crate::record::JsonRecordExt;
    use serde_json::json;

    #[test]
    fn valid_text_is_decoded_before_storage() {
        let mut doc = JsonDocument::new();
        let setter = JsonSetter::new("payload");
        setter.assign(&mut doc, r#"{"city": "Oslo", "tags": [1, 2]}"#);
        assert_eq!(doc.get("payload"), json!({"city": "Oslo", "tags": [1, 2]}));
        assert_eq!(doc.invalid_json("payload"), None);
    }

    #[test]
    fn malformed_text_sets_flag_and_stores_empty_object() {
        let mut doc = JsonDocument::new();
        let setter = JsonSetter::new("payload");
        setter.assign(&mut doc, "{not json");
        assert_eq!(doc.get("payload"), json!({}));
        assert_eq!(doc.invalid_json("payload"), Some("{not json"));
        assert!(doc.invalid_json_flags().is_set("payload"));
        assert!(!doc.invalid_json_flags().is_set("other"));
    }

    #[test]
    fn next_assignment_clears_the_flag() {
        let mut doc = JsonDocument::new();
        let setter = JsonSetter::new("payload");
        setter.assign(&mut doc, "abc");
        assert!(doc.invalid_json("payload").is_some());

        setter.assign(&mut doc, json!([1, 2, 3]));
        assert!(!doc.invalid_json_flags().is_set("payload"));
        assert_eq!(doc.invalid_json("payload"), None);
        assert_eq!(doc.get("payload"), json!([1, 2, 3]));

        setter.assign(&mut doc, "abc");
        setter.assign(&mut doc, "7");
        assert_eq!(doc.invalid_json("payload"), None);
        assert_eq!(doc.get("payload"), json!(7));
    }

    #[test]
    fn structured_values_are_stored_unchanged() {
        let mut doc = JsonDocument::new();
        let setter = JsonSetter::new("payload");
        setter.assign(&mut doc, json!("not decoded"));
        assert_eq!(doc.get("payload"), json!("not decoded"));
        assert_eq!(doc.invalid_json("payload"), None);

        setter.assign(&mut doc, None::<String>);
        assert_eq!(doc.get("payload"), Value::Null);
    }

    #[test]
    fn empty_text_is_malformed() {
        let mut doc = JsonDocument::new();
        JsonSetter::new("payload").assign(&mut doc, "");
        assert_eq!(doc.invalid_json("payload"), Some(""));
        assert_eq!(doc.get("payload"), json!({}));
    }
}
