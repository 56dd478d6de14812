use std::borrow::Cow;

use serde_json::Value;

use crate::error::{JsonValidatorError, Result};

/// Text form of an attribute value handed to the schema check.
///
/// Strings pass through untouched and are treated as JSON text; everything
/// else is encoded.
pub fn validatable_value(value: &Value) -> Result<Cow<'_, str>> {
    match value {
        Value::String(text) => Ok(Cow::Borrowed(text.as_str())),
        other => serde_json::to_string(other)
            .map(Cow::Owned)
            .map_err(JsonValidatorError::Encode),
    }
}

/// Instance validated against the schema for a given text form.
///
/// Text that does not decode is checked as a plain JSON string.
pub(crate) fn instance_from_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
