use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use jsonattr_core::{
    InvalidJsonFlags, JsonRecordExt, JsonValidator, Record, RecordErrors, SchemaSource,
    ValidationState, Validations,
};
use serde_json::{json, Value};

/// Hand-written record with typed fields and a kind-dependent schema.
#[derive(Default)]
struct Device {
    kind: String,
    metadata: Value,
    readings: Value,
    flags: InvalidJsonFlags,
    errors: RecordErrors,
}

impl Device {
    fn sensor_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"unit": {"enum": ["c", "f"]}},
            "required": ["unit"]
        })
    }
}

impl Record for Device {
    fn read_json_attribute(&self, attribute: &str) -> Value {
        match attribute {
            "metadata" => self.metadata.clone(),
            "readings" => self.readings.clone(),
            _ => Value::Null,
        }
    }

    fn write_json_attribute(&mut self, attribute: &str, value: Value) {
        match attribute {
            "metadata" => self.metadata = value,
            "readings" => self.readings = value,
            _ => {}
        }
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
        match name {
            "metadata_schema" => Some(SchemaSource::callback(|device: &Device| {
                if device.kind == "sensor" {
                    SchemaSource::method("sensor_schema")
                } else {
                    SchemaSource::literal(json!({"type": "object"}))
                }
            })),
            "sensor_schema" => Some(SchemaSource::literal(self.sensor_schema())),
            _ => None,
        }
    }
}

fn metadata_rule() -> JsonValidator<Device> {
    JsonValidator::builder()
        .attribute("metadata")
        .schema_method("metadata_schema")
        .build()
        .expect("metadata rule")
}

#[test]
fn schema_follows_record_state() -> Result<()> {
    let rule = metadata_rule();
    let mut device = Device {
        kind: "gateway".into(),
        ..Device::default()
    };
    rule.assign(&mut device, "metadata", r#"{"unit": "k"}"#)?;
    let outcomes = rule.validate(&mut device)?;
    assert_eq!(outcomes[0].state, ValidationState::Clean);

    device.kind = "sensor".into();
    let outcomes = rule.validate(&mut device)?;
    assert_eq!(outcomes[0].state, ValidationState::SchemaViolation);
    assert_eq!(device.errors().len(), 1);
    let detail = device.errors().iter().next().and_then(|e| e.detail());
    assert!(detail.is_some_and(|d| d.starts_with("property '/unit'")));
    Ok(())
}

#[test]
fn valid_json_strings_are_decoded_and_pass() -> Result<()> {
    let rule: JsonValidator<Device> = JsonValidator::builder()
        .attribute("readings")
        .schema(json!({"type": "array", "items": {"type": "number"}}))
        .build()?;
    for text in ["[]", "[1]", "[1.5, -2, 3e2]", " [ 0 ] "] {
        let mut device = Device::default();
        rule.assign(&mut device, "readings", text)?;
        let expected: Value = serde_json::from_str(text)?;
        assert_eq!(device.readings, expected);
        rule.validate(&mut device)?;
        assert!(device.errors().is_empty(), "unexpected errors for {text}");
        assert_eq!(device.invalid_json("readings"), None);
    }
    Ok(())
}

#[test]
fn malformed_strings_fall_back_to_empty_object() -> Result<()> {
    let rule: JsonValidator<Device> = JsonValidator::builder()
        .attribute("readings")
        .schema(json!({"type": "array"}))
        .build()?;
    for text in ["[1,", "abc", "{'a': 1}", "[1 2]"] {
        let mut device = Device::default();
        rule.assign(&mut device, "readings", text)?;
        assert_eq!(device.invalid_json("readings"), Some(text));
        assert_eq!(device.readings, json!({}));

        let outcomes = rule.validate(&mut device)?;
        assert_eq!(outcomes[0].state, ValidationState::MalformedInput);
        assert!(!device.errors().is_empty(), "expected errors for {text}");
    }
    Ok(())
}

#[test]
fn structured_values_skip_decoding() -> Result<()> {
    let rule = metadata_rule();
    for value in [json!({"a": 1}), json!([1, 2]), json!(null), json!("{broken")] {
        let mut device = Device::default();
        rule.assign(&mut device, "metadata", value.clone())?;
        assert_eq!(device.metadata, value);
        assert_eq!(device.invalid_json("metadata"), None);
    }
    Ok(())
}

#[test]
fn callback_schema_is_evaluated_on_every_run() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let rule: JsonValidator<Device> = JsonValidator::builder()
        .attribute("metadata")
        .schema_callback(move |_device: &Device| {
            counter.fetch_add(1, Ordering::SeqCst);
            SchemaSource::literal(json!({"type": "object", "required": ["id"]}))
        })
        .build()?;

    let mut validations = Validations::new();
    validations.register(rule);

    let mut device = Device::default();
    validations.assign(&mut device, "metadata", "{}");
    assert!(!validations.run(&mut device)?);
    let first = device.errors().clone();
    assert!(!validations.run(&mut device)?);
    assert_eq!(device.errors(), &first);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn string_values_are_validated_as_json_text() -> Result<()> {
    let rule: JsonValidator<Device> = JsonValidator::builder()
        .attribute("readings")
        .schema(json!({"type": "integer"}))
        .build()?;
    let mut device = Device::default();

    // A decoded JSON string holding JSON text is checked as that text.
    rule.assign(&mut device, "readings", r#""42""#)?;
    assert_eq!(device.readings, json!("42"));
    rule.validate(&mut device)?;
    assert!(device.errors().is_empty());

    rule.assign(&mut device, "readings", r#""forty-two""#)?;
    rule.validate(&mut device)?;
    assert_eq!(device.errors().len(), 1);
    Ok(())
}
