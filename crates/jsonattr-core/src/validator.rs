//! The JSON attribute rule: setter installation plus schema validation.

use std::collections::{BTreeMap, HashSet};

use jsonschema::ValidationError;
use serde::Serialize;
use serde_json::Value;

use crate::error::{JsonValidatorError, Result};
use crate::options::SchemaOptions;
use crate::record::{JsonRecordExt, Record};
use crate::record_errors::MessageKey;
use crate::schema::{SchemaDocument, SchemaSource, DEFAULT_MAX_SCHEMA_DEPTH};
use crate::setter::{AttributeInput, JsonSetter};
use crate::value::{instance_from_text, validatable_value};

/// Detail recorded in strict mode when malformed input passes the schema.
pub const MALFORMED_INPUT_DETAIL: &str = "is not valid JSON";

/// How validation of one attribute ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    Clean,
    SchemaViolation,
    MalformedInput,
}

/// One schema-conformance failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Human-readable description, prefixed with the failing location.
    pub message: String,
    /// JSON pointer into the validated instance; empty for the root.
    pub instance_path: String,
}

impl Violation {
    fn from_error(error: &ValidationError<'_>) -> Self {
        let instance_path = error.instance_path.to_string();
        let message = if instance_path.is_empty() {
            format!("root: {error}")
        } else {
            format!("property '{instance_path}': {error}")
        };
        Self {
            message,
            instance_path,
        }
    }

    fn details(&self) -> BTreeMap<String, Value> {
        let mut details = BTreeMap::new();
        details.insert("error".to_string(), Value::String(self.message.clone()));
        details.insert(
            "instance_path".to_string(),
            Value::String(self.instance_path.clone()),
        );
        details
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeOutcome {
    pub attribute: String,
    pub state: ValidationState,
    pub violations: Vec<Violation>,
    /// Errors appended to the record for this attribute.
    pub recorded: usize,
}

/// JSON attribute rule bound to record type `R`.
///
/// Built once per record type. It owns one [`JsonSetter`] per governed
/// attribute and validates those attributes against a schema resolved from
/// the record on every run.
pub struct JsonValidator<R> {
    setters: Vec<JsonSetter>,
    attributes: Vec<String>,
    schema: SchemaSource<R>,
    message: MessageKey,
    options: SchemaOptions,
    max_schema_depth: usize,
    strict: bool,
}

impl<R> std::fmt::Debug for JsonValidator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonValidator")
            .field("attributes", &self.attributes)
            .field("schema", &self.schema)
            .field("message", &self.message)
            .field("options", &self.options)
            .field("max_schema_depth", &self.max_schema_depth)
            .field("strict", &self.strict)
            .finish()
    }
}

impl<R> JsonValidator<R> {
    pub fn builder() -> JsonValidatorBuilder<R> {
        JsonValidatorBuilder::default()
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn message(&self) -> &MessageKey {
        &self.message
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn governs(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|name| name == attribute)
    }

    pub fn setters(&self) -> &[JsonSetter] {
        &self.setters
    }

    /// Setter installed for `attribute`.
    pub fn setter(&self, attribute: &str) -> Result<&JsonSetter> {
        self.setters
            .iter()
            .find(|setter| setter.attribute() == attribute)
            .ok_or_else(|| JsonValidatorError::UnknownAttribute {
                attribute: attribute.to_string(),
            })
    }
}

impl<R: Record> JsonValidator<R> {
    /// Assign through the setter installed for `attribute`.
    pub fn assign(
        &self,
        record: &mut R,
        attribute: &str,
        input: impl Into<AttributeInput>,
    ) -> Result<()> {
        self.setter(attribute)?.assign(record, input);
        Ok(())
    }

    /// Resolve this rule's schema source against `record`.
    pub fn resolve_schema(&self, record: &R) -> Result<SchemaDocument> {
        self.schema.resolve(record, self.max_schema_depth)
    }

    /// Validate one governed attribute and record errors on `record`.
    pub fn validate_each(&self, record: &mut R, attribute: &str) -> Result<AttributeOutcome> {
        if !self.governs(attribute) {
            return Err(JsonValidatorError::UnknownAttribute {
                attribute: attribute.to_string(),
            });
        }

        let schema = self.resolve_schema(record)?;
        let validator = schema.compile(&self.options)?;

        let value = record.read_json_attribute(attribute);
        let text = validatable_value(&value)?;
        let instance = instance_from_text(&text);
        let violations: Vec<Violation> = validator
            .iter_errors(&instance)
            .map(|err| Violation::from_error(&err))
            .collect();

        // A blank raw input does not count as malformed.
        let malformed = record
            .invalid_json(attribute)
            .is_some_and(|raw| !raw.trim().is_empty());

        if violations.is_empty() && !malformed {
            tracing::trace!(
                target: "jsonattr::validator",
                attribute,
                "attribute is valid"
            );
            return Ok(AttributeOutcome {
                attribute: attribute.to_string(),
                state: ValidationState::Clean,
                violations,
                recorded: 0,
            });
        }

        let errors = record.errors_mut();
        for violation in &violations {
            errors.add(attribute, self.message.clone(), violation.details());
        }
        let mut recorded = violations.len();
        if malformed && violations.is_empty() && self.strict {
            let mut details = BTreeMap::new();
            details.insert(
                "error".to_string(),
                Value::String(MALFORMED_INPUT_DETAIL.to_string()),
            );
            errors.add(attribute, self.message.clone(), details);
            recorded = 1;
        }

        let state = if malformed {
            ValidationState::MalformedInput
        } else {
            ValidationState::SchemaViolation
        };
        tracing::debug!(
            target: "jsonattr::validator",
            attribute,
            state = ?state,
            violations = violations.len(),
            recorded,
            "attribute failed JSON validation"
        );
        Ok(AttributeOutcome {
            attribute: attribute.to_string(),
            state,
            violations,
            recorded,
        })
    }

    /// Validate every governed attribute in declaration order.
    pub fn validate(&self, record: &mut R) -> Result<Vec<AttributeOutcome>> {
        self.attributes
            .iter()
            .map(|attribute| self.validate_each(record, attribute))
            .collect()
    }
}

/// Builder for [`JsonValidator`]; `build` checks the configuration.
pub struct JsonValidatorBuilder<R> {
    attributes: Vec<String>,
    schema: Option<SchemaSource<R>>,
    message: Option<MessageKey>,
    options: SchemaOptions,
    max_schema_depth: usize,
    strict: bool,
}

impl<R> Default for JsonValidatorBuilder<R> {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            schema: None,
            message: None,
            options: SchemaOptions::default(),
            max_schema_depth: DEFAULT_MAX_SCHEMA_DEPTH,
            strict: false,
        }
    }
}

impl<R> JsonValidatorBuilder<R> {
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn schema(mut self, source: impl Into<SchemaSource<R>>) -> Self {
        self.schema = Some(source.into());
        self
    }

    pub fn schema_callback<F>(self, callback: F) -> Self
    where
        F: Fn(&R) -> SchemaSource<R> + Send + Sync + 'static,
    {
        self.schema(SchemaSource::callback(callback))
    }

    pub fn schema_method(self, name: impl Into<String>) -> Self {
        self.schema(SchemaSource::method(name))
    }

    pub fn message(mut self, key: impl Into<MessageKey>) -> Self {
        self.message = Some(key.into());
        self
    }

    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_schema_depth(mut self, depth: usize) -> Self {
        self.max_schema_depth = depth;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Result<JsonValidator<R>> {
        if self.attributes.is_empty() {
            return Err(JsonValidatorError::Config(
                "at least one attribute is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &self.attributes {
            if name.trim().is_empty() {
                return Err(JsonValidatorError::Config(
                    "attribute names must not be blank".into(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(JsonValidatorError::Config(format!(
                    "attribute `{name}` is listed more than once"
                )));
            }
        }
        let schema = self
            .schema
            .ok_or_else(|| JsonValidatorError::Config("a schema source is required".into()))?;
        let message = self.message.unwrap_or_default();
        if message.as_str().trim().is_empty() {
            return Err(JsonValidatorError::Config(
                "message key must not be blank".into(),
            ));
        }
        let setters = self.attributes.iter().map(JsonSetter::new).collect();
        Ok(JsonValidator {
            setters,
            attributes: self.attributes,
            schema,
            message,
            options: self.options,
            max_schema_depth: self.max_schema_depth,
            strict: self.strict,
        })
    }
}
