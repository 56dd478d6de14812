use serde_json::Value;

use crate::error::Result;
use crate::record::Record;
use crate::setter::{AttributeInput, JsonSetter};
use crate::validator::JsonValidator;

/// A validation rule attached to record type `R` for a set of attributes.
pub trait ValidationRule<R> {
    fn attributes(&self) -> &[String];

    /// Run the rule, appending any errors to the record.
    fn validate(&self, record: &mut R) -> Result<()>;

    /// Setter the rule installs for `attribute`, if it intercepts assignment.
    fn setter(&self, attribute: &str) -> Option<&JsonSetter> {
        let _ = attribute;
        None
    }
}

impl<R: Record> ValidationRule<R> for JsonValidator<R> {
    fn attributes(&self) -> &[String] {
        JsonValidator::attributes(self)
    }

    fn validate(&self, record: &mut R) -> Result<()> {
        JsonValidator::validate(self, record).map(|_| ())
    }

    fn setter(&self, attribute: &str) -> Option<&JsonSetter> {
        JsonValidator::setter(self, attribute).ok()
    }
}

/// Ordered set of rules registered for a record type.
pub struct Validations<R> {
    rules: Vec<Box<dyn ValidationRule<R>>>,
}

impl<R> Default for Validations<R> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<R: Record> Validations<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V>(&mut self, rule: V) -> &mut Self
    where
        V: ValidationRule<R> + 'static,
    {
        tracing::debug!(
            target: "jsonattr::rules",
            attributes = ?rule.attributes(),
            "registered validation rule"
        );
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First setter installed for `attribute` by any registered rule.
    pub fn setter(&self, attribute: &str) -> Option<&JsonSetter> {
        self.rules.iter().find_map(|rule| rule.setter(attribute))
    }

    /// Assign through the installed setter, or store as is when no rule
    /// intercepts the attribute.
    pub fn assign(&self, record: &mut R, attribute: &str, input: impl Into<AttributeInput>) {
        match self.setter(attribute) {
            Some(setter) => setter.assign(record, input),
            None => {
                let value = match input.into() {
                    AttributeInput::Text(text) => Value::String(text),
                    AttributeInput::Json(value) => value,
                };
                record.write_json_attribute(attribute, value);
            }
        }
    }

    /// Clear the record's errors, run every rule, and report validity.
    pub fn run(&self, record: &mut R) -> Result<bool> {
        record.errors_mut().clear();
        for rule in &self.rules {
            rule.validate(record)?;
        }
        let valid = record.errors().is_empty();
        tracing::debug!(
            target: "jsonattr::rules",
            valid,
            errors = record.errors().len(),
            "validation run finished"
        );
        Ok(valid)
    }
}
