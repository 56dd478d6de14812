//! JSON attribute validation for record types.
//!
//! A [`JsonValidator`] governs one or more attributes of a record type. It
//! installs a [`JsonSetter`] per attribute that decodes assigned text as JSON
//! (remembering input that fails to decode) and, at validation time, checks
//! the stored value against a JSON Schema resolved from a literal, a callback
//! or a schema method on the record. Violations are appended to the record's
//! [`RecordErrors`].

mod config;
mod document;
mod error;
mod options;
mod record;
mod record_errors;
mod rules;
mod schema;
mod setter;
mod validator;
mod value;

pub use config::{
    config_schema_json, load_config, parse_config, write_schema_file, ConfigError,
    JsonValidatorConfig, SchemaConfig,
};
pub use document::JsonDocument;
pub use error::{JsonValidatorError, Result};
pub use options::{SchemaDraft, SchemaOptions};
pub use record::{InvalidJsonFlags, JsonRecordExt, Record};
pub use record_errors::{MessageKey, RecordError, RecordErrors, DEFAULT_MESSAGE_KEY};
pub use rules::{ValidationRule, Validations};
pub use schema::{SchemaCallback, SchemaDocument, SchemaSource, DEFAULT_MAX_SCHEMA_DEPTH};
pub use setter::{AttributeInput, JsonSetter};
pub use validator::{
    AttributeOutcome, JsonValidator, JsonValidatorBuilder, ValidationState, Violation,
    MALFORMED_INPUT_DETAIL,
};
pub use value::validatable_value;
