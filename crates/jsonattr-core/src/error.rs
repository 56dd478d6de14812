use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a rule, assigning through it, or running it.
///
/// Schema violations and malformed input are not errors at this level; they
/// are recorded on the record's [`RecordErrors`](crate::RecordErrors).
#[derive(Debug, Error)]
pub enum JsonValidatorError {
    #[error("invalid validator configuration: {0}")]
    Config(String),
    #[error("attribute `{attribute}` is not governed by this rule")]
    UnknownAttribute { attribute: String },
    #[error("record does not answer schema method `{name}`")]
    UnknownSchemaMethod { name: String },
    #[error("schema reference chain exceeded {limit} hops; check for a cyclic schema source")]
    SchemaRecursion { limit: usize },
    #[error("schema text is not valid JSON: {0}")]
    SchemaParse(#[source] serde_json::Error),
    #[error("schema file {} is not valid YAML: {source}", path.display())]
    SchemaYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to read schema file {}: {source}", path.display())]
    SchemaIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON Schema: {0}")]
    SchemaCompile(String),
    #[error("failed to encode attribute value as JSON: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type Result<T, E = JsonValidatorError> = std::result::Result<T, E>;
