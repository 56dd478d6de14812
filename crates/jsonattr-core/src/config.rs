use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::Result as RuleResult;
use crate::options::SchemaOptions;
use crate::schema::{SchemaDocument, SchemaSource, DEFAULT_MAX_SCHEMA_DEPTH};
use crate::validator::JsonValidator;

/// File form of a JSON attribute rule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct JsonValidatorConfig {
    /// Attributes governed by the rule.
    pub attributes: Vec<String>,
    pub schema: SchemaConfig,
    /// Error message key; `invalid_json` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Options passed through to the JSON Schema validator.
    #[serde(default)]
    pub options: SchemaOptions,
    /// Maximum schema method references followed before giving up.
    #[serde(default = "default_max_schema_depth")]
    pub max_schema_depth: usize,
    /// Record an error whenever the last assignment was not valid JSON.
    #[serde(default)]
    pub strict: bool,
}

fn default_max_schema_depth() -> usize {
    DEFAULT_MAX_SCHEMA_DEPTH
}

/// Schema source expressible in a file. Callbacks are builder-only.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchemaConfig {
    /// Inline schema definition.
    Literal(Value),
    /// Schema definition as JSON text.
    Text(String),
    /// JSON or YAML schema file; relative paths resolve against the config file.
    Path(PathBuf),
    /// Name of a schema method answered by the record.
    Method(String),
}

impl<R> From<SchemaConfig> for SchemaSource<R> {
    fn from(value: SchemaConfig) -> Self {
        match value {
            SchemaConfig::Literal(schema) => SchemaSource::Literal(SchemaDocument::Json(schema)),
            SchemaConfig::Text(text) => SchemaSource::Literal(SchemaDocument::Text(text)),
            SchemaConfig::Path(path) => SchemaSource::Literal(SchemaDocument::Path(path)),
            SchemaConfig::Method(name) => SchemaSource::Method(name),
        }
    }
}

impl JsonValidatorConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if self.attributes.is_empty() {
            return Err(ConfigError::Invalid("at least one attribute is required".into()));
        }
        let mut seen = HashSet::new();
        for name in &self.attributes {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "attribute names must not be blank".into(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "attribute `{name}` is listed more than once"
                )));
            }
        }
        if matches!(&self.message, Some(message) if message.trim().is_empty()) {
            return Err(ConfigError::Invalid("message key must not be blank".into()));
        }
        Ok(())
    }

    /// Build the rule described by this configuration.
    pub fn build<R>(self) -> RuleResult<JsonValidator<R>> {
        let mut builder = JsonValidator::builder()
            .attributes(self.attributes)
            .schema(self.schema)
            .options(self.options)
            .max_schema_depth(self.max_schema_depth)
            .strict(self.strict);
        if let Some(message) = self.message {
            builder = builder.message(message);
        }
        builder.build()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config as TOML: {0}")]
    Toml(#[source] toml::de::Error),
    #[error("failed to parse config as JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("config does not match schema: {}", .0.join(", "))]
    Schema(Vec<String>),
    #[error("invalid config: {0}")]
    Invalid(String),
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    validator_for(&config_schema_json()).expect("config schema to compile")
});

/// Returns the JSON schema describing the rule configuration file.
///
/// # Panics
///
/// Panics if schema generation fails; this indicates a programming error.
pub fn config_schema_json() -> Value {
    let schema = schemars::schema_for!(JsonValidatorConfig);
    serde_json::to_value(&schema).expect("schema json")
}

pub fn write_schema_file(path: &Path) -> std::io::Result<()> {
    let schema_json = config_schema_json();
    fs::write(path, serde_json::to_string_pretty(&schema_json)?)
}

/// Parse configuration text; `.json` paths are JSON, anything else TOML.
pub fn parse_config(content: &str, path: &Path) -> Result<JsonValidatorConfig, ConfigError> {
    let is_json = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("json")
    );
    let raw: Value = if is_json {
        serde_json::from_str(content).map_err(ConfigError::Json)?
    } else {
        let table: toml::Table = toml::from_str(content).map_err(ConfigError::Toml)?;
        serde_json::to_value(&table).map_err(ConfigError::Json)?
    };
    let validation_errors: Vec<String> = CONFIG_SCHEMA
        .iter_errors(&raw)
        .map(|e| format!("{}: {}", e.instance_path, e))
        .collect();
    if !validation_errors.is_empty() {
        return Err(ConfigError::Schema(validation_errors));
    }
    let config: JsonValidatorConfig = serde_json::from_value(raw).map_err(ConfigError::Json)?;
    config.check()?;
    Ok(config)
}

/// Load a rule configuration file, resolving a relative schema path against
/// the file's directory.
pub fn load_config(path: &Path) -> Result<JsonValidatorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse_config(&content, path)?;
    if let SchemaConfig::Path(schema_path) = &mut config.schema {
        if schema_path.is_relative() {
            if let Some(base) = path.parent() {
                *schema_path = base.join(&*schema_path);
            }
        }
    }
    tracing::debug!(
        target: "jsonattr::config",
        path = %path.display(),
        attributes = ?config.attributes,
        "loaded rule configuration"
    );
    Ok(config)
}
