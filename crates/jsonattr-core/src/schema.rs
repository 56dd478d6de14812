//! Schema sources and their resolution into compiled validators.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::{JsonValidatorError, Result};
use crate::options::SchemaOptions;
use crate::record::Record;

/// Reference hops allowed when resolving a schema source.
pub const DEFAULT_MAX_SCHEMA_DEPTH: usize = 32;

pub type SchemaCallback<R> = Arc<dyn Fn(&R) -> SchemaSource<R> + Send + Sync>;

/// Terminal schema value.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDocument {
    /// Schema definition object.
    Json(Value),
    /// JSON text of a schema definition.
    Text(String),
    /// JSON or YAML schema file, read on every validation run.
    Path(PathBuf),
}

impl SchemaDocument {
    /// Materialize the schema definition as a JSON value.
    pub fn load(&self) -> Result<Cow<'_, Value>> {
        match self {
            SchemaDocument::Json(value) => Ok(Cow::Borrowed(value)),
            SchemaDocument::Text(text) => serde_json::from_str(text)
                .map(Cow::Owned)
                .map_err(JsonValidatorError::SchemaParse),
            SchemaDocument::Path(path) => load_schema_file(path).map(Cow::Owned),
        }
    }

    /// Build a validator for this schema with the given pass-through options.
    pub fn compile(&self, options: &SchemaOptions) -> Result<Validator> {
        let schema = self.load()?;
        options
            .builder()
            .build(&schema)
            .map_err(|err| JsonValidatorError::SchemaCompile(err.to_string()))
    }
}

impl From<Value> for SchemaDocument {
    fn from(value: Value) -> Self {
        SchemaDocument::Json(value)
    }
}

impl From<&str> for SchemaDocument {
    fn from(value: &str) -> Self {
        SchemaDocument::Text(value.to_string())
    }
}

impl From<String> for SchemaDocument {
    fn from(value: String) -> Self {
        SchemaDocument::Text(value)
    }
}

impl From<PathBuf> for SchemaDocument {
    fn from(value: PathBuf) -> Self {
        SchemaDocument::Path(value)
    }
}

fn load_schema_file(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).map_err(|source| JsonValidatorError::SchemaIo {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&raw).map_err(|source| JsonValidatorError::SchemaYaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&raw).map_err(JsonValidatorError::SchemaParse)
    }
}

/// Where a rule gets its schema from: a literal, a callback evaluated against
/// the record, or the name of a schema method on the record.
pub enum SchemaSource<R> {
    Literal(SchemaDocument),
    Callback(SchemaCallback<R>),
    Method(String),
}

impl<R> SchemaSource<R> {
    pub fn literal(document: impl Into<SchemaDocument>) -> Self {
        SchemaSource::Literal(document.into())
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&R) -> SchemaSource<R> + Send + Sync + 'static,
    {
        SchemaSource::Callback(Arc::new(callback))
    }

    pub fn method(name: impl Into<String>) -> Self {
        SchemaSource::Method(name.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            SchemaSource::Literal(_) => "literal",
            SchemaSource::Callback(_) => "callback",
            SchemaSource::Method(_) => "method",
        }
    }
}

impl<R: Record> SchemaSource<R> {
    /// Follow callbacks and method references until a literal is reached.
    ///
    /// Sources are re-evaluated on every call so a schema may depend on other
    /// record state. At most `max_depth` references are followed.
    pub fn resolve(&self, record: &R, max_depth: usize) -> Result<SchemaDocument> {
        let mut current = self.clone();
        let mut hops = 0;
        loop {
            current = match current {
                SchemaSource::Literal(document) => return Ok(document),
                _ if hops == max_depth => {
                    return Err(JsonValidatorError::SchemaRecursion { limit: max_depth });
                }
                SchemaSource::Callback(callback) => (*callback)(record),
                SchemaSource::Method(name) => record
                    .schema_method(&name)
                    .ok_or(JsonValidatorError::UnknownSchemaMethod { name })?,
            };
            hops += 1;
            tracing::trace!(
                target: "jsonattr::schema",
                hop = hops,
                next = current.kind(),
                "followed schema reference"
            );
        }
    }
}

impl<R> Clone for SchemaSource<R> {
    fn clone(&self) -> Self {
        match self {
            SchemaSource::Literal(document) => SchemaSource::Literal(document.clone()),
            SchemaSource::Callback(callback) => SchemaSource::Callback(Arc::clone(callback)),
            SchemaSource::Method(name) => SchemaSource::Method(name.clone()),
        }
    }
}

impl<R> fmt::Debug for SchemaSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Literal(document) => f.debug_tuple("Literal").field(document).finish(),
            SchemaSource::Callback(_) => f.write_str("Callback(..)"),
            SchemaSource::Method(name) => f.debug_tuple("Method").field(name).finish(),
        }
    }
}

impl<R> From<SchemaDocument> for SchemaSource<R> {
    fn from(value: SchemaDocument) -> Self {
        SchemaSource::Literal(value)
    }
}

impl<R> From<Value> for SchemaSource<R> {
    fn from(value: Value) -> Self {
        SchemaSource::Literal(SchemaDocument::Json(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonDocument;
    use serde_json::json;
    use std::io::Write;

    type Source = SchemaSource<JsonDocument>;

    #[test]
    fn literal_is_returned_unchanged() {
        let doc = JsonDocument::new();
        let source: Source = SchemaSource::literal(json!({"type": "integer"}));
        let resolved = source.resolve(&doc, DEFAULT_MAX_SCHEMA_DEPTH).unwrap();
        assert_eq!(resolved, SchemaDocument::Json(json!({"type": "integer"})));
    }

    #[test]
    fn callback_sees_record_and_result_is_resolved_again() {
        let mut doc = JsonDocument::new();
        doc.set("kind", json!("numbers"));
        doc.define_schema_method("numbers_schema", json!({"type": "array"}));

        let source = SchemaSource::callback(|record: &JsonDocument| {
            let kind = record.get("kind").as_str().unwrap_or_default().to_string();
            SchemaSource::method(format!("{kind}_schema"))
        });
        let resolved = source.resolve(&doc, DEFAULT_MAX_SCHEMA_DEPTH).unwrap();
        assert_eq!(resolved, SchemaDocument::Json(json!({"type": "array"})));
    }

    #[test]
    fn unknown_method_is_an_error() {
        let doc = JsonDocument::new();
        let source: Source = SchemaSource::method("missing");
        let err = source.resolve(&doc, DEFAULT_MAX_SCHEMA_DEPTH).unwrap_err();
        assert!(matches!(err, JsonValidatorError::UnknownSchemaMethod { name } if name == "missing"));
    }

    #[test]
    fn cyclic_methods_hit_the_hop_limit() {
        let mut doc = JsonDocument::new();
        doc.define_schema_method("a", Source::method("b"));
        doc.define_schema_method("b", Source::method("a"));
        let source: Source = SchemaSource::method("a");
        let err = source.resolve(&doc, 8).unwrap_err();
        assert!(matches!(err, JsonValidatorError::SchemaRecursion { limit: 8 }));
    }

    #[test]
    fn chain_of_exactly_max_depth_hops_resolves() {
        let mut doc = JsonDocument::new();
        doc.define_schema_method("first", Source::method("second"));
        doc.define_schema_method("second", json!({"type": "object"}));
        let source: Source = SchemaSource::method("first");
        assert!(source.resolve(&doc, 2).is_ok());
        assert!(matches!(
            source.resolve(&doc, 1),
            Err(JsonValidatorError::SchemaRecursion { limit: 1 })
        ));
    }

    #[test]
    fn text_and_yaml_documents_load() {
        let text = SchemaDocument::from(r#"{"type": "string"}"#);
        assert_eq!(text.load().unwrap().into_owned(), json!({"type": "string"}));

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "type: object\nrequired: [name]").unwrap();
        let doc = SchemaDocument::Path(file.path().to_path_buf());
        assert_eq!(
            doc.load().unwrap().into_owned(),
            json!({"type": "object", "required": ["name"]})
        );
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        let doc = SchemaDocument::Json(json!({"type": "not_a_valid_type"}));
        let err = doc.compile(&SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, JsonValidatorError::SchemaCompile(_)));

        let doc = SchemaDocument::from("not json");
        assert!(matches!(
            doc.compile(&SchemaOptions::default()),
            Err(JsonValidatorError::SchemaParse(_))
        ));
    }
}
