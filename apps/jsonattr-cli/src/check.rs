use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use jsonattr_core::{
    load_config, JsonDocument, JsonRecordExt, JsonValidator, Record, Validations,
};
use serde_json::{json, Value};

#[derive(Args)]
pub struct CheckArgs {
    /// Rule configuration file (TOML, or JSON with a .json extension)
    #[arg(long)]
    config: PathBuf,
    /// Assign ATTR=VALUE; VALUE is handed to the setter as raw text
    #[arg(long = "set", value_name = "ATTR=VALUE")]
    set: Vec<String>,
    /// Define a schema method NAME=SCHEMA_JSON answered by the record
    #[arg(long = "schema-method", value_name = "NAME=SCHEMA_JSON")]
    schema_methods: Vec<String>,
    /// Record an error whenever an assignment was not valid JSON
    #[arg(long)]
    strict: bool,
    /// Emit a JSON report instead of text
    #[arg(long)]
    json: bool,
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    raw.split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| anyhow!("--{flag} expects NAME=VALUE, got `{raw}`"))
}

/// Returns whether the record is valid.
pub fn cmd_check(args: &CheckArgs) -> Result<bool> {
    let mut config = load_config(&args.config)
        .with_context(|| format!("loading rule from {}", args.config.display()))?;
    if args.strict {
        config.strict = true;
    }
    let rule: JsonValidator<JsonDocument> = config.build().context("building rule")?;
    let attributes = rule.attributes().to_vec();
    let mut validations = Validations::new();
    validations.register(rule);

    let mut doc = JsonDocument::new();
    for raw in &args.schema_methods {
        let (name, schema) = split_pair(raw, "schema-method")?;
        let schema: Value = serde_json::from_str(schema)
            .with_context(|| format!("schema method `{name}` is not valid JSON"))?;
        doc.define_schema_method(name.trim(), schema);
    }
    for raw in &args.set {
        let (attribute, value) = split_pair(raw, "set")?;
        validations.assign(&mut doc, attribute.trim(), value);
    }

    let valid = validations.run(&mut doc).context("running validation")?;
    tracing::debug!(valid, errors = doc.errors().len(), "check finished");

    if args.json {
        let invalid_json: BTreeMap<&str, &str> = attributes
            .iter()
            .filter_map(|name| doc.invalid_json(name).map(|raw| (name.as_str(), raw)))
            .collect();
        let report = json!({
            "valid": valid,
            "attributes": doc.to_value(),
            "invalid_json": invalid_json,
            "errors": doc.errors(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if valid {
        println!("Errors: none");
    } else {
        for message in doc.errors().full_messages() {
            println!("{message}");
        }
    }
    Ok(valid)
}
