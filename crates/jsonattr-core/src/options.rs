use jsonschema::{Draft, ValidationOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// JSON Schema drafts selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchemaDraft {
    Draft4,
    Draft6,
    Draft7,
    #[serde(rename = "draft2019_09")]
    Draft201909,
    #[serde(rename = "draft2020_12")]
    Draft202012,
}

impl From<SchemaDraft> for Draft {
    fn from(value: SchemaDraft) -> Self {
        match value {
            SchemaDraft::Draft4 => Draft::Draft4,
            SchemaDraft::Draft6 => Draft::Draft6,
            SchemaDraft::Draft7 => Draft::Draft7,
            SchemaDraft::Draft201909 => Draft::Draft201909,
            SchemaDraft::Draft202012 => Draft::Draft202012,
        }
    }
}

/// Options passed through to the `jsonschema` builder.
///
/// Unset fields keep the library defaults (draft autodetection, format
/// validation as the draft prescribes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SchemaOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<SchemaDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_formats: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_unknown_formats: Option<bool>,
}

impl SchemaOptions {
    pub(crate) fn builder(&self) -> ValidationOptions {
        let mut options = jsonschema::options();
        if let Some(draft) = self.draft {
            options = options.with_draft(draft.into());
        }
        if let Some(validate) = self.validate_formats {
            options = options.should_validate_formats(validate);
        }
        if let Some(ignore) = self.ignore_unknown_formats {
            options = options.should_ignore_unknown_formats(ignore);
        }
        options
    }
}
