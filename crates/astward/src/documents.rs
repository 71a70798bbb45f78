//! Scan settings and policy documents supplied by the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Language;
use crate::error::{ErrorKind, JobError, Result};

/// The JSON scan settings document. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanSettingsDocument {
    pub project_name: String,
    pub programming_language: Language,
    #[serde(default)]
    pub use_incremental_scan: bool,
}

impl ScanSettingsDocument {
    /// Parse and validate settings text. Empty text, malformed JSON and an
    /// empty project name are validation failures.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(JobError::validation("JSON settings must not be empty"));
        }
        let document: ScanSettingsDocument = serde_json::from_str(text).map_err(|e| {
            JobError::with_source(ErrorKind::Validation, "JSON settings parse failed", e)
        })?;
        document.validate()?;
        Ok(document)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(JobError::validation(
                "Project name in JSON settings must not be empty",
            ));
        }
        Ok(())
    }
}

/// Validate policy text and return its compact serialization.
///
/// Empty or blank text means no policy and yields `None`. Anything that is
/// not a JSON array of rule objects is a validation failure.
pub fn parse_policy(text: Option<&str>) -> Result<Option<String>> {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(text).map_err(|e| {
        JobError::with_source(ErrorKind::Validation, "JSON policy parse failed", e)
    })?;
    let Value::Array(rules) = &value else {
        return Err(JobError::validation("JSON policy must be an array of rules"));
    };
    if let Some(index) = rules.iter().position(|rule| !rule.is_object()) {
        return Err(JobError::validation(format!(
            "JSON policy rule {} must be an object",
            index
        )));
    }
    Ok(Some(value.to_string()))
}
