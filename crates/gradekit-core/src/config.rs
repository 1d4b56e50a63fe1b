//! Grader configuration

use gradekit_common::{GradeError, Result};
use gradekit_js::SandboxConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Grader configuration, read from JSON with every field optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraderConfig {
    /// Fail every HTML requirement when the document shape check fails
    pub enforce_document_shape: bool,

    /// Limits for running learner JavaScript
    pub sandbox: SandboxConfig,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            enforce_document_shape: true,
            sandbox: SandboxConfig::default(),
        }
    }
}

impl GraderConfig {
    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GradeError::config_with_source(format!("cannot read {}", path.display()), e)
        })?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.display(), ?config, "Loaded grader config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| GradeError::config_with_source("invalid grader config", e))
    }
}
