//! Question payloads: which requirements apply to which exercise file.

use gradekit_common::{GradeError, Result};
use gradekit_css::CssRequirement;
use gradekit_html::StructureRequirement;
use gradekit_js::JsElement;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One exercise: requirements keyed by file name, graded in that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub files: IndexMap<String, FileRequirements>,
}

/// Requirements for a single file. Only the list matching the file's
/// extension is consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequirements {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structure: Vec<StructureRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<CssRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<JsElement>,
}

impl FileRequirements {
    /// Number of requirements that apply to a file of `kind`.
    pub fn count_for(&self, kind: FileKind) -> usize {
        match kind {
            FileKind::Html => self.structure.len(),
            FileKind::Css => self.css.len(),
            FileKind::JavaScript => self.elements.len(),
        }
    }
}

/// Language of an exercise file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    Html,
    Css,
    JavaScript,
}

impl FileKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(FileKind::Html),
            "css" => Some(FileKind::Css),
            "js" => Some(FileKind::JavaScript),
            _ => None,
        }
    }
}

impl Question {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| GradeError::payload_with_source("invalid question payload", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Total number of requirements across files with a known extension.
    pub fn requirement_count(&self) -> usize {
        self.files
            .iter()
            .filter_map(|(name, reqs)| FileKind::from_file_name(name).map(|kind| reqs.count_for(kind)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kinds() {
        assert_eq!(FileKind::from_file_name("index.html"), Some(FileKind::Html));
        assert_eq!(FileKind::from_file_name("page.HTM"), Some(FileKind::Html));
        assert_eq!(FileKind::from_file_name("styles.css"), Some(FileKind::Css));
        assert_eq!(FileKind::from_file_name("app.js"), Some(FileKind::JavaScript));
        assert_eq!(FileKind::from_file_name("README"), None);
        assert_eq!(FileKind::from_file_name("data.json"), None);
    }

    #[test]
    fn test_decode_question() {
        let question = Question::from_json(
            r#"{
                "title": "Greeting card",
                "files": {
                    "index.html": {"structure": [
                        {"id": 1, "tag": "h1", "content": "Hello"},
                        {"id": 2, "tag": "p", "parent": 1}
                    ]},
                    "styles.css": {"css": [
                        {"selector": "h1", "properties": [{"property": "color", "value": "red"}]}
                    ]},
                    "app.js": {"elements": [
                        {"type": "variable", "name": "greeting", "declaration": "const"}
                    ]}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(question.title.as_deref(), Some("Greeting card"));
        assert_eq!(question.files["index.html"].structure[1].parent.as_deref(), Some("1"));
        assert_eq!(question.requirement_count(), 4);
    }

    #[test]
    fn test_bad_payload_is_payload_error() {
        let err = Question::from_json(r#"{"files": {"a.js": {"elements": [{"type": "nope"}]}}}"#)
            .unwrap_err();
        assert_eq!(err.category(), "payload");
    }
}
