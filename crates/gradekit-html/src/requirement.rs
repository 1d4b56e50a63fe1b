//! Structure requirements as they arrive in a question payload.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Elements that never take a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Whether `tag` is a void (self-closing) element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(tag.trim()))
}

/// Whether `tag` names the document type declaration rather than an element.
pub fn is_doctype(tag: &str) -> bool {
    tag.trim().trim_start_matches('!').eq_ignore_ascii_case("doctype")
}

/// Expected value of a required attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Presence-only attribute (`required`, `disabled`). `false` places no requirement.
    Flag(bool),
    /// Exact attribute value.
    Text(String),
    /// A list of values; the first entry is the one accepted.
    OneOf(Vec<String>),
}

impl AttributeValue {
    /// The value a matching attribute must carry, `None` for presence-only.
    pub fn accepted(&self) -> Option<&str> {
        match self {
            AttributeValue::Flag(_) => None,
            AttributeValue::Text(value) => Some(value),
            AttributeValue::OneOf(values) => Some(values.first().map(String::as_str).unwrap_or("")),
        }
    }

    /// Whether this entry places any requirement on the element at all.
    pub fn is_required(&self) -> bool {
        !matches!(self, AttributeValue::Flag(false))
    }
}

/// One declarative assertion about an HTML element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRequirement {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub tag: String,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub parent: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl StructureRequirement {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            attributes: IndexMap::new(),
            parent: None,
            content: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// The tag name, lowercased and trimmed.
    pub fn tag_name(&self) -> String {
        self.tag.trim().to_ascii_lowercase()
    }
}

/// Resolve the parent requirement of `requirement` within `requirements`.
///
/// A parent that points at the requirement itself counts as unresolved.
pub fn resolve_parent<'a>(
    requirement: &StructureRequirement,
    requirements: &'a [StructureRequirement],
) -> Option<&'a StructureRequirement> {
    let parent_id = requirement.parent.as_deref()?;
    if parent_id == requirement.id {
        return None;
    }
    requirements.iter().find(|candidate| candidate.id == parent_id)
}

/// Render the literal tag a learner is expected to write for `requirement`.
///
/// Void elements are rendered without content or closing tag.
pub fn expected_description(requirement: &StructureRequirement) -> String {
    if is_doctype(&requirement.tag) {
        return "<!DOCTYPE html>".to_string();
    }

    let tag = requirement.tag_name();
    let mut out = format!("<{}", tag);
    for (name, value) in &requirement.attributes {
        if !value.is_required() {
            continue;
        }
        match value.accepted() {
            None => {
                out.push(' ');
                out.push_str(name);
            }
            Some(accepted) => {
                let quote = if accepted.contains('"') { '\'' } else { '"' };
                out.push_str(&format!(" {}={}{}{}", name, quote, accepted, quote));
            }
        }
    }
    out.push('>');

    if is_void_element(&tag) {
        return out;
    }

    if let Some(content) = &requirement.content {
        out.push_str(content);
    }
    out.push_str(&format!("</{}>", tag));
    out
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

impl From<IdRepr> for String {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Text(text) => text,
            IdRepr::Number(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    IdRepr::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(String::from))
}
