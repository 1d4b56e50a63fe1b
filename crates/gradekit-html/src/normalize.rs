//! Source normalization and the tag patterns shared by the validators.

use gradekit_common::FactExtractor;
use regex::Regex;

lazy_static::lazy_static! {
    static ref DOCTYPE_ANY: Regex = Regex::new(r"(?i)<!DOCTYPE[^>]*>").expect("valid doctype pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
    static ref TAGS: Regex = Regex::new(r"<[^>]*>").expect("valid tag pattern");
    pub(crate) static ref DOCTYPE_HTML: Regex =
        Regex::new(r"(?i)<!DOCTYPE\s+html\s*>").expect("valid doctype html pattern");
}

/// HTML source with the DOCTYPE removed and whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedHtml(String);

impl NormalizedHtml {
    pub fn new(code: &str) -> Self {
        let without_doctype = DOCTYPE_ANY.replace_all(code, "");
        Self(collapse_whitespace(&without_doctype))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extracts [`NormalizedHtml`] from raw markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlNormalizer;

impl FactExtractor for HtmlNormalizer {
    type Facts = NormalizedHtml;

    fn extract(&self, source: &str) -> Option<NormalizedHtml> {
        Some(NormalizedHtml::new(source))
    }
}

/// Collapse runs of whitespace to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Remove every `<...>` tag, keeping only text.
pub(crate) fn strip_tags(text: &str) -> String {
    collapse_whitespace(&TAGS.replace_all(text, " "))
}

/// `<tag` followed by whitespace, `/`, `>` or end of input.
pub(crate) fn opening_tag(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)<{}(?:[\s/>]|$)", regex::escape(tag))).ok()
}

/// A full opening tag, capturing its attribute text in group 1.
pub(crate) fn opening_tag_with_attributes(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?is)<{}((?:\s[^>]*)?)>", regex::escape(tag))).ok()
}

/// `<tag ...>body</tag>`, non-greedy, capturing attribute text and body.
pub(crate) fn element_with_body(tag: &str) -> Option<Regex> {
    let escaped = regex::escape(tag);
    Regex::new(&format!(
        r"(?is)<{0}((?:\s[^>]*)?)>(.*?)</{0}\s*>",
        escaped
    ))
    .ok()
}

/// The closing tag for `tag`.
pub(crate) fn closing_tag(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)</{}\s*>", regex::escape(tag))).ok()
}
