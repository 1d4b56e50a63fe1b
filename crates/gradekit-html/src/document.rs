//! Coarse document-shape check run before the per-requirement checks.

use regex::Regex;
use serde::Serialize;
use tracing::trace;

lazy_static::lazy_static! {
    static ref DOCTYPE: Regex = Regex::new(r"(?i)<!DOCTYPE\s+html\b").expect("valid pattern");
    static ref HTML_OPEN: Regex = Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("valid pattern");
    static ref HTML_CLOSE: Regex = Regex::new(r"(?i)</html\s*>").expect("valid pattern");
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid pattern");
    static ref BODY_OPEN: Regex = Regex::new(r"(?i)<body(?:\s[^>]*)?>").expect("valid pattern");
    static ref BODY_CLOSE: Regex = Regex::new(r"(?i)</body\s*>").expect("valid pattern");
    static ref META: Regex = Regex::new(r"(?i)<meta(?:[\s/>]|$)").expect("valid pattern");
    static ref TITLE: Regex = Regex::new(r"(?i)<title(?:[\s/>]|$)").expect("valid pattern");
}

/// Result of [`validate_basic_html_structure`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStructureReport {
    pub is_valid: bool,
    pub missing_elements: Vec<String>,
    pub structure_errors: Vec<String>,
}

/// Check DOCTYPE, `<html>`, `<head>` and `<body>` presence and placement.
///
/// Also flags `<meta>`/`<title>` written inside `<body>`.
pub fn validate_basic_html_structure(code: &str) -> BasicStructureReport {
    let mut missing = Vec::new();
    let mut errors = Vec::new();

    if !DOCTYPE.is_match(code) {
        missing.push("<!DOCTYPE html>".to_string());
    }

    let html = HTML_OPEN.find(code);
    let head = HEAD_OPEN.find(code);
    let body = BODY_OPEN.find(code);

    if html.is_none() {
        missing.push("<html>".to_string());
    }
    if head.is_none() {
        missing.push("<head>".to_string());
    }
    if body.is_none() {
        missing.push("<body>".to_string());
    }

    if let Some(html) = html {
        let html_end = HTML_CLOSE
            .find_at(code, html.end())
            .map(|m| m.start())
            .unwrap_or(code.len());
        let inside = |start: usize| start >= html.end() && start < html_end;

        if let Some(head) = head {
            if !inside(head.start()) {
                errors.push("<head> must be inside <html>".to_string());
            }
        }
        if let Some(body) = body {
            if !inside(body.start()) {
                errors.push("<body> must be inside <html>".to_string());
            }
        }
    }

    if let (Some(head), Some(body)) = (head, body) {
        if head.start() > body.start() {
            errors.push("<head> must come before <body>".to_string());
        }
    }

    if let Some(body) = body {
        let body_end = BODY_CLOSE
            .find_at(code, body.end())
            .map(|m| m.start())
            .unwrap_or(code.len());
        let body_content = &code[body.end()..body_end];
        if META.is_match(body_content) {
            errors.push("<meta> tags belong in <head>, not <body>".to_string());
        }
        if TITLE.is_match(body_content) {
            errors.push("<title> belongs in <head>, not <body>".to_string());
        }
    }

    let report = BasicStructureReport {
        is_valid: missing.is_empty() && errors.is_empty(),
        missing_elements: missing,
        structure_errors: errors,
    };
    trace!(?report, "Basic document structure checked");
    report
}
