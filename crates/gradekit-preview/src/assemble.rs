//! Reference rewriting over the main document.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::{debug, trace, warn};

use crate::{data_url, MediaType};

lazy_static::lazy_static! {
    static ref REL_STYLESHEET: Regex =
        Regex::new(r#"(?i)\brel\s*=\s*["']?\s*stylesheet\b"#).expect("valid pattern");
    static ref REL_IMPORT: Regex =
        Regex::new(r#"(?i)\brel\s*=\s*["']?\s*import\b"#).expect("valid pattern");
}

/// The document the preview is built from: `index.html` when present, else
/// the first `.html` file in map order.
pub fn main_document(files: &IndexMap<String, String>) -> Option<(&str, &str)> {
    files
        .get_key_value("index.html")
        .or_else(|| files.iter().find(|(name, _)| is_html(name)))
        .map(|(name, content)| (name.as_str(), content.as_str()))
}

/// Assemble the preview document, or an empty string when there is no
/// non-blank HTML file to start from.
pub fn generate_html_preview(files: &IndexMap<String, String>) -> String {
    let Some((main_name, main)) = main_document(files) else {
        debug!(files = files.len(), "No HTML file to preview");
        return String::new();
    };
    if main.trim().is_empty() {
        debug!(file = main_name, "Main document is blank");
        return String::new();
    }

    // Documents go first so assets referenced by inlined markup are rewritten below.
    let mut html = main.to_string();
    for (name, content) in files {
        if name == main_name || !is_html(name) {
            continue;
        }
        html = inline_document(&html, name, content);
        html = embed_document(&html, name, &inline_assets(content, files));
    }

    let html = inline_assets(&html, files);
    debug!(file = main_name, len = html.len(), "Preview assembled");
    html
}

/// Point stylesheet links and script sources at data URLs.
fn inline_assets(html: &str, files: &IndexMap<String, String>) -> String {
    let mut html = html.to_string();
    for (name, content) in files {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".css") {
            html = rewrite_stylesheet(&html, name, content);
        } else if lower.ends_with(".js") {
            html = rewrite_script(&html, name, content);
        }
    }
    html
}

fn rewrite_stylesheet(html: &str, name: &str, content: &str) -> String {
    let pattern = format!(
        r#"(?i)(<link\b[^>]*?\bhref\s*=\s*)(["']){}(["'])([^>]*>)"#,
        file_reference(name)
    );
    let Some(re) = compile(&pattern, name) else {
        return html.to_string();
    };
    let url = data_url(MediaType::Css, content);
    re.replace_all(html, |caps: &Captures<'_>| {
        if !REL_STYLESHEET.is_match(&caps[0]) {
            return caps[0].to_string();
        }
        trace!(file = name, "Inlining stylesheet");
        format!("{}{}{}{}{}", &caps[1], &caps[2], url, &caps[3], &caps[4])
    })
    .into_owned()
}

fn rewrite_script(html: &str, name: &str, content: &str) -> String {
    let pattern = format!(
        r#"(?i)(<script\b[^>]*?\bsrc\s*=\s*)(["']){}(["'])"#,
        file_reference(name)
    );
    let Some(re) = compile(&pattern, name) else {
        return html.to_string();
    };
    let url = data_url(MediaType::JavaScript, content);
    re.replace_all(html, |caps: &Captures<'_>| {
        trace!(file = name, "Inlining script");
        format!("{}{}{}{}", &caps[1], &caps[2], url, &caps[3])
    })
    .into_owned()
}

/// Replace `<div include>`, `<div data-src>` and `<link rel="import">` with
/// the document's markup wrapped in a `<div>`.
fn inline_document(html: &str, name: &str, content: &str) -> String {
    let wrapped = format!("<div>{}</div>", content);
    let reference = file_reference(name);

    let div = format!(
        r#"(?is)<div\b[^>]*?\b(?:include|data-src)\s*=\s*["']{}["'][^>]*>.*?</div\s*>"#,
        reference
    );
    let mut html = match compile(&div, name) {
        Some(re) => re
            .replace_all(html, |_: &Captures<'_>| {
                trace!(file = name, "Inlining included document");
                wrapped.clone()
            })
            .into_owned(),
        None => html.to_string(),
    };

    let import = format!(
        r#"(?i)<link\b[^>]*?\bhref\s*=\s*["']{}["'][^>]*>"#,
        reference
    );
    if let Some(re) = compile(&import, name) {
        html = re
            .replace_all(&html, |caps: &Captures<'_>| {
                if REL_IMPORT.is_match(&caps[0]) {
                    trace!(file = name, "Inlining imported document");
                    wrapped.clone()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
    }
    html
}

/// Point `<iframe src>`, `<object data>` and `<embed src>` at the document.
fn embed_document(html: &str, name: &str, content: &str) -> String {
    let pattern = format!(
        r#"(?i)(<(?:iframe|embed)\b[^>]*?\bsrc\s*=\s*|<object\b[^>]*?\bdata\s*=\s*)(["']){}(["'])"#,
        file_reference(name)
    );
    let Some(re) = compile(&pattern, name) else {
        return html.to_string();
    };
    let url = data_url(MediaType::Html, content);
    re.replace_all(html, |caps: &Captures<'_>| {
        trace!(file = name, "Embedding document");
        format!("{}{}{}{}", &caps[1], &caps[2], url, &caps[3])
    })
    .into_owned()
}

/// `name` or `./name`, matched literally and case-sensitively.
fn file_reference(name: &str) -> String {
    format!(r"(?:\./)?(?-i:{})", regex::escape(name))
}

fn compile(pattern: &str, name: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(file = name, %err, "Skipping references to file");
            None
        }
    }
}

fn is_html(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".html")
}
