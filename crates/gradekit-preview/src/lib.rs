//! # GradeKit Preview
//!
//! Turns an exercise's file map into one self-contained HTML document that can
//! be rendered in a sandboxed frame.
//!
//! The main document is taken verbatim. References to other files in the map
//! are rewritten in place:
//!
//! - `<link rel="stylesheet">` and `<script src>` point at `data:` URLs
//! - `<div include>`, `<div data-src>` and `<link rel="import">` are replaced
//!   by the referenced document's markup
//! - `<iframe src>`, `<object data>` and `<embed src>` point at a `data:` URL of
//!   the referenced document, with that document's own assets inlined
//!
//! No missing `<html>`, `<head>` or `<body>` is repaired, so the preview always
//! shows what the learner actually wrote.

mod assemble;

pub use assemble::{generate_html_preview, main_document};

/// Content types the preview embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Css,
    JavaScript,
    Html,
}

impl MediaType {
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Css => "text/css",
            MediaType::JavaScript => "text/javascript",
            MediaType::Html => "text/html",
        }
    }
}

/// Build a percent-encoded `data:` URL, e.g. `data:text/css;charset=utf-8,body%7B%7D`.
pub fn data_url(media_type: MediaType, content: &str) -> String {
    format!(
        "data:{};charset=utf-8,{}",
        media_type.mime(),
        urlencoding::encode(content)
    )
}
