//! # GradeKit HTML
//!
//! Structural validator for the HTML track of coding exercises.
//!
//! Submitted markup is matched with tolerant patterns instead of a
//! standards-compliant parser: learners write slightly malformed HTML, and grading
//! is tuned against what these patterns accept.
//!
//! ## Checks
//!
//! 1. **Document shape**: DOCTYPE, `<html>`, `<head>`, `<body>` presence and order
//! 2. **Structure**: a tag exists, optionally inside its parent's tag
//! 3. **Attributes and content**: required attribute values and text body

pub mod document;
pub mod normalize;
pub mod requirement;
pub mod structure;

pub use document::{validate_basic_html_structure, BasicStructureReport};
pub use normalize::{HtmlNormalizer, NormalizedHtml};
pub use requirement::{
    expected_description, is_void_element, AttributeValue, StructureRequirement, VOID_ELEMENTS,
};
pub use structure::{validate_html_requirement, validate_html_requirements, validate_structure};
