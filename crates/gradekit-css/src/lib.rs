//! # GradeKit CSS
//!
//! Extracts `selector → {property: value}` maps from learner stylesheets and
//! checks declarative CSS requirements against them.
//!
//! The cascade model is deliberately simple: for a given selector the last
//! declaration of a property wins, specificity and origin are ignored.

pub mod parser;
pub mod rules;

pub use parser::{parse_stylesheet, DeclarationAst, ParseError, RuleAst, StylesheetAst};
pub use rules::{
    expected_css_description, parse_css, validate_css, validate_css_requirement, CssProperty,
    CssRequirement, CssRuleMap, CssRuleParser, PropertyMap,
};
