//! Selector → property map and requirement checks on top of the parser.

use gradekit_common::FactExtractor;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::parser::{normalize_selector, parse_stylesheet};

/// Property name → authored value.
pub type PropertyMap = IndexMap<String, String>;

/// Selector → merged properties. Later rules overwrite earlier values.
pub type CssRuleMap = IndexMap<String, PropertyMap>;

/// One required declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssProperty {
    pub property: String,
    pub value: String,
}

/// A selector and the declarations it must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssRequirement {
    pub selector: String,
    #[serde(default)]
    pub properties: Vec<CssProperty>,
}

impl CssRequirement {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(CssProperty {
            property: property.into(),
            value: value.into(),
        });
        self
    }
}

/// Extracts a [`CssRuleMap`] from stylesheet text.
#[derive(Debug, Default, Clone, Copy)]
pub struct CssRuleParser;

impl FactExtractor for CssRuleParser {
    type Facts = CssRuleMap;

    fn extract(&self, source: &str) -> Option<CssRuleMap> {
        parse_css(source)
    }
}

/// Parse `css_text` into a selector map, `None` when it cannot be parsed.
pub fn parse_css(css_text: &str) -> Option<CssRuleMap> {
    let ast = match parse_stylesheet(css_text) {
        Ok(ast) => ast,
        Err(err) => {
            debug!(%err, "CSS parse failed");
            return None;
        }
    };

    let mut map = CssRuleMap::new();
    for rule in ast.rules {
        for selector in &rule.selectors {
            let properties = map.entry(selector.clone()).or_default();
            for decl in &rule.declarations {
                properties.insert(decl.property.clone(), decl.value.clone());
            }
        }
    }
    trace!(selectors = map.len(), "CSS parsed");
    Some(map)
}

/// Check `requirements[index]` against `css_text`.
///
/// Passes only when the selector exists and every required property has
/// exactly the expected (trimmed) value.
pub fn validate_css_requirement(css_text: &str, index: usize, requirements: &[CssRequirement]) -> bool {
    let Some(requirement) = requirements.get(index) else {
        return false;
    };
    let Some(rules) = parse_css(css_text) else {
        return false;
    };
    requirement_satisfied(&rules, requirement)
}

/// Check every requirement against one parse of `css_text`, in input order.
pub fn validate_css(css_text: &str, requirements: &[CssRequirement]) -> Vec<bool> {
    match parse_css(css_text) {
        Some(rules) => requirements
            .iter()
            .map(|requirement| requirement_satisfied(&rules, requirement))
            .collect(),
        None => vec![false; requirements.len()],
    }
}

fn requirement_satisfied(rules: &CssRuleMap, requirement: &CssRequirement) -> bool {
    let Some(properties) = rules.get(&normalize_selector(&requirement.selector)) else {
        trace!(selector = %requirement.selector, "Selector not found");
        return false;
    };

    requirement.properties.iter().all(|expected| {
        properties
            .get(expected.property.trim())
            .is_some_and(|actual| actual.trim() == expected.value.trim())
    })
}

/// Render a requirement as the rule a learner is expected to write.
pub fn expected_css_description(requirement: &CssRequirement) -> String {
    let declarations: String = requirement
        .properties
        .iter()
        .map(|p| format!(" {}: {};", p.property, p.value))
        .collect();
    format!("{} {{{} }}", requirement.selector, declarations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_with<E: FactExtractor>(extractor: E, source: &str) -> Option<E::Facts> {
        extractor.extract(source)
    }

    #[test]
    fn rule_parser_extracts_through_trait() {
        let css = "h1 { color: red; }";
        assert_eq!(extract_with(CssRuleParser, css), parse_css(css));
        assert_eq!(extract_with(CssRuleParser, css).unwrap()["h1"]["color"], "red");
    }

    #[test]
    fn later_rules_overwrite_earlier_values() {
        let map = parse_css(".a { color: red; margin: 0; } .a { color: blue; }").unwrap();
        let a = &map[".a"];
        assert_eq!(a["color"], "blue");
        assert_eq!(a["margin"], "0");
    }

    #[test]
    fn grouped_selectors_share_declarations() {
        let map = parse_css("h1, h2 { font-weight: bold; }").unwrap();
        assert_eq!(map["h1"]["font-weight"], "bold");
        assert_eq!(map["h2"]["font-weight"], "bold");
    }

    #[test]
    fn parse_failure_is_none() {
        assert!(parse_css(".a { color: red;").is_none());
    }

    #[test]
    fn all_properties_must_match() {
        let reqs = vec![CssRequirement::new(".box")
            .with_property("color", "red")
            .with_property("padding", "4px")];
        assert!(validate_css_requirement(".box { color: red; padding: 4px; }", 0, &reqs));
        assert!(!validate_css_requirement(".box { color: red; padding: 5px; }", 0, &reqs));
        assert!(!validate_css_requirement(".box { color: red; }", 0, &reqs));
    }

    #[test]
    fn values_are_case_sensitive() {
        let reqs = vec![CssRequirement::new("p").with_property("color", "red")];
        assert!(!validate_css_requirement("p { color: RED; }", 0, &reqs));
    }

    #[test]
    fn missing_selector_or_index_fails() {
        let reqs = vec![CssRequirement::new("#main").with_property("width", "10px")];
        assert!(!validate_css_requirement("main { width: 10px; }", 0, &reqs));
        assert!(!validate_css_requirement("#main { width: 10px; }", 1, &reqs));
    }

    #[test]
    fn describes_requirement() {
        let req = CssRequirement::new(".box")
            .with_property("color", "red")
            .with_property("margin", "0 auto");
        assert_eq!(
            expected_css_description(&req),
            ".box { color: red; margin: 0 auto; }"
        );
    }

    #[test]
    fn batch_validation_preserves_order() {
        let reqs = vec![
            CssRequirement::new("a").with_property("color", "red"),
            CssRequirement::new("b").with_property("color", "red"),
        ];
        assert_eq!(validate_css("a { color: red; }", &reqs), vec![true, false]);
        assert_eq!(validate_css("a { color: red;", &reqs), vec![false, false]);
    }
}
