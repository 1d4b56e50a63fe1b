//! Per-requirement structure, attribute and content checks.

use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use crate::document::validate_basic_html_structure;
use crate::normalize::{
    closing_tag, element_with_body, opening_tag, opening_tag_with_attributes, strip_tags,
    NormalizedHtml, DOCTYPE_HTML,
};
use crate::requirement::{
    is_doctype, is_void_element, resolve_parent, AttributeValue, StructureRequirement,
};
use indexmap::IndexMap;

lazy_static::lazy_static! {
    static ref ATTRIBUTE: Regex = Regex::new(
        r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#
    )
    .expect("valid attribute pattern");
}

/// Structure-only check of every requirement, in input order.
pub fn validate_structure(code: &str, requirements: &[StructureRequirement]) -> Vec<bool> {
    let normalized = NormalizedHtml::new(code);
    requirements
        .iter()
        .map(|requirement| structure_matches(code, &normalized, requirement, requirements))
        .collect()
}

/// Full check of `requirements[index]`: structure AND attributes/content.
///
/// An out-of-range index fails.
pub fn validate_html_requirement(
    code: &str,
    index: usize,
    requirements: &[StructureRequirement],
) -> bool {
    let Some(requirement) = requirements.get(index) else {
        return false;
    };
    let normalized = NormalizedHtml::new(code);

    let structure = structure_matches(code, &normalized, requirement, requirements);
    let detailed = attributes_and_content_match(code, &normalized, requirement, requirements);
    trace!(
        index,
        tag = %requirement.tag,
        structure,
        detailed,
        "HTML requirement checked"
    );
    structure && detailed
}

/// Whole-file run: the document-shape gate, then every requirement in full.
///
/// When the document shape is invalid every result is `false`.
pub fn validate_html_requirements(code: &str, requirements: &[StructureRequirement]) -> Vec<bool> {
    let report = validate_basic_html_structure(code);
    if !report.is_valid {
        debug!(
            missing = ?report.missing_elements,
            errors = ?report.structure_errors,
            "Document shape invalid, failing all requirements"
        );
        return vec![false; requirements.len()];
    }

    (0..requirements.len())
        .map(|index| validate_html_requirement(code, index, requirements))
        .collect()
}

fn structure_matches(
    code: &str,
    normalized: &NormalizedHtml,
    requirement: &StructureRequirement,
    requirements: &[StructureRequirement],
) -> bool {
    if is_doctype(&requirement.tag) {
        return DOCTYPE_HTML.is_match(code);
    }

    let tag = requirement.tag_name();
    let Some(child) = opening_tag(&tag) else {
        return false;
    };

    let parent = match resolve_parent(requirement, requirements) {
        Some(parent) if !is_doctype(&parent.tag) => parent,
        _ => {
            if requirement.parent.is_some() {
                warn!(
                    id = %requirement.id,
                    parent = ?requirement.parent,
                    "Unresolved parent, falling back to existence check"
                );
            }
            return child.is_match(normalized.as_str());
        }
    };

    let Some(parent_pattern) = element_with_body(&parent.tag_name()) else {
        return false;
    };
    let found = parent_pattern
        .captures_iter(normalized.as_str())
        .filter_map(|caps| caps.get(2))
        .any(|body| child.is_match(body.as_str()));
    found
}

fn attributes_and_content_match(
    code: &str,
    normalized: &NormalizedHtml,
    requirement: &StructureRequirement,
    requirements: &[StructureRequirement],
) -> bool {
    if is_doctype(&requirement.tag) {
        return DOCTYPE_HTML.is_match(code);
    }

    let tag = requirement.tag_name();
    if requirement.content.is_some() && is_void_element(&tag) {
        return false;
    }

    let scopes: Vec<&str> = match resolve_parent(requirement, requirements) {
        Some(parent) if !is_doctype(&parent.tag) => {
            let Some(parent_pattern) = element_with_body(&parent.tag_name()) else {
                return false;
            };
            parent_pattern
                .captures_iter(normalized.as_str())
                .filter(|caps| {
                    let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    attributes_satisfy(&parse_attributes(attrs), &parent.attributes)
                })
                .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
                .collect()
        }
        _ => vec![normalized.as_str()],
    };

    scopes
        .into_iter()
        .any(|scope| element_matches_in(scope, &tag, requirement))
}

fn element_matches_in(scope: &str, tag: &str, requirement: &StructureRequirement) -> bool {
    let (Some(open), Some(close)) = (opening_tag_with_attributes(tag), closing_tag(tag)) else {
        return false;
    };

    let found = open.captures_iter(scope).any(|caps| {
        let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !attributes_satisfy(&parse_attributes(attrs), &requirement.attributes) {
            return false;
        }

        let Some(expected) = requirement.content.as_deref() else {
            return true;
        };
        let Some(whole) = caps.get(0) else {
            return false;
        };
        let Some(end) = close.find_at(scope, whole.end()) else {
            return false;
        };
        content_matches(&scope[whole.end()..end.start()], expected)
    });
    found
}

fn content_matches(body: &str, expected: &str) -> bool {
    let expected = expected.trim();
    body.contains(expected) || strip_tags(body).contains(expected)
}

/// Attribute names (lowercased) to values; `None` for bare attributes.
pub(crate) fn parse_attributes(text: &str) -> HashMap<String, Option<String>> {
    ATTRIBUTE
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string());
            Some((name, value))
        })
        .collect()
}

fn attributes_satisfy(
    actual: &HashMap<String, Option<String>>,
    required: &IndexMap<String, AttributeValue>,
) -> bool {
    required.iter().all(|(name, expected)| {
        if !expected.is_required() {
            return true;
        }
        let Some(found) = actual.get(&name.to_ascii_lowercase()) else {
            return false;
        };
        match expected.accepted() {
            None => true,
            Some(accepted) => found.as_deref().unwrap_or("") == accepted,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: &str, tag: &str) -> StructureRequirement {
        StructureRequirement::new(id, tag)
    }

    #[test]
    fn existence_only_without_parent() {
        let reqs = vec![req("1", "section"), req("2", "footer")];
        let results = validate_structure("<section><p>x</p></section>", &reqs);
        assert_eq!(results, vec![true, false]);
    }

    #[test]
    fn child_must_sit_inside_parent() {
        let reqs = vec![req("list", "ul"), req("item", "li").with_parent("list")];
        assert_eq!(
            validate_structure("<ul><li>a</li></ul>", &reqs),
            vec![true, true]
        );
        assert_eq!(
            validate_structure("<ul></ul><li>a</li>", &reqs),
            vec![true, false]
        );
    }

    #[test]
    fn unresolved_parent_degrades_to_existence() {
        let reqs = vec![req("item", "li").with_parent("missing")];
        assert_eq!(validate_structure("<li>a</li>", &reqs), vec![true]);
    }

    #[test]
    fn attribute_kinds() {
        let reqs = vec![req("1", "input")
            .with_attribute("type", AttributeValue::OneOf(vec!["email".into(), "text".into()]))
            .with_attribute("name", AttributeValue::Text("mail".into()))
            .with_attribute("required", AttributeValue::Flag(true))];

        assert!(validate_html_requirement(
            r#"<input type="email" name='mail' required>"#,
            0,
            &reqs
        ));
        assert!(!validate_html_requirement(
            r#"<input type="text" name="mail" required>"#,
            0,
            &reqs
        ));
        assert!(!validate_html_requirement(
            r#"<input type="email" name="mail">"#,
            0,
            &reqs
        ));
    }

    #[test]
    fn any_candidate_may_satisfy() {
        let reqs = vec![req("1", "a").with_attribute("href", AttributeValue::Text("/b".into()))];
        assert!(validate_html_requirement(
            r#"<a href="/a">A</a><a href="/b">B</a>"#,
            0,
            &reqs
        ));
    }

    #[test]
    fn content_is_matched_in_body() {
        let reqs = vec![req("1", "h1").with_content("Welcome")];
        assert!(validate_html_requirement("<h1>Welcome home</h1>", 0, &reqs));
        assert!(!validate_html_requirement("<h1>Hello</h1>Welcome", 0, &reqs));
    }

    #[test]
    fn content_across_nested_markup() {
        let reqs = vec![req("1", "p").with_content("Hello World")];
        assert!(validate_html_requirement("<p>Hello <b>World</b></p>", 0, &reqs));
    }

    #[test]
    fn void_element_never_matches_content() {
        let reqs = vec![req("1", "img").with_content("x")];
        assert!(!validate_html_requirement("<img>x</img>", 0, &reqs));
    }

    #[test]
    fn parent_attribute_filter_applies() {
        let reqs = vec![
            req("nav", "div").with_attribute("class", AttributeValue::Text("nav".into())),
            req("link", "a").with_parent("nav"),
        ];
        let code = r#"<div class="main"><a href="/">x</a></div><div class="nav"></div>"#;
        assert!(!validate_html_requirement(code, 1, &reqs));

        let code = r#"<div class="nav"><a href="/">x</a></div>"#;
        assert!(validate_html_requirement(code, 1, &reqs));
    }

    #[test]
    fn doctype_requirement() {
        let reqs = vec![req("0", "!DOCTYPE")];
        assert!(validate_html_requirement("<!DOCTYPE html><html></html>", 0, &reqs));
        assert!(!validate_html_requirement("<html></html>", 0, &reqs));
    }

    #[test]
    fn out_of_range_index_fails() {
        assert!(!validate_html_requirement("<p></p>", 3, &[req("1", "p")]));
    }

    #[test]
    fn whole_file_run_gates_on_document_shape() {
        let reqs = vec![req("1", "p")];
        assert_eq!(validate_html_requirements("<p>x</p>", &reqs), vec![false]);

        let doc = "<!DOCTYPE html><html><head><title>t</title></head><body><p>x</p></body></html>";
        assert_eq!(validate_html_requirements(doc, &reqs), vec![true]);
    }

    #[test]
    fn parses_attribute_forms() {
        let attrs = parse_attributes(r#" id="a" class='b c' data-x=1 hidden /"#);
        assert_eq!(attrs.get("id"), Some(&Some("a".to_string())));
        assert_eq!(attrs.get("class"), Some(&Some("b c".to_string())));
        assert_eq!(attrs.get("data-x"), Some(&Some("1".to_string())));
        assert_eq!(attrs.get("hidden"), Some(&None));
    }
}
