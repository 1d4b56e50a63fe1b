//! Minimal stylesheet parser: `selector { prop: value; }` rules into an AST.
//!
//! Notes:
//! - This is not a full CSS parser.
//! - Grouping at-rules (`@media`, `@supports`, `@layer`, `@container`) are
//!   descended into; other at-rule blocks (`@font-face`, `@keyframes`) are skipped.
//! - Braces inside strings are not understood.

use thiserror::Error;

/// Errors that can occur while parsing CSS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of input: block opened at byte {0} is never closed")]
    UnexpectedEof(usize),
}

/// A parsed stylesheet AST.
#[derive(Debug, Default, Clone)]
pub struct StylesheetAst {
    pub rules: Vec<RuleAst>,
}

/// A parsed rule AST. A comma-separated selector clause yields several selectors.
#[derive(Debug, Clone)]
pub struct RuleAst {
    pub selectors: Vec<String>,
    pub declarations: Vec<DeclarationAst>,
}

/// A parsed declaration AST. `value` is the authored text, `!important` included.
#[derive(Debug, Clone)]
pub struct DeclarationAst {
    pub property: String,
    pub value: String,
    pub important: bool,
}

const GROUPING_AT_RULES: &[&str] = &["@media", "@supports", "@layer", "@container", "@document"];

/// Parse a stylesheet into an AST.
pub fn parse_stylesheet(css: &str) -> Result<StylesheetAst, ParseError> {
    let mut out = StylesheetAst::default();
    let stripped = strip_comments(css);
    parse_rules(&stripped, 0, &mut out)?;
    Ok(out)
}

fn parse_rules(text: &str, offset: usize, out: &mut StylesheetAst) -> Result<(), ParseError> {
    let mut cursor = 0;
    while let Some(rel_open) = text[cursor..].find('{') {
        let open = cursor + rel_open;
        let close = matching_brace(text, open).ok_or(ParseError::UnexpectedEof(offset + open))?;

        // Statements such as `@import "x";` or stray `}` may precede the prelude.
        let prelude = text[cursor..open]
            .rsplit(|c| c == ';' || c == '}')
            .next()
            .unwrap_or("")
            .trim();
        let inner = &text[open + 1..close];

        if prelude.starts_with('@') {
            let keyword = prelude
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            if GROUPING_AT_RULES.contains(&keyword.as_str()) {
                parse_rules(inner, offset + open + 1, out)?;
            }
        } else if !prelude.is_empty() {
            let declarations = parse_declarations(inner);
            if !declarations.is_empty() {
                out.rules.push(RuleAst {
                    selectors: split_selectors(prelude),
                    declarations,
                });
            }
        }

        cursor = close + 1;
    }
    Ok(())
}

fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_selectors(prelude: &str) -> Vec<String> {
    prelude
        .split(',')
        .map(normalize_selector)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Collapse internal whitespace of a selector and trim it.
pub fn normalize_selector(selector: &str) -> String {
    selector.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_declarations(block: &str) -> Vec<DeclarationAst> {
    block
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(DeclarationAst {
                property: property.to_string(),
                value: value.to_string(),
                important: is_important(value),
            })
        })
        .collect()
}

fn is_important(value: &str) -> bool {
    value.to_ascii_lowercase().contains("!important")
}

/// Very small comment skipper: removes `/* ... */`, an unterminated comment runs to the end.
fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(cc) = chars.next() {
                if cc == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_stylesheet() {
        let css = r#"
            body { color: black; }
            .container { width: 100%; height: 10px !important; }
        "#;
        let ast = parse_stylesheet(css).unwrap();
        assert_eq!(ast.rules.len(), 2);
        assert_eq!(ast.rules[0].selectors, vec!["body"]);
        assert_eq!(ast.rules[0].declarations.len(), 1);
        assert_eq!(ast.rules[1].selectors, vec![".container"]);
        assert_eq!(ast.rules[1].declarations.len(), 2);
        assert!(ast.rules[1].declarations[1].important);
        assert_eq!(ast.rules[1].declarations[1].value, "10px !important");
    }

    #[test]
    fn parse_with_comments() {
        let css = r#"
            /* comment */
            body { color: black; /* inside */ width: 10px; }
        "#;
        let ast = parse_stylesheet(css).unwrap();
        assert_eq!(ast.rules.len(), 1);
        assert_eq!(ast.rules[0].declarations.len(), 2);
    }

    #[test]
    fn value_keeps_later_colons() {
        let ast = parse_stylesheet("a { background: url(http://x/y.png); }").unwrap();
        assert_eq!(ast.rules[0].declarations[0].value, "url(http://x/y.png)");
    }

    #[test]
    fn comma_separated_selectors() {
        let ast = parse_stylesheet("h1,  h2 ,\n .title  span { margin: 0 }").unwrap();
        assert_eq!(ast.rules[0].selectors, vec!["h1", "h2", ".title span"]);
    }

    #[test]
    fn descends_into_media_blocks() {
        let css = "@import url(base.css);\n@media (max-width: 600px) { .a { color: red; } }\n@font-face { font-family: X; }\n.b { color: blue; }";
        let ast = parse_stylesheet(css).unwrap();
        let selectors: Vec<_> = ast.rules.iter().flat_map(|r| r.selectors.clone()).collect();
        assert_eq!(selectors, vec![".a", ".b"]);
    }

    #[test]
    fn unclosed_block_is_error() {
        let css = "body { color: black;";
        let err = parse_stylesheet(css).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEof(5));
    }
}
