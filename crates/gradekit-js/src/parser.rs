//! Pattern-based extraction of variables, functions and event handlers.
//!
//! This is a lexical approximation, not a JavaScript parser. String and
//! template-literal boundaries are not tracked, so text inside literals that
//! looks like a declaration is picked up as one; exercises are authored
//! against that behaviour.
//!
//! Passes run in a fixed order over the comment-free, whitespace-collapsed
//! source, and a later pass overwrites a same-named entry from an earlier one.

use gradekit_common::FactExtractor;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::trace;

use crate::element::{Declaration, FuncType};

lazy_static::lazy_static! {
    static ref BLOCK_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").expect("valid pattern");
    static ref LINE_COMMENT: Regex = Regex::new(r"//[^\n]*").expect("valid pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid pattern");

    static ref VARIABLE: Regex =
        Regex::new(r"\b(let|const|var)\s+([A-Za-z_$][\w$]*)\s*=\s*([^;]+);").expect("valid pattern");
    static ref UNINITIALISED: Regex =
        Regex::new(r"\b(let|var)\s+([A-Za-z_$][\w$]*)\s*;").expect("valid pattern");
    static ref NAMED_FUNCTION: Regex =
        Regex::new(r"\bfunction\s+([A-Za-z_$][\w$]*)\s*\(([^)]*)\)\s*\{").expect("valid pattern");
    static ref ASYNC_FUNCTION: Regex =
        Regex::new(r"\basync\s+function\s+([A-Za-z_$][\w$]*)\s*\(([^)]*)\)\s*\{").expect("valid pattern");
    static ref ARROW_FUNCTION: Regex = Regex::new(
        r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(async\b\s*)?(?:\(([^)]*)\)|([A-Za-z_$][\w$]*))\s*=>"
    )
    .expect("valid pattern");
    static ref METHOD: Regex =
        Regex::new(r"([A-Za-z_$][\w$]*)\s*\(([^)]*)\)\s*\{").expect("valid pattern");
    static ref CONSTRUCTOR: Regex =
        Regex::new(r"\bfunction\s+([A-Z][\w$]*)\s*\(([^)]*)\)\s*\{").expect("valid pattern");
    static ref EVENT: Regex = Regex::new(
        r"((?:window|document)\.onload|\bonclick|\bonload)\s*=\s*([^;=\s][^;]*)"
    )
    .expect("valid pattern");
}

/// Words that take a parenthesised clause before a block and are never methods.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "with", "return", "typeof", "await",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableInfo {
    pub declaration: Declaration,
    pub value: Option<String>,
    /// Byte offset of the declaration in the normalized source.
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    #[serde(rename = "type")]
    pub func_type: FuncType,
    pub parameters: Vec<String>,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventInfo {
    pub value: String,
    pub order: usize,
}

/// Facts extracted from one JavaScript source. Built fresh per call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedCode {
    pub variables: IndexMap<String, VariableInfo>,
    pub functions: IndexMap<String, FunctionInfo>,
    pub events: IndexMap<String, EventInfo>,
}

impl ParsedCode {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.functions.is_empty() && self.events.is_empty()
    }
}

/// Extracts [`ParsedCode`] from JavaScript source.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsPatternParser;

impl FactExtractor for JsPatternParser {
    type Facts = ParsedCode;

    fn extract(&self, source: &str) -> Option<ParsedCode> {
        Some(parse_javascript(source))
    }
}

/// Strip comments and collapse whitespace.
pub fn normalize_source(code: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(code, "");
    let without_lines = LINE_COMMENT.replace_all(&without_blocks, "");
    WHITESPACE.replace_all(&without_lines, " ").trim().to_string()
}

/// Run every extraction pass over `code`.
///
/// Malformed source still yields a snapshot, possibly empty.
pub fn parse_javascript(code: &str) -> ParsedCode {
    let source = normalize_source(code);
    let mut parsed = ParsedCode::default();

    // 1. declarations, with and without a value, in source order
    let mut declarations: Vec<(&str, VariableInfo)> = Vec::new();
    for caps in VARIABLE.captures_iter(&source) {
        if let Some(declaration) = Declaration::from_keyword(group(&caps, 1)) {
            let info = VariableInfo {
                declaration,
                value: Some(group(&caps, 3).trim().to_string()),
                order: start(&caps),
            };
            declarations.push((group(&caps, 2), info));
        }
    }
    for caps in UNINITIALISED.captures_iter(&source) {
        if let Some(declaration) = Declaration::from_keyword(group(&caps, 1)) {
            let info = VariableInfo {
                declaration,
                value: None,
                order: start(&caps),
            };
            declarations.push((group(&caps, 2), info));
        }
    }
    declarations.sort_by_key(|(_, info)| info.order);
    for (name, info) in declarations {
        parsed.variables.insert(name.to_string(), info);
    }

    // 2. named functions
    for caps in NAMED_FUNCTION.captures_iter(&source) {
        insert_function(&mut parsed, &caps, FuncType::Function, 2);
    }

    // 3. async functions
    for caps in ASYNC_FUNCTION.captures_iter(&source) {
        insert_function(&mut parsed, &caps, FuncType::Async, 2);
    }

    // 4. arrow functions
    for caps in ARROW_FUNCTION.captures_iter(&source) {
        let func_type = if caps.get(2).is_some() {
            FuncType::AsyncArrow
        } else {
            FuncType::Arrow
        };
        let params = caps.get(3).or_else(|| caps.get(4)).map(|m| m.as_str()).unwrap_or("");
        parsed.functions.insert(
            group(&caps, 1).to_string(),
            FunctionInfo {
                func_type,
                parameters: split_parameters(params),
                order: start(&caps),
            },
        );
    }

    // 5. object and class methods
    for caps in METHOD.captures_iter(&source) {
        let name = group(&caps, 1);
        let at = start(&caps);
        if CONTROL_KEYWORDS.contains(&name) || !looks_like_method(&source[..at]) {
            continue;
        }
        insert_function(&mut parsed, &caps, FuncType::Method, 2);
    }

    // 6. constructor functions; overwrites pass 2 for the same name
    for caps in CONSTRUCTOR.captures_iter(&source) {
        insert_function(&mut parsed, &caps, FuncType::Constructor, 2);
    }

    // 7. event handler assignments
    for caps in EVENT.captures_iter(&source) {
        parsed.events.insert(
            group(&caps, 1).to_string(),
            EventInfo {
                value: group(&caps, 2).trim().to_string(),
                order: start(&caps),
            },
        );
    }

    trace!(
        variables = parsed.variables.len(),
        functions = parsed.functions.len(),
        events = parsed.events.len(),
        "JavaScript parsed"
    );
    parsed
}

fn group<'h>(caps: &Captures<'h>, index: usize) -> &'h str {
    caps.get(index).map(|m| m.as_str()).unwrap_or("")
}

fn start(caps: &Captures<'_>) -> usize {
    caps.get(0).map(|m| m.start()).unwrap_or(0)
}

fn insert_function(parsed: &mut ParsedCode, caps: &Captures<'_>, func_type: FuncType, params: usize) {
    parsed.functions.insert(
        group(caps, 1).to_string(),
        FunctionInfo {
            func_type,
            parameters: split_parameters(group(caps, params)),
            order: start(caps),
        },
    );
}

/// Parameter names with default values removed.
fn split_parameters(params: &str) -> Vec<String> {
    params
        .split(',')
        .filter_map(|param| {
            let name = param.split('=').next().unwrap_or("").trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Whether a `name(...) {` match ending `prefix` sits in an object or class
/// body: the nearest unmatched `{` is closer than the nearest `;`, and the
/// match is not a `function` declaration or member call.
fn looks_like_method(prefix: &str) -> bool {
    let trimmed = prefix.trim_end();
    if trimmed.ends_with("function") || trimmed.ends_with('*') || trimmed.ends_with('.') {
        return false;
    }

    let mut open: Vec<usize> = Vec::new();
    let mut last_semicolon = None;
    for (idx, c) in prefix.char_indices() {
        match c {
            '{' => open.push(idx),
            '}' => {
                open.pop();
            }
            ';' => last_semicolon = Some(idx),
            _ => {}
        }
    }
    match (open.last(), last_semicolon) {
        (Some(&brace), Some(semicolon)) => brace > semicolon,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_with<E: FactExtractor>(extractor: E, source: &str) -> Option<E::Facts> {
        extractor.extract(source)
    }

    #[test]
    fn pattern_parser_extracts_through_trait() {
        let code = "const rate = 2; window.onload = init;";
        let facts = extract_with(JsPatternParser, code).unwrap();
        assert_eq!(facts, parse_javascript(code));
        assert_eq!(facts.events["window.onload"].value, "init");
        assert_eq!(extract_with(JsPatternParser, ""), Some(ParsedCode::default()));
    }

    #[test]
    fn strips_comments_and_whitespace() {
        let code = "// header\nlet a = 1; /* block\n comment */\n\n  const b = 2;";
        assert_eq!(normalize_source(code), "let a = 1; const b = 2;");
    }

    #[test]
    fn extracts_variables() {
        let parsed = parse_javascript("let count = 0;\nconst name = 'Ada';\nvar flag;");
        assert_eq!(parsed.variables["count"].declaration, Declaration::Let);
        assert_eq!(parsed.variables["count"].value.as_deref(), Some("0"));
        assert_eq!(parsed.variables["name"].value.as_deref(), Some("'Ada'"));
        assert_eq!(parsed.variables["flag"].value, None);
    }

    #[test]
    fn classifies_function_kinds() {
        let code = r#"
            function add(a, b) { return a + b; }
            async function load(url) { return url; }
            const double = x => x * 2;
            const fetchAll = async (a, b = 2) => { return a; };
            function Person(name) { this.name = name; }
        "#;
        let parsed = parse_javascript(code);
        assert_eq!(parsed.functions["add"].func_type, FuncType::Function);
        assert_eq!(parsed.functions["add"].parameters, vec!["a", "b"]);
        assert_eq!(parsed.functions["load"].func_type, FuncType::Async);
        assert_eq!(parsed.functions["double"].func_type, FuncType::Arrow);
        assert_eq!(parsed.functions["double"].parameters, vec!["x"]);
        assert_eq!(parsed.functions["fetchAll"].func_type, FuncType::AsyncArrow);
        assert_eq!(parsed.functions["fetchAll"].parameters, vec!["a", "b"]);
        assert_eq!(parsed.functions["Person"].func_type, FuncType::Constructor);
    }

    #[test]
    fn detects_object_and_class_methods() {
        let code = r#"
            const calc = {
                total: 0,
                add(n) { this.total += n; return this; },
                reset() { this.total = 0; }
            };
            class Counter {
                constructor(start) { this.n = start; }
                inc(step) { this.n += step; }
            }
            if (ready) { go(); }
        "#;
        let parsed = parse_javascript(code);
        assert_eq!(parsed.functions["add"].func_type, FuncType::Method);
        assert_eq!(parsed.functions["add"].parameters, vec!["n"]);
        assert_eq!(parsed.functions["constructor"].func_type, FuncType::Method);
        assert!(!parsed.functions.contains_key("if"));
        assert!(!parsed.functions.contains_key("go"));
    }

    #[test]
    fn semicolon_in_earlier_method_hides_later_method() {
        let parsed =
            parse_javascript("const calc = { add(n) { this.t += n; }, reset() { this.t = 0; } };");
        assert_eq!(parsed.functions["add"].func_type, FuncType::Method);
        assert!(!parsed.functions.contains_key("reset"));

        let parsed = parse_javascript(
            "class Counter { constructor(s) { this.n = s; } inc(step) { this.n += step; } }",
        );
        assert!(parsed.functions.contains_key("constructor"));
        assert!(!parsed.functions.contains_key("inc"));
    }

    #[test]
    fn method_after_semicolon_free_sibling_is_detected() {
        let parsed = parse_javascript("const o = { a() { return }, b(x) { } };");
        assert_eq!(parsed.functions["a"].func_type, FuncType::Method);
        assert_eq!(parsed.functions["b"].func_type, FuncType::Method);
        assert_eq!(parsed.functions["b"].parameters, vec!["x"]);
    }

    #[test]
    fn nested_function_declaration_is_not_a_method() {
        let code = "const o = { run() { function helper(a) { return a; } } };";
        let parsed = parse_javascript(code);
        assert_eq!(parsed.functions["helper"].func_type, FuncType::Function);
        assert_eq!(parsed.functions["run"].func_type, FuncType::Method);
    }

    #[test]
    fn extracts_event_assignments() {
        let code = r#"
            window.onload = init;
            button.onclick = function () { count++; };
            if (el.onclick == null) {}
        "#;
        let parsed = parse_javascript(code);
        assert_eq!(parsed.events["window.onload"].value, "init");
        assert_eq!(parsed.events["onclick"].value, "function () { count++");
        assert_eq!(parsed.events.len(), 2);
    }

    #[test]
    fn later_declaration_wins() {
        let parsed = parse_javascript("let x = 1; let x = 2;");
        assert_eq!(parsed.variables["x"].value.as_deref(), Some("2"));
    }

    #[test]
    fn later_initialised_declaration_replaces_bare_one() {
        let parsed = parse_javascript("var total; function reset() { total = 0; } var total = 5;");
        let total = &parsed.variables["total"];
        assert_eq!(total.declaration, Declaration::Var);
        assert_eq!(total.value.as_deref(), Some("5"));
        assert!(total.order > 0);

        let parsed = parse_javascript("let count = 1; let count;");
        assert_eq!(parsed.variables["count"].value, None);
    }

    #[test]
    fn constructor_overwrites_plain_function_entry() {
        let parsed = parse_javascript("function Shape(a) { this.a = a; }");
        let shape = &parsed.functions["Shape"];
        assert_eq!(shape.func_type, FuncType::Constructor);
        assert_eq!(shape.parameters, vec!["a"]);
        assert_eq!(parsed.functions.len(), 1);
    }

    #[test]
    fn patterns_inside_strings_are_detected() {
        let parsed = parse_javascript(r#"const msg = "function fake(a) { }";"#);
        assert!(parsed.functions.contains_key("fake"));
    }

    #[test]
    fn empty_source_is_empty_snapshot() {
        assert!(parse_javascript("").is_empty());
        assert!(parse_javascript("}{ )(").is_empty());
    }
}
