//! Element validators and per-element result grouping.

use gradekit_common::CheckResult;
use serde::Serialize;
use tracing::{debug, trace};

use crate::element::{ElementKind, EventElement, FunctionElement, JsElement, VariableElement};
use crate::parser::{parse_javascript, ParsedCode};
use crate::runner::{TestCaseOutcome, TestRunner};

/// One entry of a JS validation run, positionally aligned with the input elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementOutcome {
    /// Variables, events, and functions without test cases.
    #[serde(rename_all = "camelCase")]
    Single {
        name: String,
        element_type: ElementKind,
        passed: bool,
        message: String,
    },
    /// A function's test cases, passed only when every case passed.
    #[serde(rename_all = "camelCase")]
    Grouped {
        name: String,
        passed: bool,
        passed_count: usize,
        total_count: usize,
        test_results: Vec<TestCaseOutcome>,
    },
}

impl ElementOutcome {
    fn single(element: &JsElement, result: CheckResult) -> Self {
        ElementOutcome::Single {
            name: element.name().to_string(),
            element_type: element.kind(),
            passed: result.passed,
            message: result.message,
        }
    }

    fn grouped(name: &str, test_results: Vec<TestCaseOutcome>) -> Self {
        let passed_count = test_results.iter().filter(|r| r.passed).count();
        let total_count = test_results.len();
        ElementOutcome::Grouped {
            name: name.to_string(),
            passed: passed_count == total_count,
            passed_count,
            total_count,
            test_results,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ElementOutcome::Single { name, .. } | ElementOutcome::Grouped { name, .. } => name,
        }
    }

    pub fn passed(&self) -> bool {
        match self {
            ElementOutcome::Single { passed, .. } | ElementOutcome::Grouped { passed, .. } => *passed,
        }
    }
}

/// Check a variable's declaration keyword and, when given, its initial value.
///
/// Values compare after trimming with single quotes read as double quotes, so
/// `'hello'` and `"hello"` are the same value.
pub fn validate_variable(parsed: &ParsedCode, element: &VariableElement) -> CheckResult {
    let Some(found) = parsed.variables.get(&element.name) else {
        return CheckResult::not_found(ElementKind::Variable.label(), &element.name);
    };

    if found.declaration != element.declaration {
        return CheckResult::fail(format!(
            "Variable '{}' should be declared with '{}' but uses '{}'",
            element.name, element.declaration, found.declaration
        ));
    }

    if let Some(expected) = &element.value {
        let actual = found.value.as_deref().unwrap_or_default();
        if normalize_quotes(actual) != normalize_quotes(expected) {
            return CheckResult::fail(format!(
                "Variable '{}' should have value {} but has {}",
                element.name,
                expected.trim(),
                found.value.as_deref().map(str::trim).unwrap_or("no value")
            ));
        }
    }

    CheckResult::pass(format!("Variable '{}' is correctly declared", element.name))
}

/// Check a function's shape: how it was written and its parameter names.
pub fn validate_function(parsed: &ParsedCode, element: &FunctionElement) -> CheckResult {
    let Some(found) = parsed.functions.get(&element.name) else {
        return CheckResult::not_found(ElementKind::Function.label(), &element.name);
    };

    if let Some(expected) = element.func_type {
        if found.func_type != expected {
            return CheckResult::fail(format!(
                "Function '{}' should be of type '{}' but is '{}'",
                element.name, expected, found.func_type
            ));
        }
    }

    if let Some(parameters) = &element.parameters {
        let expected: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        let actual: Vec<&str> = found.parameters.iter().map(String::as_str).collect();
        if expected != actual {
            return CheckResult::fail(format!(
                "Function '{}' should take parameters ({}) but takes ({})",
                element.name,
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    CheckResult::pass(format!("Function '{}' is correctly defined", element.name))
}

/// Check an event handler assignment; the expected value must appear in the
/// assigned expression, whitespace ignored.
pub fn validate_event(parsed: &ParsedCode, element: &EventElement) -> CheckResult {
    let Some(found) = parsed.events.get(&element.name) else {
        return CheckResult::not_found(ElementKind::Event.label(), &element.name);
    };

    if let Some(expected) = &element.value {
        let expected = strip_whitespace(&normalize_quotes(expected));
        let actual = strip_whitespace(&normalize_quotes(&found.value));
        if !actual.contains(&expected) {
            return CheckResult::fail(format!(
                "Event '{}' should be assigned {} but is assigned {}",
                element.name,
                element.value.as_deref().unwrap_or_default().trim(),
                found.value.trim()
            ));
        }
    }

    CheckResult::pass(format!("Event '{}' is correctly assigned", element.name))
}

impl TestRunner {
    /// Validate every element against `code`, one outcome per element in input order.
    pub fn validate_elements(&self, code: &str, elements: &[JsElement]) -> Vec<ElementOutcome> {
        let parsed = parse_javascript(code);
        debug!(elements = elements.len(), "Validating JavaScript elements");

        elements
            .iter()
            .map(|element| match element {
                JsElement::Function(function) if !function.test_cases.is_empty() => {
                    let results = function
                        .test_cases
                        .iter()
                        .map(|case| self.validate_function_test_case(function, case, code))
                        .collect();
                    ElementOutcome::grouped(&function.name, results)
                }
                other => ElementOutcome::single(other, check_structure(&parsed, other)),
            })
            .collect()
    }

    /// Like [`TestRunner::validate_elements`], with every test case bounded by
    /// the configured wall-clock deadline. See [`TestRunner::run_bounded`] for
    /// what happens to a worker that misses it.
    pub async fn validate_elements_bounded(
        &self,
        code: &str,
        elements: &[JsElement],
    ) -> Vec<ElementOutcome> {
        let parsed = parse_javascript(code);
        debug!(elements = elements.len(), "Validating JavaScript elements (bounded)");

        let mut outcomes = Vec::with_capacity(elements.len());
        for element in elements {
            let outcome = match element {
                JsElement::Function(function) if !function.test_cases.is_empty() => {
                    let mut results = Vec::with_capacity(function.test_cases.len());
                    for case in &function.test_cases {
                        results.push(self.run_bounded(function, case, code).await);
                    }
                    ElementOutcome::grouped(&function.name, results)
                }
                other => ElementOutcome::single(other, check_structure(&parsed, other)),
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// Validate `elements` against `code` with default sandbox limits.
pub fn validate_js_test_cases(code: &str, elements: &[JsElement]) -> Vec<ElementOutcome> {
    TestRunner::default().validate_elements(code, elements)
}

fn check_structure(parsed: &ParsedCode, element: &JsElement) -> CheckResult {
    let result = match element {
        JsElement::Variable(variable) => validate_variable(parsed, variable),
        JsElement::Function(function) => validate_function(parsed, function),
        JsElement::Event(event) => validate_event(parsed, event),
    };
    trace!(name = element.name(), passed = result.passed, "Structure check");
    result
}

fn normalize_quotes(value: &str) -> String {
    value.trim().replace('\'', "\"")
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}
