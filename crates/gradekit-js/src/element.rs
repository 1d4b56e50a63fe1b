//! JavaScript element requirements and their test cases.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declaration keyword of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Declaration {
    Let,
    Const,
    Var,
}

impl Declaration {
    pub fn keyword(&self) -> &'static str {
        match self {
            Declaration::Let => "let",
            Declaration::Const => "const",
            Declaration::Var => "var",
        }
    }

    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "let" => Some(Declaration::Let),
            "const" => Some(Declaration::Const),
            "var" => Some(Declaration::Var),
            _ => None,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How a function was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FuncType {
    Function,
    Async,
    Arrow,
    AsyncArrow,
    Method,
    Constructor,
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FuncType::Function => "function",
            FuncType::Async => "async",
            FuncType::Arrow => "arrow",
            FuncType::AsyncArrow => "asyncArrow",
            FuncType::Method => "method",
            FuncType::Constructor => "constructor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableElement {
    pub name: String,
    pub declaration: Declaration,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionElement {
    pub name: String,
    #[serde(default)]
    pub func_type: Option<FuncType>,
    #[serde(default)]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl FunctionElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            func_type: None,
            parameters: None,
            test_cases: Vec::new(),
        }
    }

    pub fn with_type(mut self, func_type: FuncType) -> Self {
        self.func_type = Some(func_type);
        self
    }

    pub fn with_parameters(mut self, names: &[&str]) -> Self {
        self.parameters = Some(
            names
                .iter()
                .map(|name| Parameter {
                    name: name.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn with_test_case(mut self, test_case: TestCase) -> Self {
        self.test_cases.push(test_case);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventElement {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// A JavaScript requirement, tagged by `type` in question payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsElement {
    Variable(VariableElement),
    Function(FunctionElement),
    Event(EventElement),
}

impl JsElement {
    pub fn name(&self) -> &str {
        match self {
            JsElement::Variable(v) => &v.name,
            JsElement::Function(f) => &f.name,
            JsElement::Event(e) => &e.name,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            JsElement::Variable(_) => ElementKind::Variable,
            JsElement::Function(_) => ElementKind::Function,
            JsElement::Event(_) => ElementKind::Event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Variable,
    Function,
    Event,
}

impl ElementKind {
    /// Capitalized name used in messages, e.g. `Function 'add' not found`.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Variable => "Variable",
            ElementKind::Function => "Function",
            ElementKind::Event => "Event",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestType {
    Return,
    DomManipulation,
    SideEffect,
}

/// An expected final property value on a mock DOM element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomChange {
    pub element_id: String,
    pub property: String,
    pub expected_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub description: String,
    pub test_type: TestType,
    /// Positional arguments; a non-array value is passed as the single argument.
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub expected_output: Option<Value>,
    #[serde(default, rename = "expectedDOMChanges")]
    pub expected_dom_changes: Vec<DomChange>,
}

impl TestCase {
    pub fn returns(description: impl Into<String>, input: Vec<Value>, expected: Value) -> Self {
        Self {
            description: description.into(),
            test_type: TestType::Return,
            input: Some(Value::Array(input)),
            expected_output: Some(expected),
            expected_dom_changes: Vec::new(),
        }
    }

    pub fn dom(description: impl Into<String>, input: Vec<Value>, changes: Vec<DomChange>) -> Self {
        Self {
            description: description.into(),
            test_type: TestType::DomManipulation,
            input: Some(Value::Array(input)),
            expected_output: None,
            expected_dom_changes: changes,
        }
    }

    /// The arguments to spread into the call.
    pub fn arguments(&self) -> Vec<Value> {
        match &self.input {
            None => Vec::new(),
            Some(Value::Array(values)) => values.clone(),
            Some(single) => vec![single.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tagged_elements() {
        let payload = json!([
            {"type": "variable", "name": "count", "declaration": "let", "value": "0"},
            {"type": "function", "name": "add", "funcType": "asyncArrow",
             "parameters": [{"name": "a"}, {"name": "b"}],
             "testCases": [{"description": "adds", "testType": "return",
                            "input": [1, 2], "expectedOutput": 3}]},
            {"type": "event", "name": "window.onload"}
        ]);
        let elements: Vec<JsElement> = serde_json::from_value(payload).unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].kind(), ElementKind::Variable);
        match &elements[1] {
            JsElement::Function(f) => {
                assert_eq!(f.func_type, Some(FuncType::AsyncArrow));
                assert_eq!(f.test_cases[0].arguments(), vec![json!(1), json!(2)]);
            }
            other => panic!("unexpected element {:?}", other),
        }
        assert_eq!(elements[2].name(), "window.onload");
    }

    #[test]
    fn decodes_dom_changes() {
        let payload = json!({
            "description": "sets text", "testType": "domManipulation",
            "expectedDOMChanges": [{"elementId": "out", "property": "textContent", "expectedValue": "hi"}]
        });
        let case: TestCase = serde_json::from_value(payload).unwrap();
        assert_eq!(case.test_type, TestType::DomManipulation);
        assert_eq!(case.expected_dom_changes[0].element_id, "out");
        assert!(case.arguments().is_empty());
    }

    #[test]
    fn scalar_input_is_single_argument() {
        let case: TestCase =
            serde_json::from_value(json!({"testType": "return", "input": 4})).unwrap();
        assert_eq!(case.arguments(), vec![json!(4)]);
    }
}
