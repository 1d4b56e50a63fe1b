//! Dynamic test runner: executes learner functions against test cases.

use gradekit_common::CheckResult;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::element::{DomChange, FunctionElement, TestCase, TestType};
use crate::harness::{HarnessReport, HarnessStatus};
use crate::runtime::{JsError, Sandbox, SandboxConfig};

/// Result of one test case of a function element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCaseOutcome {
    pub description: String,
    pub passed: bool,
    pub message: String,
}

impl TestCaseOutcome {
    fn new(description: &str, result: CheckResult) -> Self {
        Self {
            description: description.to_string(),
            passed: result.passed,
            message: result.message,
        }
    }
}

/// Runs test cases, one fresh sandbox per case.
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    config: SandboxConfig,
}

impl TestRunner {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Dispatch on the test type. Side-effect tests document intent only and
    /// always pass without executing anything.
    pub fn validate_function_test_case(
        &self,
        element: &FunctionElement,
        test_case: &TestCase,
        code: &str,
    ) -> TestCaseOutcome {
        let result = match test_case.test_type {
            TestType::Return => self.execute_function_test(&element.name, test_case, code),
            TestType::DomManipulation => self.execute_dom_test(&element.name, test_case, code),
            TestType::SideEffect => CheckResult::pass(format!(
                "Side effect test passed: {}",
                test_case.description
            )),
        };
        if !result.passed {
            debug!(
                function = %element.name,
                test = %test_case.description,
                message = %result.message,
                "Test case failed"
            );
        }
        TestCaseOutcome::new(&test_case.description, result)
    }

    /// Call the function and compare its return value with `expectedOutput`.
    pub fn execute_function_test(&self, name: &str, test_case: &TestCase, code: &str) -> CheckResult {
        let report = match self.run(name, test_case, code) {
            Ok(report) => report,
            Err(result) => return result,
        };

        let expected = test_case.expected_output.clone().unwrap_or(Value::Null);
        let actual = &report.value;
        if values_equal(&normalize(actual), &normalize(&expected)) {
            CheckResult::pass(format!("Test passed: {}", test_case.description))
        } else {
            CheckResult::fail(format!(
                "Test failed: {}. Expected {} but got {}",
                test_case.description,
                display(&expected, false),
                display(actual, report.is_undefined)
            ))
        }
    }

    /// Call the function and check the final mock DOM state.
    pub fn execute_dom_test(&self, name: &str, test_case: &TestCase, code: &str) -> CheckResult {
        let report = match self.run(name, test_case, code) {
            Ok(report) => report,
            Err(result) => return result,
        };

        let errors: Vec<String> = test_case
            .expected_dom_changes
            .iter()
            .filter_map(|change| dom_change_error(&report, change))
            .collect();

        if errors.is_empty() {
            CheckResult::pass(format!("DOM test passed: {}", test_case.description))
        } else {
            CheckResult::fail(format!(
                "DOM test failed: {}. {}",
                test_case.description,
                errors.join("; ")
            ))
        }
    }

    /// Invoke in a fresh sandbox; failures come back as ready-made results.
    fn run(&self, name: &str, test_case: &TestCase, code: &str) -> Result<HarnessReport, CheckResult> {
        let report = Sandbox::with_config(&self.config)
            .and_then(|mut sandbox| sandbox.invoke(code, name, &test_case.arguments()))
            .map_err(|err| {
                warn!(function = name, %err, "Sandbox execution failed");
                execution_failure(&err)
            })?;

        match report.status {
            HarnessStatus::Ok => Ok(report),
            HarnessStatus::Error => Err(CheckResult::execution_error(
                report.message.as_deref().unwrap_or("unknown error"),
            )),
            HarnessStatus::NotCallable => Err(CheckResult::fail(format!(
                "'{}' is not a function (found {})",
                name,
                report.actual_type.as_deref().unwrap_or("undefined")
            ))),
            HarnessStatus::Pending => Err(CheckResult::execution_error(
                "returned promise never settled",
            )),
        }
    }

    /// Run one test case on a blocking worker under the configured deadline.
    ///
    /// The deadline bounds how long the caller waits, not the worker. The
    /// engine has no interrupt hook, so a timed-out worker keeps running until
    /// the loop-iteration or recursion limit stops it or the code returns.
    /// Nested loops that each stay under the per-loop limit can hold the
    /// worker for a long time, and shutting down the tokio runtime waits for
    /// it. Callers running untrusted code should keep `loop_iteration_limit`
    /// low.
    pub async fn run_bounded(
        &self,
        element: &FunctionElement,
        test_case: &TestCase,
        code: &str,
    ) -> TestCaseOutcome {
        let deadline = self.config.timeout();
        let runner = self.clone();
        let task_element = element.clone();
        let task_case = test_case.clone();
        let task_code = code.to_string();

        let task = tokio::task::spawn_blocking(move || {
            runner.validate_function_test_case(&task_element, &task_case, &task_code)
        });

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => TestCaseOutcome::new(
                &test_case.description,
                CheckResult::execution_error(join_err),
            ),
            Err(_) => {
                warn!(function = %element.name, ?deadline, "Test case exceeded deadline");
                TestCaseOutcome::new(
                    &test_case.description,
                    execution_failure(&JsError::Timeout(deadline)),
                )
            }
        }
    }
}

/// Run one test case with default sandbox limits.
pub fn validate_function_test_case(
    element: &FunctionElement,
    test_case: &TestCase,
    code: &str,
) -> TestCaseOutcome {
    TestRunner::default().validate_function_test_case(element, test_case, code)
}

/// Return-value test with default sandbox limits.
pub fn execute_function_test(name: &str, test_case: &TestCase, code: &str) -> CheckResult {
    TestRunner::default().execute_function_test(name, test_case, code)
}

/// DOM test with default sandbox limits.
pub fn execute_dom_test(name: &str, test_case: &TestCase, code: &str) -> CheckResult {
    TestRunner::default().execute_dom_test(name, test_case, code)
}

fn execution_failure(err: &JsError) -> CheckResult {
    match err {
        JsError::TypeError(message) => CheckResult::fail(message.clone()),
        other => CheckResult::execution_error(other),
    }
}

fn dom_change_error(report: &HarnessReport, change: &DomChange) -> Option<String> {
    let Some(element) = report.elements.get(&change.element_id) else {
        return Some(format!("Element '{}' not found", change.element_id));
    };
    let Some(actual) = element.properties.get(&change.property) else {
        return Some(format!(
            "Property '{}' was not set on element '{}'",
            change.property, change.element_id
        ));
    };

    let expected = &change.expected_value;
    let matches = values_equal(&normalize(actual), &normalize(expected))
        || coerce_to_string(actual).replace('\'', "\"")
            == coerce_to_string(expected).replace('\'', "\"");
    if matches {
        None
    } else {
        Some(format!(
            "Element '{}' property '{}': expected {} but got {}",
            change.element_id,
            change.property,
            display(expected, false),
            display(actual, false)
        ))
    }
}

/// Strings get single quotes turned into double quotes, booleans become strings.
fn normalize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace('\'', "\"")),
        Value::Bool(b) => Value::String(b.to_string()),
        other => other.clone(),
    }
}

/// Structural equality with numbers compared by value (`5` equals `5.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(key, x)| ym.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// The string JavaScript's `String(value)` would produce for simple values.
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn display(value: &Value, is_undefined: bool) -> String {
    if is_undefined {
        "undefined".to_string()
    } else {
        value.to_string()
    }
}
