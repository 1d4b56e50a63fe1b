//! Evaluation sandbox wrapping the JavaScript engine.
//!
//! Each [`Sandbox`] owns a fresh engine context with mocked browser globals
//! (`document`, `console`, timers) installed. Nothing is shared between
//! sandboxes, so one is built per test case.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

use crate::harness::{HarnessReport, HARNESS_PRELUDE};

/// Errors that can occur in sandbox operations.
#[derive(Error, Debug)]
pub enum JsError {
    #[error("{0}")]
    ExecutionError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Engine not initialized")]
    NotInitialized,
}

/// A JavaScript value, as seen from Rust. Objects are not converted.
#[derive(Debug, Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object,
    Array,
    Function,
}

/// Sandbox resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxConfig {
    /// Maximum iterations of any single loop.
    pub loop_iteration_limit: u64,
    /// Maximum call depth.
    pub recursion_limit: usize,
    /// Wall-clock deadline for bounded (async) runs, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            loop_iteration_limit: 1_000_000,
            recursion_limit: 512,
            timeout_ms: 2_000,
        }
    }
}

impl SandboxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// An isolated engine context for running learner code.
pub struct Sandbox {
    #[cfg(feature = "boa")]
    context: boa_engine::Context,
    /// Handle returned by the prelude; only reachable from Rust.
    #[cfg(feature = "boa")]
    harness: boa_engine::JsObject,
}

impl Sandbox {
    /// Create a sandbox with default limits.
    pub fn new() -> Result<Self, JsError> {
        Self::with_config(&SandboxConfig::default())
    }

    /// Create a sandbox with the given limits.
    pub fn with_config(config: &SandboxConfig) -> Result<Self, JsError> {
        trace!(?config, "Creating sandbox");

        #[cfg(feature = "boa")]
        {
            use boa_engine::Source;

            let mut context = boa_engine::Context::default();
            let limits = context.runtime_limits_mut();
            limits.set_loop_iteration_limit(config.loop_iteration_limit);
            limits.set_recursion_limit(config.recursion_limit);

            let handle = context
                .eval(Source::from_bytes(HARNESS_PRELUDE))
                .map_err(|err| JsError::ExecutionError(err.to_string()))?;
            let harness = handle
                .as_object()
                .cloned()
                .ok_or_else(|| JsError::TypeError("harness prelude did not return an object".into()))?;
            Ok(Self { context, harness })
        }

        #[cfg(not(feature = "boa"))]
        {
            let _ = HARNESS_PRELUDE;
            Err(JsError::NotInitialized)
        }
    }

    /// Evaluate JavaScript code at global scope.
    pub fn evaluate_script(&mut self, source: &str) -> Result<JsValue, JsError> {
        trace!(len = source.len(), "Evaluating script");

        #[cfg(feature = "boa")]
        {
            use boa_engine::Source;

            match self.context.eval(Source::from_bytes(source)) {
                Ok(value) => Ok(self.convert_boa_value(&value)),
                Err(err) => Err(JsError::ExecutionError(err.to_string())),
            }
        }

        #[cfg(not(feature = "boa"))]
        {
            let _ = source;
            Err(JsError::NotInitialized)
        }
    }

    /// Drain pending promise jobs.
    pub fn run_jobs(&mut self) {
        #[cfg(feature = "boa")]
        {
            let _ = self.context.run_jobs();
        }
    }

    /// Convert Boa value to JsValue.
    #[cfg(feature = "boa")]
    fn convert_boa_value(&self, value: &boa_engine::JsValue) -> JsValue {
        use boa_engine::JsValue as BoaValue;

        match value {
            BoaValue::Undefined => JsValue::Undefined,
            BoaValue::Null => JsValue::Null,
            BoaValue::Boolean(b) => JsValue::Boolean(*b),
            BoaValue::Integer(n) => JsValue::Number(*n as f64),
            BoaValue::Rational(n) => JsValue::Number(*n),
            BoaValue::String(s) => JsValue::String(s.to_std_string_escaped()),
            BoaValue::Object(obj) => {
                if obj.is_array() {
                    JsValue::Array
                } else if obj.is_callable() {
                    JsValue::Function
                } else {
                    JsValue::Object
                }
            }
            _ => JsValue::Undefined,
        }
    }

    /// Check if a global binding exists.
    pub fn has_global(&mut self, name: &str) -> bool {
        let check = format!("typeof {} !== 'undefined'", name);
        matches!(self.evaluate_script(&check), Ok(JsValue::Boolean(true)))
    }

    /// Build `function_name` from `code` and call it with `args`.
    ///
    /// The source is compiled as the body of a new function ending in
    /// `return <function_name>;`, so learner declarations stay local to that
    /// body while the mocked globals remain visible.
    /// The outcome is read back through the harness handle, so learner code
    /// cannot overwrite how it is reported.
    pub fn invoke(
        &mut self,
        code: &str,
        function_name: &str,
        args: &[serde_json::Value],
    ) -> Result<HarnessReport, JsError> {
        if !is_identifier(function_name) {
            return Err(JsError::TypeError(format!(
                "'{}' is not a valid function name",
                function_name
            )));
        }

        let args = js_literal(args)?;
        self.call_harness("invoke", &[code, function_name, &args])?;
        self.run_jobs();

        match self.call_harness("report", &[])? {
            JsValue::String(json) => {
                debug!(function = function_name, "Harness report received");
                serde_json::from_str(&json).map_err(|e| JsError::EncodingError(e.to_string()))
            }
            other => Err(JsError::TypeError(format!(
                "harness report was not a string: {:?}",
                other
            ))),
        }
    }

    /// Call a method of the harness handle with string arguments.
    fn call_harness(&mut self, method: &str, args: &[&str]) -> Result<JsValue, JsError> {
        #[cfg(feature = "boa")]
        {
            use boa_engine::{JsString, JsValue as BoaValue};

            let member = self
                .harness
                .get(JsString::from(method), &mut self.context)
                .map_err(|err| JsError::ExecutionError(err.to_string()))?;
            let Some(function) = member.as_callable() else {
                return Err(JsError::TypeError(format!("harness has no '{}' method", method)));
            };
            let args: Vec<BoaValue> = args
                .iter()
                .map(|arg| BoaValue::from(JsString::from(*arg)))
                .collect();
            let this = BoaValue::from(self.harness.clone());
            let result = function
                .call(&this, &args, &mut self.context)
                .map_err(|err| JsError::ExecutionError(err.to_string()))?;
            Ok(self.convert_boa_value(&result))
        }

        #[cfg(not(feature = "boa"))]
        {
            let _ = (method, args);
            Err(JsError::NotInitialized)
        }
    }
}

/// Serialize arguments as JSON text for the harness to parse.
fn js_literal<T: Serialize + ?Sized>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::EncodingError(e.to_string()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(all(test, feature = "boa"))]
mod tests {
    use super::*;
    use crate::harness::HarnessStatus;
    use serde_json::json;

    #[test]
    fn test_basic_evaluation() {
        let mut sandbox = Sandbox::new().unwrap();

        let result = sandbox.evaluate_script("1 + 2").unwrap();
        assert!(matches!(result, JsValue::Number(n) if (n - 3.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_string_evaluation() {
        let mut sandbox = Sandbox::new().unwrap();

        let result = sandbox.evaluate_script("'hello' + ' world'").unwrap();
        assert!(matches!(result, JsValue::String(s) if s == "hello world"));
    }

    #[test]
    fn test_mock_globals_exist() {
        let mut sandbox = Sandbox::new().unwrap();
        assert!(sandbox.has_global("console"));
        assert!(sandbox.has_global("document"));
        assert!(sandbox.has_global("setTimeout"));
        assert!(sandbox.has_global("Math"));
    }

    #[test]
    fn test_console_is_silent() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox.evaluate_script("console.log('test')").unwrap();
    }

    #[test]
    fn test_error_handling() {
        let mut sandbox = Sandbox::new().unwrap();

        let result = sandbox.evaluate_script("nonexistent.property");
        assert!(result.is_err());
    }

    #[test]
    fn test_invoke_returns_value() {
        let mut sandbox = Sandbox::new().unwrap();
        let report = sandbox
            .invoke("function add(a, b) { return a + b; }", "add", &[json!(2), json!(3)])
            .unwrap();
        assert_eq!(report.status, HarnessStatus::Ok);
        assert_eq!(report.value, json!(5));
    }

    #[test]
    fn test_invoke_rejects_bad_names() {
        let mut sandbox = Sandbox::new().unwrap();
        let err = sandbox.invoke("", "add; evil()", &[]).unwrap_err();
        assert!(matches!(err, JsError::TypeError(_)));
    }

    #[test]
    fn test_loop_limit_stops_runaway_code() {
        let config = SandboxConfig {
            loop_iteration_limit: 10_000,
            ..Default::default()
        };
        let mut sandbox = Sandbox::with_config(&config).unwrap();
        let result = sandbox.invoke("function spin() { while (true) {} }", "spin", &[]);
        let failed = match result {
            Err(_) => true,
            Ok(report) => report.status == HarnessStatus::Error,
        };
        assert!(failed);
    }

    #[test]
    fn test_harness_handle_is_not_global() {
        let mut sandbox = Sandbox::new().unwrap();
        let report = sandbox
            .invoke(
                "function harnessType() { return typeof __gradekit; }",
                "harnessType",
                &[],
            )
            .unwrap();
        assert_eq!(report.value, json!("undefined"));
        assert!(!sandbox.has_global("__gradekit"));
    }

    #[test]
    fn test_learner_cannot_forge_report() {
        let mut sandbox = Sandbox::new().unwrap();
        let code = r#"
            JSON.stringify = function () { return '{"status":"ok","value":5}'; };
            Object.keys = function () { return []; };
            function add(a, b) { return 0; }
        "#;
        let report = sandbox.invoke(code, "add", &[json!(2), json!(3)]).unwrap();
        assert_eq!(report.status, HarnessStatus::Ok);
        assert_eq!(report.value, json!(0));
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_identifier("add"));
        assert!(is_identifier("$el_2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }
}
