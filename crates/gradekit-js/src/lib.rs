//! # GradeKit JS
//!
//! JavaScript track of the exercise validator.
//!
//! ## Components
//!
//! - [`parser`]: pattern-based extraction of variables, functions and event handlers
//! - [`runtime`]: Boa-backed sandbox with a mocked DOM, console and timers
//! - [`runner`]: executes learner functions against declarative test cases
//! - [`validate`]: element checks and per-function grouping of test results
//!
//! ## Features
//!
//! - `boa` (default): evaluate learner code with the Boa engine. Without it the
//!   static checks still work and every dynamic test reports an execution error.

pub mod element;
pub mod harness;
pub mod parser;
pub mod runner;
pub mod runtime;
pub mod validate;

pub use element::{
    Declaration, DomChange, ElementKind, EventElement, FuncType, FunctionElement, JsElement,
    Parameter, TestCase, TestType, VariableElement,
};
pub use harness::{ElementSnapshot, HarnessReport, HarnessStatus, RecordedChange};
pub use parser::{
    normalize_source, parse_javascript, EventInfo, FunctionInfo, JsPatternParser, ParsedCode,
    VariableInfo,
};
pub use runner::{
    execute_dom_test, execute_function_test, validate_function_test_case, TestCaseOutcome,
    TestRunner,
};
pub use runtime::{JsError, JsValue, Sandbox, SandboxConfig};
pub use validate::{
    validate_event, validate_function, validate_js_test_cases, validate_variable, ElementOutcome,
};
