//! # GradeKit Common
//!
//! Shared pieces used by every GradeKit validator crate.
//!
//! ## Features
//!
//! - Unified error type for the outer surfaces (config, IO, payload decoding)
//! - `CheckResult`, the `{passed, message}` record validators hand back
//! - The `FactExtractor` seam each language parser sits behind
//! - Logging configuration and setup

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for GradeKit.
///
/// Validators never return this across their public contract; it is used by
/// configuration loading, payload decoding and the command-line harness.
#[derive(Error, Debug)]
pub enum GradeError {
    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Question payload or requirement data could not be understood.
    #[error("Payload error: {message}")]
    Payload {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl GradeError {
    /// Create a config error with source.
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a payload error with source.
    pub fn payload_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Payload {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            GradeError::Config { .. } => "config",
            GradeError::Payload { .. } => "payload",
            GradeError::Io(_) => "io",
            GradeError::InvalidArgument(_) => "invalid_argument",
        }
    }
}

/// Result type alias for GradeKit operations.
pub type Result<T> = std::result::Result<T, GradeError>;

/// Outcome of checking one requirement: a verdict plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// A failure for a target that does not exist in the submitted source,
    /// e.g. `Function 'add' not found`.
    pub fn not_found(kind: &str, name: &str) -> Self {
        Self::fail(format!("{} '{}' not found", kind, name))
    }

    /// A failure raised while running learner code.
    pub fn execution_error(message: impl std::fmt::Display) -> Self {
        Self::fail(format!("Execution error: {}", message))
    }
}

/// Turns source text into the structural facts a validator checks.
///
/// Each language sits behind one of these so a stricter parser can replace the
/// pattern-based one without touching call sites.
pub trait FactExtractor {
    /// Facts extracted from one source text.
    type Facts;

    /// Extract facts, or `None` when the text cannot be read at all.
    fn extract(&self, source: &str) -> Option<Self::Facts>;
}

/// Percentage of satisfied requirements, `0.0` when there are none.
pub fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}
