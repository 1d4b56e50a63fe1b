//! # GradeKit Core
//!
//! Ties the language validators together: loads question payloads and grader
//! configuration, grades each exercise file with the matching validator, and
//! computes success rates.
//!
//! ```no_run
//! # async fn run() -> gradekit_common::Result<()> {
//! use gradekit_core::{Grader, GraderConfig, Question};
//! use indexmap::IndexMap;
//!
//! let question = Question::load("question.json")?;
//! let mut files = IndexMap::new();
//! files.insert("index.html".to_string(), std::fs::read_to_string("index.html")?);
//!
//! let report = Grader::new(GraderConfig::default())
//!     .grade_exercise(&files, &question)
//!     .await;
//! println!("{:.0}%", report.success_rate);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod grader;
pub mod question;

pub use config::GraderConfig;
pub use grader::{ExerciseReport, FileReport, Grader, RequirementOutcome};
pub use question::{FileKind, FileRequirements, Question};
