//! Per-file and per-exercise grading.

use gradekit_common::{success_rate, CheckResult, GradeError, Result};
use gradekit_css::{expected_css_description, validate_css};
use gradekit_html::{
    expected_description, validate_basic_html_structure, validate_html_requirement,
    validate_html_requirements, BasicStructureReport,
};
use gradekit_js::{ElementOutcome, TestCaseOutcome, TestRunner};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GraderConfig;
use crate::question::{FileKind, FileRequirements, Question};

/// Verdict on one requirement of a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementOutcome {
    /// What was required, e.g. `<h1>Hello</h1>` or `Function 'add'`
    pub requirement: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub test_results: Vec<TestCaseOutcome>,
}

impl RequirementOutcome {
    fn verdict(requirement: String, passed: bool) -> Self {
        Self {
            requirement,
            passed,
            message: None,
            test_results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file: String,
    pub kind: FileKind,
    /// Document-shape check, HTML files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<BasicStructureReport>,
    pub results: Vec<RequirementOutcome>,
    pub passed_count: usize,
    pub total_count: usize,
    pub success_rate: f64,
}

impl FileReport {
    fn new(
        file: &str,
        kind: FileKind,
        document: Option<BasicStructureReport>,
        results: Vec<RequirementOutcome>,
    ) -> Self {
        let passed_count = results.iter().filter(|r| r.passed).count();
        let total_count = results.len();
        Self {
            file: file.to_string(),
            kind,
            document,
            results,
            passed_count,
            total_count,
            success_rate: success_rate(passed_count, total_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseReport {
    pub files: Vec<FileReport>,
    pub passed_count: usize,
    pub total_count: usize,
    pub success_rate: f64,
}

impl ExerciseReport {
    /// Every requirement of every file passed.
    pub fn all_passed(&self) -> bool {
        self.passed_count == self.total_count
    }
}

/// Grades exercise files against question requirements.
#[derive(Debug, Clone, Default)]
pub struct Grader {
    config: GraderConfig,
    runner: TestRunner,
}

impl Grader {
    pub fn new(config: GraderConfig) -> Self {
        let runner = TestRunner::new(config.sandbox.clone());
        Self { config, runner }
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grade one file, choosing the validator by extension.
    pub async fn grade_file(
        &self,
        name: &str,
        source: &str,
        requirements: &FileRequirements,
    ) -> Result<FileReport> {
        let kind = FileKind::from_file_name(name)
            .ok_or_else(|| GradeError::InvalidArgument(format!("unsupported file type: {}", name)))?;
        debug!(
            file = name,
            ?kind,
            requirements = requirements.count_for(kind),
            "Grading file"
        );

        let report = match kind {
            FileKind::Html => {
                let (document, results) = self.grade_html(source, requirements);
                FileReport::new(name, kind, Some(document), results)
            }
            FileKind::Css => FileReport::new(name, kind, None, grade_css(source, requirements)),
            FileKind::JavaScript => {
                let outcomes = self
                    .runner
                    .validate_elements_bounded(source, &requirements.elements)
                    .await;
                let results = outcomes.into_iter().map(js_outcome).collect();
                FileReport::new(name, kind, None, results)
            }
        };
        Ok(report)
    }

    /// Grade every file the question names, in question order.
    ///
    /// A file missing from `files` fails all of its requirements; files with
    /// an unsupported extension are skipped.
    pub async fn grade_exercise(
        &self,
        files: &IndexMap<String, String>,
        question: &Question,
    ) -> ExerciseReport {
        let mut reports = Vec::with_capacity(question.files.len());

        for (name, requirements) in &question.files {
            let Some(kind) = FileKind::from_file_name(name) else {
                warn!(file = %name, "Skipping requirements for unsupported file type");
                continue;
            };

            let report = match files.get(name) {
                Some(source) => match self.grade_file(name, source, requirements).await {
                    Ok(report) => report,
                    Err(err) => {
                        warn!(file = %name, category = err.category(), %err, "Grading failed");
                        continue;
                    }
                },
                None => {
                    warn!(file = %name, "File named by question is missing");
                    missing_file(name, kind, requirements)
                }
            };
            reports.push(report);
        }

        let passed_count = reports.iter().map(|r| r.passed_count).sum();
        let total_count = reports.iter().map(|r| r.total_count).sum();
        let report = ExerciseReport {
            files: reports,
            passed_count,
            total_count,
            success_rate: success_rate(passed_count, total_count),
        };
        info!(
            passed = report.passed_count,
            total = report.total_count,
            rate = report.success_rate,
            "Exercise graded"
        );
        report
    }

    fn grade_html(
        &self,
        source: &str,
        requirements: &FileRequirements,
    ) -> (BasicStructureReport, Vec<RequirementOutcome>) {
        let reqs = &requirements.structure;
        let document = validate_basic_html_structure(source);
        let verdicts = if self.config.enforce_document_shape {
            validate_html_requirements(source, reqs)
        } else {
            (0..reqs.len())
                .map(|index| validate_html_requirement(source, index, reqs))
                .collect()
        };

        let results = describe(FileKind::Html, requirements)
            .into_iter()
            .zip(verdicts)
            .map(|(requirement, passed)| RequirementOutcome::verdict(requirement, passed))
            .collect();
        (document, results)
    }
}

fn grade_css(source: &str, requirements: &FileRequirements) -> Vec<RequirementOutcome> {
    describe(FileKind::Css, requirements)
        .into_iter()
        .zip(validate_css(source, &requirements.css))
        .map(|(requirement, passed)| RequirementOutcome::verdict(requirement, passed))
        .collect()
}

fn js_outcome(outcome: ElementOutcome) -> RequirementOutcome {
    match outcome {
        ElementOutcome::Single {
            name,
            element_type,
            passed,
            message,
        } => RequirementOutcome {
            requirement: format!("{} '{}'", element_type.label(), name),
            passed,
            message: Some(message),
            test_results: Vec::new(),
        },
        ElementOutcome::Grouped {
            name,
            passed,
            passed_count,
            total_count,
            test_results,
        } => RequirementOutcome {
            requirement: format!("Function '{}'", name),
            passed,
            message: Some(format!("{}/{} tests passed", passed_count, total_count)),
            test_results,
        },
    }
}

fn missing_file(name: &str, kind: FileKind, requirements: &FileRequirements) -> FileReport {
    let failure = CheckResult::not_found("File", name);
    let results = describe(kind, requirements)
        .into_iter()
        .map(|requirement| RequirementOutcome {
            requirement,
            passed: false,
            message: Some(failure.message.clone()),
            test_results: Vec::new(),
        })
        .collect();
    FileReport::new(name, kind, None, results)
}

/// Human-readable form of each requirement that applies to `kind`.
fn describe(kind: FileKind, requirements: &FileRequirements) -> Vec<String> {
    match kind {
        FileKind::Html => requirements.structure.iter().map(expected_description).collect(),
        FileKind::Css => requirements.css.iter().map(expected_css_description).collect(),
        FileKind::JavaScript => requirements
            .elements
            .iter()
            .map(|element| format!("{} '{}'", element.kind().label(), element.name()))
            .collect(),
    }
}
