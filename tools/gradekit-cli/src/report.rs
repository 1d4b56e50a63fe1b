//! Plain-text rendering of grading reports.

use gradekit_core::ExerciseReport;
use std::fmt::Write;

/// Render `report` the way `gradekit check` prints it.
pub fn render(title: Option<&str>, report: &ExerciseReport) -> String {
    let mut out = String::new();
    if let Some(title) = title {
        let _ = writeln!(out, "{}", title);
    }

    for file in &report.files {
        let _ = writeln!(
            out,
            "{} ({}/{} passed)",
            file.file, file.passed_count, file.total_count
        );

        if let Some(document) = file.document.as_ref().filter(|d| !d.is_valid) {
            for missing in &document.missing_elements {
                let _ = writeln!(out, "  ! missing {}", missing);
            }
            for error in &document.structure_errors {
                let _ = writeln!(out, "  ! {}", error);
            }
        }

        for result in &file.results {
            let mark = if result.passed { "PASS" } else { "FAIL" };
            match &result.message {
                Some(message) => {
                    let _ = writeln!(out, "  [{}] {}: {}", mark, result.requirement, message);
                }
                None => {
                    let _ = writeln!(out, "  [{}] {}", mark, result.requirement);
                }
            }
            for test in result.test_results.iter().filter(|t| !t.passed) {
                let _ = writeln!(out, "         {}", test.message);
            }
        }
    }

    let _ = writeln!(
        out,
        "Score: {}/{} ({:.0}%)",
        report.passed_count, report.total_count, report.success_rate
    );
    out
}
