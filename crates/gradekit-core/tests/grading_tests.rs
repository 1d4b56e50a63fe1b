//! End-to-end grading of small multi-file exercises

use gradekit_core::{FileKind, FileRequirements, Grader, GraderConfig, Question};
use indexmap::IndexMap;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Card</title>
    <link rel="stylesheet" href="styles.css">
</head>
<body>
    <div id="card">
        <h1>Hello</h1>
        <p>Welcome</p>
    </div>
    <script src="app.js"></script>
</body>
</html>"#;

const QUESTION: &str = r#"{
    "title": "Greeting card",
    "files": {
        "index.html": {"structure": [
            {"id": 1, "tag": "div", "attributes": {"id": "card"}},
            {"id": 2, "tag": "h1", "parent": 1, "content": "Hello"},
            {"id": 3, "tag": "p", "parent": 1, "content": "Goodbye"}
        ]},
        "styles.css": {"css": [
            {"selector": "h1", "properties": [{"property": "color", "value": "red"}]},
            {"selector": "p", "properties": [{"property": "margin", "value": "0"}]}
        ]},
        "app.js": {"elements": [
            {"type": "function", "name": "add", "testCases": [
                {"description": "adds", "testType": "return", "input": [2, 3], "expectedOutput": 5}
            ]},
            {"type": "variable", "name": "total", "declaration": "let"}
        ]}
    }
}"#;

fn files(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect()
}

fn exercise_files() -> IndexMap<String, String> {
    files(&[
        ("index.html", INDEX_HTML),
        ("styles.css", "h1 { color: red; }"),
        ("app.js", "function add(a, b) { return a + b; }"),
    ])
}

#[tokio::test(flavor = "multi_thread")]
async fn test_grade_exercise_counts_every_file() {
    let question = Question::from_json(QUESTION).unwrap();
    let report = Grader::default()
        .grade_exercise(&exercise_files(), &question)
        .await;

    assert_eq!(report.files.len(), 3);
    assert_eq!(report.total_count, 7);
    assert_eq!(report.passed_count, 4);
    assert!((report.success_rate - 4.0 / 7.0 * 100.0).abs() < 1e-9);
    assert!(!report.all_passed());

    let html = &report.files[0];
    assert_eq!(html.kind, FileKind::Html);
    assert!(html.document.as_ref().unwrap().is_valid);
    let verdicts: Vec<bool> = html.results.iter().map(|r| r.passed).collect();
    assert_eq!(verdicts, vec![true, true, false]);
    assert_eq!(html.results[1].requirement, "<h1>Hello</h1>");

    let css = &report.files[1];
    assert_eq!(css.results[0].requirement, "h1 { color: red; }");
    assert_eq!((css.passed_count, css.total_count), (1, 2));

    let js = &report.files[2];
    assert!(js.results[0].passed);
    assert_eq!(js.results[0].requirement, "Function 'add'");
    assert_eq!(js.results[0].message.as_deref(), Some("1/1 tests passed"));
    assert_eq!(js.results[0].test_results.len(), 1);
    assert_eq!(js.results[1].message.as_deref(), Some("Variable 'total' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_document_shape_gate_is_configurable() {
    let source = r#"<div id="card"><h1>Hello</h1></div>"#;
    let requirements = FileRequirements {
        structure: Question::from_json(QUESTION).unwrap().files["index.html"].structure[..2].to_vec(),
        ..Default::default()
    };

    let strict = Grader::default()
        .grade_file("index.html", source, &requirements)
        .await
        .unwrap();
    assert_eq!(strict.passed_count, 0);
    let document = strict.document.unwrap();
    assert!(!document.is_valid);
    assert!(document.missing_elements.contains(&"<!DOCTYPE html>".to_string()));

    let lenient = Grader::new(GraderConfig {
        enforce_document_shape: false,
        ..Default::default()
    })
    .grade_file("index.html", source, &requirements)
    .await
    .unwrap();
    assert_eq!(lenient.passed_count, 2);
    assert_eq!(lenient.success_rate, 100.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_file_fails_its_requirements() {
    let question = Question::from_json(QUESTION).unwrap();
    let map = files(&[("index.html", INDEX_HTML), ("styles.css", "h1 { color: red; }")]);
    let report = Grader::default().grade_exercise(&map, &question).await;

    let js = &report.files[2];
    assert_eq!(js.file, "app.js");
    assert_eq!(js.passed_count, 0);
    assert_eq!(js.total_count, 2);
    assert!(js
        .results
        .iter()
        .all(|r| r.message.as_deref() == Some("File 'app.js' not found")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_question_has_zero_success_rate() {
    let report = Grader::default()
        .grade_exercise(&exercise_files(), &Question::default())
        .await;
    assert_eq!(report.total_count, 0);
    assert_eq!(report.success_rate, 0.0);
    assert!(report.files.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsupported_file_type() {
    let err = Grader::default()
        .grade_file("notes.txt", "hello", &FileRequirements::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), "invalid_argument");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_serializes_camel_case() {
    let question = Question::from_json(QUESTION).unwrap();
    let report = Grader::default()
        .grade_exercise(&exercise_files(), &question)
        .await;
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["passedCount"], 4);
    assert_eq!(value["files"][0]["kind"], "html");
    assert_eq!(value["files"][0]["document"]["isValid"], true);
    assert_eq!(value["files"][2]["results"][0]["testResults"][0]["passed"], true);
    assert!(value["files"][1]["results"][0].get("message").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_grading_is_idempotent() {
    let question = Question::from_json(QUESTION).unwrap();
    let grader = Grader::default();
    let first = grader.grade_exercise(&exercise_files(), &question).await;
    let second = grader.grade_exercise(&exercise_files(), &question).await;
    assert_eq!(first, second);
}
