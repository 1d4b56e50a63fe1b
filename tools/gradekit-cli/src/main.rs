//! Command-line harness for GradeKit.
//!
//! Provides commands for:
//! - Grading an exercise directory against a question payload
//! - Assembling the single-document preview of an exercise
//! - Dumping the facts the JavaScript and CSS parsers extract
//!
//! ## Usage
//!
//! ```bash
//! # Grade the files in ./exercise
//! gradekit check --question question.json --dir exercise/
//!
//! # Machine-readable report
//! gradekit check --question question.json --dir exercise/ --json
//!
//! # Write the preview document
//! gradekit preview --dir exercise/ --output preview.html
//!
//! # Inspect what the parsers see
//! gradekit inspect-js exercise/app.js
//! gradekit inspect-css exercise/styles.css
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gradekit_common::{init_logging, FactExtractor, LogConfig, LogFormat};
use gradekit_core::{Grader, GraderConfig, Question};
use gradekit_css::CssRuleParser;
use gradekit_js::JsPatternParser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

mod files;
mod report;

#[derive(Parser)]
#[command(name = "gradekit")]
#[command(about = "Grade and preview HTML/CSS/JavaScript exercises")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format: pretty, compact or json
    #[arg(long, default_value = "compact", global = true)]
    log_format: LogFormat,

    /// Tracing filter directives, e.g. "gradekit_js=trace"
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade an exercise directory against a question
    Check {
        /// Question payload (JSON)
        #[arg(short, long)]
        question: PathBuf,
        /// Directory holding the exercise files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Grader configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assemble the exercise into one preview document
    Preview {
        /// Directory holding the exercise files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the variables, functions and events found in a script
    InspectJs {
        /// JavaScript file
        file: PathBuf,
    },

    /// Print the selector map parsed from a stylesheet
    InspectCss {
        /// CSS file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format);
    if let Some(filter) = cli.log_filter {
        log_config = log_config.with_filter(filter);
    }
    init_logging(log_config).context("failed to initialise logging")?;

    match cli.command {
        Commands::Check {
            question,
            dir,
            config,
            json,
        } => {
            let all_passed = check(&question, &dir, config.as_deref(), json).await?;
            if !all_passed {
                std::process::exit(1);
            }
        }

        Commands::Preview { dir, output } => preview(&dir, output.as_deref())?,

        Commands::InspectJs { file } => println!("{}", inspect(&JsPatternParser, &file)?),

        Commands::InspectCss { file } => println!("{}", inspect(&CssRuleParser, &file)?),
    }

    Ok(())
}

/// Grade and print; returns whether every requirement passed.
async fn check(question: &Path, dir: &Path, config: Option<&Path>, json: bool) -> Result<bool> {
    let question = Question::load(question)
        .with_context(|| format!("failed to load question {}", question.display()))?;
    let config = match config {
        Some(path) => GraderConfig::load(path)?,
        None => GraderConfig::default(),
    };
    let files = files::load_exercise(dir)?;
    debug!(files = files.len(), dir = %dir.display(), "Loaded exercise files");

    let report = Grader::new(config).grade_exercise(&files, &question).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render(question.title.as_deref(), &report));
    }
    Ok(report.all_passed())
}

fn preview(dir: &Path, output: Option<&Path>) -> Result<()> {
    let files = files::load_exercise(dir)?;
    let html = gradekit_preview::generate_html_preview(&files);
    if html.is_empty() {
        bail!("no HTML document to preview in {}", dir.display());
    }

    match output {
        Some(path) => {
            std::fs::write(path, &html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Preview written to: {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

/// Facts an extractor pulls from `path`, as pretty JSON.
fn inspect<E>(extractor: &E, path: &Path) -> Result<String>
where
    E: FactExtractor,
    E::Facts: Serialize,
{
    let source = read_source(path)?;
    let Some(facts) = extractor.extract(&source) else {
        bail!("{} could not be parsed", path.display());
    };
    Ok(serde_json::to_string_pretty(&facts)?)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
