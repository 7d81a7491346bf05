//! Rendering of run results for people and for tooling.
//!
//! Diagnostics carry only positions; this is the layer that pairs them
//! with the file they came from.

use std::io::Write;
use std::path::Path;

use analyzer::report::Diagnostic;
use analyzer::runner::{AnalysisRun, FileOutcome};
use analyzer::stats::RunSummary;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct LocatedDiagnostic<'a> {
    file: &'a Path,
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
}

#[derive(Serialize)]
struct Failure<'a> {
    file: &'a Path,
    error: String,
}

#[derive(Serialize)]
struct Skip<'a> {
    file: &'a Path,
    reason: &'a str,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    diagnostics: Vec<LocatedDiagnostic<'a>>,
    failures: Vec<Failure<'a>>,
    skipped: Vec<Skip<'a>>,
    summary: &'a RunSummary,
}

pub fn render_text(run: &AnalysisRun, out: &mut impl Write) -> Result<()> {
    for outcome in &run.outcomes {
        match outcome {
            FileOutcome::Analyzed { file, diagnostics } => {
                for diagnostic in diagnostics {
                    writeln!(
                        out,
                        "{}:{}:{}: {}: {}",
                        file.display(),
                        diagnostic.line,
                        diagnostic.column,
                        diagnostic.severity,
                        diagnostic.message
                    )?;
                }
            }
            FileOutcome::Skipped { file, reason } => {
                writeln!(out, "{}: skipped: {reason}", file.display())?;
            }
            FileOutcome::Failed { file, error } => {
                writeln!(out, "{}: error: {error}", file.display())?;
            }
        }
    }
    writeln!(out, "{}", run.summary)?;
    Ok(())
}

pub fn render_json(run: &AnalysisRun, out: &mut impl Write) -> Result<()> {
    let mut report = JsonReport {
        diagnostics: Vec::new(),
        failures: Vec::new(),
        skipped: Vec::new(),
        summary: &run.summary,
    };

    for outcome in &run.outcomes {
        match outcome {
            FileOutcome::Analyzed { file, diagnostics } => {
                report
                    .diagnostics
                    .extend(diagnostics.iter().map(|diagnostic| LocatedDiagnostic {
                        file,
                        diagnostic,
                    }));
            }
            FileOutcome::Skipped { file, reason } => {
                report.skipped.push(Skip { file, reason });
            }
            FileOutcome::Failed { file, error } => {
                report.failures.push(Failure {
                    file,
                    error: error.to_string(),
                });
            }
        }
    }

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}
