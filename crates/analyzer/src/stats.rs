//! Aggregate totals for a whole analysis run.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::report::{Diagnostic, Severity};

/// Totals the runner accumulates across every file it touches.
///
/// A failed file counts toward `errors` as well, so a run is clean
/// exactly when `errors` is zero.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files_analyzed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub duration_seconds: f64,
}

impl RunSummary {
    pub fn add_analyzed(&mut self, diagnostics: &[Diagnostic]) {
        self.files_analyzed += 1;
        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => self.errors += 1,
                Severity::Warning => self.warnings += 1,
                Severity::Info => {}
            }
        }
    }

    pub fn add_skipped(&mut self) {
        self.files_skipped += 1;
    }

    pub fn add_failed(&mut self) {
        self.files_failed += 1;
        self.errors += 1;
    }

    pub fn finish(&mut self, duration: Duration) {
        self.duration_seconds = duration.as_secs_f64();
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked {} files in {:.2}s: {} errors, {} warnings",
            self.files_analyzed + self.files_failed,
            self.duration_seconds,
            self.errors,
            self.warnings,
        )?;
        if self.files_skipped > 0 {
            write!(f, " ({} skipped)", self.files_skipped)?;
        }
        Ok(())
    }
}
