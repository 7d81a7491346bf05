use std::io;
use std::path::{Path, PathBuf};

use analyzer::config::AnalysisConfig;
use analyzer::runner::Runner;
use anyhow::Result;

use crate::cli::OutputFormat;
use crate::output;

/// Runs the configured analyses over `paths`. Returns whether the run
/// finished without errors; the caller turns that into the exit code.
pub fn run(
    paths: &[PathBuf],
    threads: usize,
    format: OutputFormat,
    config_file: Option<&Path>,
) -> Result<bool> {
    let mut config = match config_file {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::discover(Path::new("."))?,
    };
    if threads != 0 {
        config.worker_threads = threads;
    }

    let runner = Runner::new(config);
    let run = runner.run(paths)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => output::render_text(&run, &mut out)?,
        OutputFormat::Json => output::render_json(&run, &mut out)?,
    }

    Ok(!run.summary.has_errors())
}
