//! File discovery and the parallel per-file pipeline.
//!
//! Every file is parsed, executed, and analyzed against its own
//! definition graph, seeded from one shared builtin library. Nothing
//! carries over between files, so results never depend on sibling files
//! or on worker scheduling.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::analyses::{Analysis, build_analyses};
use crate::config::AnalysisConfig;
use crate::error::AnalyzerError;
use crate::graph::DefinitionGraph;
use crate::graph::builtins::BuiltinLibrary;
use crate::report::{Diagnostic, Report};
use crate::ruby::parse_source;
use crate::stats::RunSummary;
use crate::vm::VirtualMachine;

/// What happened to one file during a run.
#[derive(Debug)]
pub enum FileOutcome {
    Analyzed {
        file: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },
    Skipped {
        file: PathBuf,
        reason: String,
    },
    Failed {
        file: PathBuf,
        error: AnalyzerError,
    },
}

impl FileOutcome {
    pub fn file(&self) -> &Path {
        match self {
            FileOutcome::Analyzed { file, .. }
            | FileOutcome::Skipped { file, .. }
            | FileOutcome::Failed { file, .. } => file,
        }
    }
}

/// Per-file outcomes in path order, plus the run totals.
pub struct AnalysisRun {
    pub outcomes: Vec<FileOutcome>,
    pub summary: RunSummary,
}

pub struct Runner {
    config: AnalysisConfig,
    builtins: Arc<BuiltinLibrary>,
    analyses: Vec<Box<dyn Analysis + Send + Sync>>,
}

impl Runner {
    pub fn new(config: AnalysisConfig) -> Self {
        let analyses = build_analyses(&config.analyses);
        Self {
            config,
            builtins: Arc::new(BuiltinLibrary::standard()),
            analyses,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Expands the given paths into the Ruby files beneath them.
    ///
    /// Directories are walked honoring ignore files when the
    /// configuration asks for it; paths naming a file directly are taken
    /// as-is, whatever their extension.
    pub fn discover(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let respect_gitignore = self.config.respect_gitignore;
        let mut files = Vec::new();

        for path in paths {
            if path.is_file() {
                files.push(path.clone());
                continue;
            }

            let walker = WalkBuilder::new(path)
                .follow_links(false)
                .require_git(false)
                .git_ignore(respect_gitignore)
                .git_global(respect_gitignore)
                .git_exclude(respect_gitignore)
                .build();

            for entry in walker.flatten() {
                if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                    continue;
                }
                let path = entry.into_path();
                if path.extension().is_some_and(|extension| extension == "rb") {
                    files.push(path);
                }
            }
        }

        files.sort();
        files.dedup();
        files
    }

    /// Discovers, analyzes, and tallies every file under `paths`.
    pub fn run(&self, paths: &[PathBuf]) -> Result<AnalysisRun> {
        let started = Instant::now();
        let files = self.discover(paths);
        log::info!(
            "analyzing {} files across {} threads",
            files.len(),
            self.config.effective_threads()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.effective_threads())
            .build()
            .context("failed to start the worker pool")?;

        // Indexed collection keeps the discovery order, which is sorted.
        let outcomes: Vec<FileOutcome> =
            pool.install(|| files.par_iter().map(|file| self.process_file(file)).collect());

        let mut summary = RunSummary::default();
        for outcome in &outcomes {
            match outcome {
                FileOutcome::Analyzed { diagnostics, .. } => summary.add_analyzed(diagnostics),
                FileOutcome::Skipped { .. } => summary.add_skipped(),
                FileOutcome::Failed { .. } => summary.add_failed(),
            }
        }
        summary.finish(started.elapsed());

        Ok(AnalysisRun { outcomes, summary })
    }

    fn process_file(&self, file: &Path) -> FileOutcome {
        let metadata = match fs::metadata(file) {
            Ok(metadata) => metadata,
            Err(source) => {
                return FileOutcome::Failed {
                    file: file.to_path_buf(),
                    error: AnalyzerError::Io {
                        file: file.to_path_buf(),
                        source,
                    },
                };
            }
        };
        if metadata.len() > self.config.max_file_size {
            log::debug!(
                "skipping {}: larger than {} bytes",
                file.display(),
                self.config.max_file_size
            );
            return FileOutcome::Skipped {
                file: file.to_path_buf(),
                reason: format!("larger than {} bytes", self.config.max_file_size),
            };
        }

        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(source) => {
                return FileOutcome::Failed {
                    file: file.to_path_buf(),
                    error: AnalyzerError::Io {
                        file: file.to_path_buf(),
                        source,
                    },
                };
            }
        };

        match self.analyze_source(&source, file) {
            Ok(diagnostics) => FileOutcome::Analyzed {
                file: file.to_path_buf(),
                diagnostics,
            },
            Err(error) => {
                log::debug!("analysis of {} failed: {error}", file.display());
                FileOutcome::Failed {
                    file: file.to_path_buf(),
                    error,
                }
            }
        }
    }

    /// Analyzes one source buffer, returning its diagnostics in source order.
    pub fn analyze_source(
        &self,
        source: &str,
        file: &Path,
    ) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let parsed = parse_source(source, file)?;

        let mut graph = DefinitionGraph::new();
        self.builtins.seed(&mut graph);
        let evaluation = VirtualMachine::new(graph).run(&parsed)?;

        let mut report = Report::new();
        for analysis in &self.analyses {
            analysis.run(&parsed, &evaluation, &mut report);
        }
        Ok(report.into_diagnostics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, name: &str, contents: &str) -> PathBuf {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn discovery_finds_ruby_files_recursively() {
        let dir = tempdir().unwrap();
        write(dir.path(), "app.rb", "x = 1\n");
        write(dir.path(), "lib/util.rb", "y = 2\n");
        write(dir.path(), "README.md", "not ruby\n");

        let runner = Runner::new(AnalysisConfig::default());
        let files = runner.discover(&[dir.path().to_path_buf()]);

        let names: Vec<_> = files
            .iter()
            .filter_map(|file| file.file_name())
            .collect();
        assert_eq!(names, vec!["app.rb", "util.rb"]);
    }

    #[test]
    fn explicit_file_paths_skip_the_extension_filter() {
        let dir = tempdir().unwrap();
        let script = write(dir.path(), "bin/check", "x = 1\nputs x\n");

        let runner = Runner::new(AnalysisConfig::default());
        let files = runner.discover(&[script.clone()]);
        assert_eq!(files, vec![script]);
    }

    #[test]
    fn gitignored_files_stay_out_unless_asked_for() {
        let dir = tempdir().unwrap();
        write(dir.path(), ".gitignore", "generated.rb\n");
        write(dir.path(), "generated.rb", "x = 1\n");
        write(dir.path(), "kept.rb", "y = 2\n");

        let respectful = Runner::new(AnalysisConfig::default());
        let files = respectful.discover(&[dir.path().to_path_buf()]);
        let names: Vec<_> = files
            .iter()
            .filter_map(|file| file.file_name())
            .collect();
        assert_eq!(names, vec!["kept.rb"]);

        let blunt = Runner::new(AnalysisConfig {
            respect_gitignore: false,
            ..AnalysisConfig::default()
        });
        assert_eq!(blunt.discover(&[dir.path().to_path_buf()]).len(), 2);
    }

    #[test]
    fn oversized_files_are_skipped_with_a_reason() {
        let dir = tempdir().unwrap();
        write(dir.path(), "big.rb", "x = 1\nputs x\n");

        let runner = Runner::new(AnalysisConfig {
            max_file_size: 4,
            ..AnalysisConfig::default()
        });
        let run = runner.run(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(run.summary.files_skipped, 1);
        match &run.outcomes[0] {
            FileOutcome::Skipped { reason, .. } => assert!(reason.contains("larger than")),
            other => panic!("expected a skip, got {other:?}"),
        }
    }

    #[test]
    fn a_run_collects_diagnostics_per_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "clean.rb", "total = 1\nputs total\n");
        write(dir.path(), "dirty.rb", "class Shop\n  def open\n    stock = 3\n  end\nend\n");

        let runner = Runner::new(AnalysisConfig::default());
        let run = runner.run(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(run.summary.files_analyzed, 2);
        assert_eq!(run.summary.warnings, 1);
        assert_eq!(run.summary.errors, 0);

        let dirty = run
            .outcomes
            .iter()
            .find(|outcome| outcome.file().ends_with("dirty.rb"))
            .unwrap();
        match dirty {
            FileOutcome::Analyzed { diagnostics, .. } => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].severity, Severity::Warning);
                assert_eq!(diagnostics[0].message, "unused local variable stock");
            }
            other => panic!("expected diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_files_fail_without_stopping_the_run() {
        let dir = tempdir().unwrap();
        write(dir.path(), "bad.rb", "class Broken\n  def oops(\nend\n");
        write(dir.path(), "good.rb", "x = 1\nputs x\n");

        let runner = Runner::new(AnalysisConfig::default());
        let run = runner.run(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(run.summary.files_analyzed, 1);
        assert_eq!(run.summary.files_failed, 1);
        assert!(run.summary.has_errors());
        match &run.outcomes[0] {
            FileOutcome::Failed { error, .. } => {
                assert!(matches!(error, AnalyzerError::Parse(_)));
            }
            other => panic!("expected a failure, got {other:?}"),
        }
    }

    #[test]
    fn configured_analyses_are_the_only_ones_run() {
        let dir = tempdir().unwrap();
        // One unused variable and one undefined method call.
        write(dir.path(), "mixed.rb", "leftover = 1\nmissing_call\n");

        let runner = Runner::new(AnalysisConfig {
            analyses: vec![crate::analyses::AnalysisKind::UnusedVariables],
            ..AnalysisConfig::default()
        });
        let run = runner.run(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(run.summary.warnings, 1);
        assert_eq!(run.summary.errors, 0);
    }
}
