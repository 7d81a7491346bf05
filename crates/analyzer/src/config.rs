//! Run configuration, optionally loaded from a `garnet.toml` next to
//! the code being checked and overridable by the command line.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::analyses::AnalysisKind;

pub const CONFIG_FILE_NAME: &str = "garnet.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Analyses to run, in registration order.
    pub analyses: Vec<AnalysisKind>,
    /// 0 means one worker per logical CPU.
    pub worker_threads: usize,
    /// Files above this many bytes are skipped.
    pub max_file_size: u64,
    pub respect_gitignore: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analyses: AnalysisKind::all().collect(),
            worker_threads: 0,
            max_file_size: 5_000_000,
            respect_gitignore: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let defaults = Self::default();
        let section = file.analysis;
        Ok(Self {
            analyses: section.enabled.unwrap_or(defaults.analyses),
            worker_threads: section.threads.unwrap_or(defaults.worker_threads),
            max_file_size: section.max_file_size.unwrap_or(defaults.max_file_size),
            respect_gitignore: section
                .respect_gitignore
                .unwrap_or(defaults.respect_gitignore),
        })
    }

    /// Loads the configuration file in `root` if there is one.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn effective_threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    analysis: AnalysisSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalysisSection {
    enabled: Option<Vec<AnalysisKind>>,
    threads: Option<usize>,
    max_file_size: Option<u64>,
    respect_gitignore: Option<bool>,
}
