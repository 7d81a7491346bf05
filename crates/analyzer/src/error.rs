use std::path::PathBuf;

use thiserror::Error;

use crate::ruby::ParseError;

/// Errors that abort the analysis of a single file.
///
/// Name resolution failures are never errors at this level; they surface
/// as diagnostics. This type covers files the analyzer cannot process at
/// all: unreadable files, unparseable sources, and trees whose structure
/// violates what the grammar promises.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("unreadable file: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("malformed `{kind}` node at line {line}, column {column}: {reason}")]
    MalformedNode {
        kind: &'static str,
        line: u32,
        column: u32,
        reason: String,
    },
}
