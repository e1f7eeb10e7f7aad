use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while turning platform CSV exports into a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// None of the candidate encodings could decode the file.
    #[error("unable to detect file encoding: {path}")]
    Decoding { path: PathBuf },

    /// No line in the file qualified as a CSV header row.
    #[error("no CSV header row found: {path}")]
    HeaderNotFound { path: PathBuf },

    /// A mandatory canonical column could not be resolved from the headers.
    ///
    /// Carries the candidates that were tried and the actual header list so
    /// the operator can extend the column map instead of guessing.
    #[error("required column '{field}' not found (tried {candidates:?}, headers were {headers:?})")]
    MissingColumn {
        field: &'static str,
        candidates: Vec<String>,
        headers: Vec<String>,
    },

    /// A date cell did not match any recognised format.
    ///
    /// Raised per row; the loader drops the row and keeps going.
    #[error("unrecognised date format: {0}")]
    DateFormat(String),

    /// Pass-through for raw I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A JSON document could not be serialised or parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;
