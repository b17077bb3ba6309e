use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// An input file (roster, reference table or config) is missing or unreadable.
    #[error("cannot read {}: {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    #[error("missing columns in {}: {}", path.display(), missing.join(", "))]
    Validation { path: PathBuf, missing: Vec<String> },

    #[error("{0}")]
    NotFound(String),

    #[error("failed to write {}: {reason}", path.display())]
    Export { path: PathBuf, reason: String },
}

impl ReportError {
    pub fn configuration(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ReportError::Configuration { path: path.into(), reason: reason.to_string() }
    }

    pub fn export(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ReportError::Export { path: path.into(), reason: reason.to_string() }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
