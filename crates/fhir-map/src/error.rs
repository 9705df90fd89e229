//! Mapping table load errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the code-mapping table. All are fatal.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("mapping table not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read mapping table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mapping table {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("unsupported mapping table format '{extension}' ({path}); export the sheet as CSV")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("required column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}:{line}: '{column}' is empty")]
    MissingValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
    },

    #[error("{path}:{line}: unknown code system '{value}'")]
    UnknownCodeSystem {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path}:{line}: unknown variable category '{value}'")]
    UnknownCategory {
        path: PathBuf,
        line: u64,
        value: String,
    },
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, LoadError>;
