//! Error types for trial data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort reading a whole input file or directory.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV header could not be parsed.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// No column identifies the patient.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// The input directory holds no data files.
    #[error("no input CSV files found in {path}")]
    NoInputFiles { path: PathBuf },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowErrorKind {
    /// Field count differs from the header.
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: u64, found: u64 },

    /// The patient id cell is blank.
    #[error("patient id is empty")]
    EmptyPatientId,

    /// Long layout row without a variable name.
    #[error("variable name is empty")]
    EmptyVariable,

    /// Any other CSV decoding failure (bad quoting, invalid UTF-8).
    #[error("{0}")]
    Malformed(String),
}

/// A row that could not be turned into a record. Reading continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_file}:{line}: {kind}")]
pub struct RowParseError {
    pub source_file: String,
    pub line: u64,
    pub kind: RowErrorKind,
}

impl RowParseError {
    pub fn new(source_file: impl Into<String>, line: u64, kind: RowErrorKind) -> Self {
        Self {
            source_file: source_file.into(),
            line,
            kind,
        }
    }
}
