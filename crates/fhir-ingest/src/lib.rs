//! Trial data ingestion.
//!
//! Discovers the CSV exports of an input directory and streams their rows as
//! [`fhir_model::PatientRecord`]s. A row that cannot be parsed is reported as
//! a [`RowParseError`] and reading continues with the next row.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use fhir_ingest::{ReaderOptions, RecordReader, discover_input_files};
//!
//! for file in discover_input_files(Path::new("input"), None)? {
//!     for row in RecordReader::open(&file.path, &ReaderOptions::default())? {
//!         match row {
//!             Ok(record) => println!("{}", record.patient_id),
//!             Err(error) => eprintln!("skipped: {error}"),
//!         }
//!     }
//! }
//! ```

mod csv;
mod discovery;
mod error;

// === Error Types ===
pub use error::{IngestError, Result, RowErrorKind, RowParseError};

// === CSV Reading ===
pub use self::csv::{
    DEFAULT_PATIENT_ID_COLUMN, PATIENT_ID_FALLBACKS, ReaderOptions, RecordLayout, RecordReader,
    find_column, normalize_cell, normalize_header, open_csv_reader, sniff_delimiter,
};

// === File Discovery ===
pub use discovery::{InputFile, discover_input_files, list_csv_files};
