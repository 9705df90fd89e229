//! Streaming patient records out of delimited trial exports.
//!
//! Two layouts are understood:
//!
//! - **Wide**: one row per patient, one column per source variable
//!   (`SUBJID;AGE;SEX;HB;...`).
//! - **Long**: one row per measurement, with `VARIABLE` and `VALUE` columns
//!   next to the patient id (`SUBJID,VARIABLE,VALUE`).

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use fhir_model::{PatientId, PatientRecord};
use tracing::debug;

use crate::error::{IngestError, Result, RowErrorKind, RowParseError};

use super::header::{find_column, normalize_cell, normalize_header, sniff_delimiter};

/// Patient id column used when none is configured.
pub const DEFAULT_PATIENT_ID_COLUMN: &str = "SUBJID";

/// Columns tried, in order, when the configured id column is absent.
pub const PATIENT_ID_FALLBACKS: [&str; 3] = ["SUBJID", "USUBJID", "PATIENT_ID"];

const VARIABLE_COLUMN: &str = "VARIABLE";
const VALUE_COLUMN: &str = "VALUE";

/// Options for [`RecordReader::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Column holding the subject identifier.
    pub patient_id_column: String,
    /// Field delimiter. Sniffed from the header line when `None`.
    pub delimiter: Option<u8>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            patient_id_column: DEFAULT_PATIENT_ID_COLUMN.to_string(),
            delimiter: None,
        }
    }
}

impl ReaderOptions {
    pub fn with_patient_id_column(mut self, column: impl Into<String>) -> Self {
        self.patient_id_column = column.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// Column layout detected from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    Wide {
        id_index: usize,
    },
    Long {
        id_index: usize,
        variable_index: usize,
        value_index: usize,
    },
}

impl RecordLayout {
    fn detect(headers: &[String], options: &ReaderOptions) -> Option<Self> {
        let mut candidates = vec![options.patient_id_column.as_str()];
        candidates.extend(PATIENT_ID_FALLBACKS);
        let id_index = find_column(headers, &candidates)?;

        let variable_index = find_column(headers, &[VARIABLE_COLUMN]);
        let value_index = find_column(headers, &[VALUE_COLUMN]);
        Some(match (variable_index, value_index) {
            (Some(variable_index), Some(value_index)) => RecordLayout::Long {
                id_index,
                variable_index,
                value_index,
            },
            _ => RecordLayout::Wide { id_index },
        })
    }

    pub fn is_long(&self) -> bool {
        matches!(self, RecordLayout::Long { .. })
    }
}

/// Opens a delimited file with a header row.
///
/// Returns the reader positioned at the first data row and the normalized
/// header names. Rows must match the header's field count.
pub fn open_csv_reader(
    path: &Path,
    delimiter: Option<u8>,
) -> Result<(csv::Reader<File>, Vec<String>)> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let delimiter = match delimiter {
        Some(delimiter) => delimiter,
        None => sniff_delimiter(path)?,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }

    Ok((reader, headers))
}

/// Iterator over the patient records of one input file.
///
/// Rows that cannot be parsed are yielded as [`RowParseError`] and reading
/// continues with the next row. Rows whose cells are all blank are skipped.
pub struct RecordReader {
    path: PathBuf,
    source: String,
    headers: Vec<String>,
    layout: RecordLayout,
    records: StringRecordsIntoIter<File>,
    done: bool,
}

impl RecordReader {
    pub fn open(path: &Path, options: &ReaderOptions) -> Result<Self> {
        let (reader, headers) = open_csv_reader(path, options.delimiter)?;
        let layout =
            RecordLayout::detect(&headers, options).ok_or_else(|| IngestError::MissingColumn {
                column: options.patient_id_column.clone(),
                path: path.to_path_buf(),
            })?;

        let source = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        debug!(
            file = %path.display(),
            columns = headers.len(),
            layout = if layout.is_long() { "long" } else { "wide" },
            "opened input file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            source,
            headers,
            layout,
            records: reader.into_records(),
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used as the record source label.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    fn row_error(&self, line: u64, kind: RowErrorKind) -> RowParseError {
        RowParseError::new(self.source.clone(), line, kind)
    }

    fn parse_row(
        &self,
        record: &StringRecord,
        line: u64,
    ) -> std::result::Result<PatientRecord, RowParseError> {
        let id_index = match self.layout {
            RecordLayout::Wide { id_index } | RecordLayout::Long { id_index, .. } => id_index,
        };
        let raw_id = record.get(id_index).unwrap_or_default();
        let patient_id = PatientId::new(raw_id)
            .map_err(|_| self.row_error(line, RowErrorKind::EmptyPatientId))?;

        let mut patient = PatientRecord::new(patient_id, self.source.clone(), line);
        match self.layout {
            RecordLayout::Wide { id_index } => {
                for (idx, (header, value)) in self.headers.iter().zip(record.iter()).enumerate() {
                    if idx == id_index || header.is_empty() {
                        continue;
                    }
                    patient.push_field(header.clone(), normalize_cell(value));
                }
            }
            RecordLayout::Long {
                variable_index,
                value_index,
                ..
            } => {
                let variable = record.get(variable_index).map(str::trim).unwrap_or_default();
                if variable.is_empty() {
                    return Err(self.row_error(line, RowErrorKind::EmptyVariable));
                }
                let value = record.get(value_index).unwrap_or_default();
                patient.push_field(variable, normalize_cell(value));
            }
        }
        Ok(patient)
    }
}

impl Iterator for RecordReader {
    type Item = std::result::Result<PatientRecord, RowParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(error) => {
                    // An I/O failure leaves the reader in an unknown state.
                    if error.is_io_error() {
                        self.done = true;
                    }
                    let line = error.position().map(csv::Position::line).unwrap_or(0);
                    let kind = match error.kind() {
                        csv::ErrorKind::UnequalLengths {
                            expected_len, len, ..
                        } => RowErrorKind::FieldCount {
                            expected: *expected_len,
                            found: *len,
                        },
                        _ => RowErrorKind::Malformed(error.to_string()),
                    };
                    return Some(Err(self.row_error(line, kind)));
                }
            };

            if record.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            let line = record.position().map(csv::Position::line).unwrap_or(0);
            return Some(self.parse_row(&record, line));
        }
    }
}
