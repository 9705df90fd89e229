//! Row-oriented patient records produced by the record reader.

use serde::{Deserialize, Serialize};

use crate::ids::PatientId;

/// Tokens that stand for "no value" in exported trial data.
const MISSING_TOKENS: [&str; 6] = ["", "NA", "N/A", "NAN", "NULL", "."];

/// Returns true when a raw cell carries no value.
pub fn is_missing_value(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// One source variable and its raw cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub variable: String,
    pub value: String,
}

impl Field {
    pub fn new(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
        }
    }

    pub fn is_missing(&self) -> bool {
        is_missing_value(&self.value)
    }
}

/// One input row, keyed by the patient it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: PatientId,
    /// Source file name the row was read from.
    pub source: String,
    /// 1-based line number of the row in `source`.
    pub line: u64,
    /// Fields in column order.
    pub fields: Vec<Field>,
}

impl PatientRecord {
    pub fn new(patient_id: PatientId, source: impl Into<String>, line: u64) -> Self {
        Self {
            patient_id,
            source: source.into(),
            line,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, variable: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::new(variable, value));
        self
    }

    pub fn push_field(&mut self, variable: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field::new(variable, value));
    }

    /// Case-insensitive lookup of a field value.
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.variable.eq_ignore_ascii_case(variable))
            .map(|field| field.value.as_str())
    }

    /// Like [`PatientRecord::get`] but treats missing-value tokens as absent.
    pub fn value(&self, variable: &str) -> Option<&str> {
        self.get(variable)
            .filter(|value| !is_missing_value(value))
            .map(str::trim)
    }
}
