//! Code-mapping table loading from CSV.

use std::path::Path;

use csv::StringRecord;
use fhir_ingest::{IngestError, normalize_cell, open_csv_reader};
use fhir_model::{CodeSystem, MappingEntry, VariableCategory};
use tracing::{debug, warn};

use crate::error::{LoadError, Result};
use crate::table::MappingTable;

const VARIABLE_ALIASES: &[&str] = &["variable", "source variable"];
const CODE_SYSTEM_ALIASES: &[&str] = &["vocabulary", "code system"];
const CODE_ALIASES: &[&str] = &["vocabulary code", "code"];
const DISPLAY_ALIASES: &[&str] = &["vocabulary display name", "display"];
const UNIT_ALIASES: &[&str] = &["unit"];
const UNIT_CODE_ALIASES: &[&str] = &["unit code", "ucum"];
const CATEGORY_ALIASES: &[&str] = &["type", "category"];
const LABEL_ALIASES: &[&str] = &["label"];

/// Lowercases and collapses `_`, `-` and runs of whitespace to one space.
fn header_key(value: &str) -> String {
    value
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_index(keys: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| keys.iter().position(|key| key == alias))
}

/// Column positions of the mapping table.
#[derive(Debug, Clone, Copy)]
struct Columns {
    variable: usize,
    code_system: usize,
    code: usize,
    display: usize,
    unit: Option<usize>,
    unit_code: Option<usize>,
    category: Option<usize>,
    label: Option<usize>,
}

impl Columns {
    fn resolve(headers: &[String], path: &Path) -> Result<Self> {
        let keys: Vec<String> = headers.iter().map(|h| header_key(h)).collect();
        let required = |aliases: &[&str], column: &'static str| {
            header_index(&keys, aliases).ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })
        };

        Ok(Self {
            variable: required(VARIABLE_ALIASES, "Variable")?,
            code_system: required(CODE_SYSTEM_ALIASES, "Vocabulary")?,
            code: required(CODE_ALIASES, "Vocabulary Code")?,
            display: required(DISPLAY_ALIASES, "Vocabulary Display Name")?,
            unit: header_index(&keys, UNIT_ALIASES),
            unit_code: header_index(&keys, UNIT_CODE_ALIASES),
            category: header_index(&keys, CATEGORY_ALIASES),
            label: header_index(&keys, LABEL_ALIASES),
        })
    }
}

fn get_string(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|idx| record.get(idx))
        .map(normalize_cell)
        .filter(|value| !value.is_empty())
}

/// Loads the code-mapping table at `path`.
///
/// Any problem with the file or one of its rows is fatal: a partially loaded
/// table would silently drop codes from every bundle.
pub fn load_mapping_table(path: &Path) -> Result<MappingTable> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if matches!(extension.as_str(), "xlsx" | "xls" | "xlsm" | "ods") {
        return Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        });
    }

    let (mut reader, headers) = open_csv_reader(path, None).map_err(|e| match e {
        IngestError::FileNotFound { path } => LoadError::NotFound { path },
        IngestError::FileRead { path, source } => LoadError::Io { path, source },
        other => LoadError::Csv {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })?;
    let columns = Columns::resolve(&headers, path)?;

    let mut table = MappingTable::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(csv::Position::line).unwrap_or(0);
        let entry = parse_row(&record, columns, path, line)?;

        let variable = entry.source_variable.clone();
        if !table.insert(entry) {
            warn!(
                mapping = %path.display(),
                line,
                variable = %variable,
                "duplicate mapping row ignored"
            );
        }
    }

    debug!(mapping = %path.display(), entries = table.len(), "mapping table loaded");
    Ok(table)
}

fn parse_row(
    record: &StringRecord,
    columns: Columns,
    path: &Path,
    line: u64,
) -> Result<MappingEntry> {
    let required = |idx: usize, column: &'static str| {
        get_string(record, Some(idx)).ok_or_else(|| LoadError::MissingValue {
            path: path.to_path_buf(),
            line,
            column,
        })
    };

    let variable = required(columns.variable, "Variable")?;
    let raw_system = required(columns.code_system, "Vocabulary")?;
    let code = required(columns.code, "Vocabulary Code")?;
    let display = required(columns.display, "Vocabulary Display Name")?;
    let unit = get_string(record, columns.unit);

    let code_system =
        raw_system
            .parse::<CodeSystem>()
            .map_err(|_| LoadError::UnknownCodeSystem {
                path: path.to_path_buf(),
                line,
                value: raw_system.clone(),
            })?;

    let category = match get_string(record, columns.category) {
        Some(raw) => raw
            .parse::<VariableCategory>()
            .map_err(|_| LoadError::UnknownCategory {
                path: path.to_path_buf(),
                line,
                value: raw.clone(),
            })?,
        None if unit.is_some() => VariableCategory::LaboratoryValue,
        None => VariableCategory::Observation,
    };

    let mut entry = MappingEntry::new(variable, code_system, code, display, category);
    entry.unit = unit;
    entry.unit_code = get_string(record, columns.unit_code);
    entry.label = get_string(record, columns.label);
    Ok(entry)
}
