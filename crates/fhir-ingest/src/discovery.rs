//! Input file discovery.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// An input data file and the dataset name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// File stem, e.g. `ctab` for `ctab.csv`.
    pub dataset: String,
}

impl InputFile {
    pub fn from_path(path: PathBuf) -> Self {
        let dataset = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("")
            .to_string();
        Self { path, dataset }
    }
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Finds the data files of an input directory.
///
/// Skips `exclude` (the mapping table when it lives next to the data) and
/// files whose names mark them as documentation or metadata.
pub fn discover_input_files(dir: &Path, exclude: Option<&Path>) -> Result<Vec<InputFile>> {
    let excluded = exclude.map(canonical);
    let files = list_csv_files(dir)?
        .into_iter()
        .filter(|path| excluded.as_ref() != Some(&canonical(path)))
        .map(InputFile::from_path)
        .filter(|file| !is_metadata_file(&file.dataset.to_uppercase()))
        .collect();
    Ok(files)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_metadata_file(filename: &str) -> bool {
    let metadata_indicators = ["CODELIST", "MAPPING", "README", "METADATA"];

    metadata_indicators
        .iter()
        .any(|pattern| filename.contains(pattern))
}
