use std::path::{Path, PathBuf};

/// Outcome of one `run`.
#[derive(Debug)]
pub struct RunResult {
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub datasets: Vec<DatasetSummary>,
}

impl RunResult {
    /// Sums the counters of all datasets.
    pub fn totals(&self) -> DatasetSummary {
        let mut total = DatasetSummary::new("TOTAL", &self.output_dir);
        for dataset in &self.datasets {
            total.files += dataset.files;
            total.failed_files += dataset.failed_files;
            total.records += dataset.records;
            total.patients += dataset.patients;
            total.resources += dataset.resources;
            total.bundles_written += dataset.bundles_written;
            total.skipped_rows += dataset.skipped_rows;
            total.skipped_fields += dataset.skipped_fields;
            total.failed_writes += dataset.failed_writes;
        }
        total
    }
}

/// Counters for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub dataset: String,
    pub output_dir: PathBuf,
    /// Input files read, including those that failed.
    pub files: usize,
    pub failed_files: usize,
    pub records: usize,
    pub patients: usize,
    /// Resources across all bundles, Patient resources included.
    pub resources: usize,
    pub bundles_written: usize,
    pub skipped_rows: usize,
    pub skipped_fields: usize,
    pub failed_writes: usize,
}

impl DatasetSummary {
    pub fn new(dataset: &str, output_dir: &Path) -> Self {
        Self {
            dataset: dataset.to_string(),
            output_dir: output_dir.to_path_buf(),
            files: 0,
            failed_files: 0,
            records: 0,
            patients: 0,
            resources: 0,
            bundles_written: 0,
            skipped_rows: 0,
            skipped_fields: 0,
            failed_writes: 0,
        }
    }
}
