//! Conversion pipeline with explicit stages.
//!
//! 1. **Mapping**: load the code-mapping table
//! 2. **Discover**: list the input files and group them into datasets
//! 3. **Assemble**: stream records through the resource builders into one
//!    bundle per patient
//! 4. **Write**: one JSON file per bundle
//!
//! Stages 1 and 2 fail the run. From stage 3 on, failures are per file, row,
//! field or bundle: they are logged, counted and skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use fhir_ingest::{IngestError, InputFile, ReaderOptions, RecordReader, discover_input_files};
use fhir_map::{MappingTable, load_mapping_table};
use fhir_model::{Bundle, PatientRecord};
use fhir_output::{WriteError, bundle_path, write_bundle};
use fhir_transform::{BuildContext, BuildError, BundleAssembler, RecordOutcome};
use tracing::{debug, error, info, info_span, trace, warn};

use crate::config::RunConfig;
use crate::logging::redact_value;
use crate::types::{DatasetSummary, RunResult};

/// Dataset name used when all input files are merged.
pub const MERGED_DATASET: &str = "trial";

// ============================================================================
// Stage 1: Mapping
// ============================================================================

pub fn load_mapping(path: &Path) -> Result<MappingTable> {
    let start = Instant::now();
    let table = load_mapping_table(path)
        .with_context(|| format!("load mapping table {}", path.display()))?;
    info!(
        mapping = %path.display(),
        entries = table.len(),
        duration_ms = start.elapsed().as_millis(),
        "mapping table loaded"
    );
    Ok(table)
}

// ============================================================================
// Stage 2: Discover
// ============================================================================

/// Input files that become one set of bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPlan {
    /// Part of every resource id.
    pub name: String,
    pub files: Vec<InputFile>,
    pub output_dir: PathBuf,
}

/// Lists the data files of `input_dir`, leaving out the mapping table.
pub fn discover(input_dir: &Path, mapping: &Path) -> Result<Vec<InputFile>> {
    let files = discover_input_files(input_dir, Some(mapping))
        .with_context(|| format!("read input directory {}", input_dir.display()))?;
    if files.is_empty() {
        return Err(IngestError::NoInputFiles {
            path: input_dir.to_path_buf(),
        })
        .context("discover input files");
    }
    info!(
        input_dir = %input_dir.display(),
        file_count = files.len(),
        "input files discovered"
    );
    Ok(files)
}

/// Groups input files into datasets.
///
/// Merged: one dataset named [`MERGED_DATASET`] written to `output_dir`.
/// Split: one dataset per file, named by its stem and written to
/// `output_dir/<stem>`.
pub fn plan_datasets(
    files: Vec<InputFile>,
    output_dir: &Path,
    split_by_file: bool,
) -> Vec<DatasetPlan> {
    if split_by_file {
        return files
            .into_iter()
            .map(|file| DatasetPlan {
                name: file.dataset.clone(),
                output_dir: output_dir.join(&file.dataset),
                files: vec![file],
            })
            .collect();
    }
    if files.is_empty() {
        return Vec::new();
    }
    vec![DatasetPlan {
        name: MERGED_DATASET.to_string(),
        files,
        output_dir: output_dir.to_path_buf(),
    }]
}

// ============================================================================
// Stage 3: Assemble
// ============================================================================

/// Bundles of one dataset, ready to write.
#[derive(Debug)]
pub struct AssembledDataset {
    pub bundles: Vec<Bundle>,
    pub summary: DatasetSummary,
}

/// Reads every file of `plan` and assembles one bundle per patient.
pub fn assemble_dataset(
    plan: &DatasetPlan,
    table: &MappingTable,
    config: &RunConfig,
) -> AssembledDataset {
    let span = info_span!("dataset", dataset = %plan.name);
    let _guard = span.enter();
    let start = Instant::now();

    let context = BuildContext::new(plan.name.as_str(), config.build.clone());
    let mut assembler = BundleAssembler::new(plan.name.as_str(), context);
    let mut summary = DatasetSummary::new(&plan.name, &plan.output_dir);
    let mut unmapped = BTreeSet::new();

    for file in &plan.files {
        summary.files += 1;
        let file_span = info_span!("file", file = %file.path.display());
        let _file_guard = file_span.enter();

        let mut ingest = FileIngest {
            assembler: &mut assembler,
            table,
            summary: &mut summary,
            unmapped: &mut unmapped,
        };
        if let Err(error) = ingest.read(file, &config.reader) {
            error!(%error, "input file skipped");
            summary.failed_files += 1;
        }
    }

    summary.patients = assembler.patient_count();
    let bundles = assembler.finish();
    summary.resources = bundles.iter().map(Bundle::len).sum();
    info!(
        dataset = %plan.name,
        patients = summary.patients,
        resources = summary.resources,
        skipped_rows = summary.skipped_rows,
        skipped_fields = summary.skipped_fields,
        duration_ms = start.elapsed().as_millis(),
        "dataset assembled"
    );
    AssembledDataset { bundles, summary }
}

/// State shared while the files of one dataset are read.
struct FileIngest<'a> {
    assembler: &'a mut BundleAssembler,
    table: &'a MappingTable,
    summary: &'a mut DatasetSummary,
    /// Unmapped variables already warned about.
    unmapped: &'a mut BTreeSet<String>,
}

impl FileIngest<'_> {
    fn read(&mut self, file: &InputFile, options: &ReaderOptions) -> Result<(), IngestError> {
        let reader = RecordReader::open(&file.path, options)?;
        debug!(
            layout = ?reader.layout(),
            columns = reader.headers().len(),
            "reading records"
        );

        let mut records = 0usize;
        let mut skipped_rows = 0usize;
        for row in reader {
            match row {
                Ok(record) => {
                    records += 1;
                    let outcome = self.assembler.add_record(&record, self.table);
                    self.summary.skipped_fields += outcome.skipped();
                    self.report(&record, &outcome);
                }
                Err(error) => {
                    skipped_rows += 1;
                    warn!(%error, "row skipped");
                }
            }
        }

        self.summary.records += records;
        self.summary.skipped_rows += skipped_rows;
        info!(records, skipped_rows, "file read");
        Ok(())
    }

    fn report(&mut self, record: &PatientRecord, outcome: &RecordOutcome) {
        for error in &outcome.errors {
            match error {
                BuildError::MappingLookup { variable } => {
                    if self.unmapped.insert(variable.clone()) {
                        warn!(
                            source = %record.source,
                            line = record.line,
                            %error,
                            "field skipped; later occurrences are only counted"
                        );
                    } else {
                        trace!(source = %record.source, line = record.line, %error, "field skipped");
                    }
                }
                BuildError::InvalidValue { value, .. } => {
                    warn!(
                        source = %record.source,
                        line = record.line,
                        value = %redact_value(value),
                        %error,
                        "field skipped"
                    );
                }
            }
        }
        for error in &outcome.rejected {
            warn!(source = %record.source, line = record.line, %error, "resource rejected");
        }
    }
}

// ============================================================================
// Stage 4: Write
// ============================================================================

/// Writes every bundle, counting failures instead of stopping at them.
///
/// A bundle whose file name was already used in this run, compared without
/// case for case-insensitive file systems, is not written and counts as a
/// failed write.
pub fn write_dataset(bundles: &[Bundle], output_dir: &Path, summary: &mut DatasetSummary) {
    let start = Instant::now();
    let mut taken: BTreeMap<String, &str> = BTreeMap::new();
    for bundle in bundles {
        let path = bundle_path(bundle, output_dir);
        let key = path.to_string_lossy().to_lowercase();
        let written = match taken.get(&key) {
            Some(existing) => Err(WriteError::PathTaken {
                path,
                existing: (*existing).to_string(),
            }),
            None => write_bundle(bundle, output_dir),
        };
        match written {
            Ok(_) => {
                taken.insert(key, bundle.id.as_str());
                summary.bundles_written += 1;
            }
            Err(error) => {
                summary.failed_writes += 1;
                error!(bundle_id = %bundle.id, %error, "bundle not written");
            }
        }
    }
    info!(
        output_dir = %output_dir.display(),
        bundles_written = summary.bundles_written,
        failed_writes = summary.failed_writes,
        duration_ms = start.elapsed().as_millis(),
        "bundles written"
    );
}

/// Runs all stages.
///
/// Returns an error only for fatal setup failures; nothing is written in
/// that case.
pub fn run_pipeline(config: &RunConfig) -> Result<RunResult> {
    let span = info_span!(
        "run",
        input_dir = %config.input_dir.display(),
        dry_run = config.dry_run
    );
    let _guard = span.enter();
    let start = Instant::now();

    let mapping = config.mapping_path();
    let table = load_mapping(&mapping)?;
    let files = discover(&config.input_dir, &mapping)?;
    if !config.dry_run {
        fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("create output directory {}", config.output_dir.display()))?;
    }

    let plans = plan_datasets(files, &config.output_dir, config.split_by_file);
    let mut datasets = Vec::with_capacity(plans.len());
    for plan in &plans {
        let AssembledDataset {
            bundles,
            mut summary,
        } = assemble_dataset(plan, &table, config);
        if config.dry_run {
            debug!(dataset = %plan.name, bundles = bundles.len(), "dry run, nothing written");
        } else {
            write_dataset(&bundles, &plan.output_dir, &mut summary);
        }
        datasets.push(summary);
    }

    info!(
        datasets = datasets.len(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunResult {
        output_dir: config.output_dir.clone(),
        dry_run: config.dry_run,
        datasets,
    })
}
