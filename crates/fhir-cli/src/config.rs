//! Run configuration.
//!
//! Values come from three layers: built-in defaults, an optional TOML file
//! (`--config`), and command line flags. Each layer overrides the previous
//! one.
//!
//! ```toml
//! input_dir = "input"
//! mapping = "input/mapping_fhir.csv"
//! output_dir = "output"
//! split_by_file = true
//!
//! [build]
//! base_url = "https://fhir.example.org"
//! reference_year = 2010
//! patient_id_column = "SUBJID"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fhir_ingest::ReaderOptions;
use fhir_model::BuildOptions;
use serde::Deserialize;

/// Default input directory, relative to the working directory.
pub const DEFAULT_INPUT_DIR: &str = "input";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Mapping table looked up inside the input directory when none is given.
pub const DEFAULT_MAPPING_FILE: &str = "mapping_fhir.csv";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    /// Mapping table; `<input_dir>/mapping_fhir.csv` when unset.
    pub mapping: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Treat every input file as its own dataset with its own output folder.
    pub split_by_file: bool,
    /// Build and report without writing bundles.
    pub dry_run: bool,
    pub build: BuildOptions,
    pub reader: ReaderOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            mapping: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            split_by_file: false,
            dry_run: false,
            build: BuildOptions::default(),
            reader: ReaderOptions::default(),
        }
    }
}

impl RunConfig {
    pub fn mapping_path(&self) -> PathBuf {
        self.mapping
            .clone()
            .unwrap_or_else(|| self.input_dir.join(DEFAULT_MAPPING_FILE))
    }
}

/// Contents of a `--config` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub input_dir: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub split_by_file: Option<bool>,
    #[serde(default)]
    pub build: BuildSection,
}

/// The `[build]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    pub base_url: Option<String>,
    pub reference_year: Option<i32>,
    pub patient_id_column: Option<String>,
    pub age_column: Option<String>,
    pub sex_column: Option<String>,
}

impl ConfigFile {
    /// Reads and parses a config file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let parsed = Self::parse(&content)
            .with_context(|| format!("parse config file {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(parsed.relative_to(base))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |path: Option<PathBuf>| {
            path.map(|path| {
                if path.is_relative() {
                    base.join(path)
                } else {
                    path
                }
            })
        };
        self.input_dir = resolve(self.input_dir);
        self.mapping = resolve(self.mapping);
        self.output_dir = resolve(self.output_dir);
        self
    }

    /// Overrides the values of `config` that this file sets.
    pub fn apply(self, config: &mut RunConfig) {
        if let Some(input_dir) = self.input_dir {
            config.input_dir = input_dir;
        }
        if let Some(mapping) = self.mapping {
            config.mapping = Some(mapping);
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(split) = self.split_by_file {
            config.split_by_file = split;
        }

        let build = self.build;
        if let Some(base_url) = build.base_url {
            config.build = config.build.clone().with_base_url(base_url);
        }
        if let Some(year) = build.reference_year {
            config.build.reference_year = year;
        }
        if let Some(column) = build.age_column {
            config.build.age_column = column;
        }
        if let Some(column) = build.sex_column {
            config.build.sex_column = column;
        }
        if let Some(column) = build.patient_id_column {
            config.reader.patient_id_column = column;
        }
    }
}
