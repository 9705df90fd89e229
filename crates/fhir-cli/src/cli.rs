//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "trial-fhir",
    version,
    about = "Convert clinical trial CSV exports into per-patient FHIR bundles",
    long_about = "Convert clinical trial CSV exports into FHIR R4 collection bundles.\n\n\
                  Every source variable is coded through a mapping table (LOINC or\n\
                  SNOMED CT) and one bundle_<patient>.json is written per patient.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include source cell values in log messages.
    ///
    /// Values are clinical data and are redacted by default.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert the input directory into FHIR bundles.
    Run(RunArgs),

    /// Print the loaded mapping table.
    Mapping(MappingArgs),
}

#[derive(Args, Clone, Default)]
pub struct RunArgs {
    /// Directory containing the input CSV files [default: input].
    #[arg(long = "input-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Mapping table [default: <INPUT_DIR>/mapping_fhir.csv].
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: Option<PathBuf>,

    /// Output directory for the bundles [default: output].
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML configuration file. Flags override its values.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write each input file as its own dataset to <OUTPUT_DIR>/<file stem>.
    #[arg(long = "split-by-file")]
    pub split_by_file: bool,

    /// Build and report without writing bundles.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Base URL of the entries' fullUrl.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Year ages are counted back from to approximate birth dates.
    #[arg(long = "reference-year", value_name = "YEAR")]
    pub reference_year: Option<i32>,

    /// Column holding the subject identifier.
    #[arg(long = "patient-id-column", value_name = "COLUMN")]
    pub patient_id_column: Option<String>,
}

#[derive(Args)]
pub struct MappingArgs {
    /// Mapping table [default: <INPUT_DIR>/mapping_fhir.csv].
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: Option<PathBuf>,

    /// Directory the default mapping table is looked up in.
    #[arg(long = "input-dir", value_name = "DIR", default_value = "input")]
    pub input_dir: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
