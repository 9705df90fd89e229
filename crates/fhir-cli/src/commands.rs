use anyhow::Result;
use comfy_table::{Cell, Table};
use fhir_cli::config::{ConfigFile, DEFAULT_MAPPING_FILE, RunConfig};
use fhir_cli::pipeline::{load_mapping, run_pipeline};
use fhir_cli::types::RunResult;

use crate::cli::{MappingArgs, RunArgs};
use crate::summary::{apply_table_style, dim_cell};

pub fn run(args: &RunArgs) -> Result<RunResult> {
    let config = resolve_config(args)?;
    run_pipeline(&config)
}

/// Defaults, then the config file, then flags.
fn resolve_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = RunConfig::default();
    if let Some(path) = &args.config {
        ConfigFile::load(path)?.apply(&mut config);
    }

    if let Some(input_dir) = &args.input_dir {
        config.input_dir.clone_from(input_dir);
    }
    if let Some(mapping) = &args.mapping {
        config.mapping = Some(mapping.clone());
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if args.split_by_file {
        config.split_by_file = true;
    }
    config.dry_run = args.dry_run;
    if let Some(base_url) = &args.base_url {
        config.build = config.build.with_base_url(base_url.as_str());
    }
    if let Some(year) = args.reference_year {
        config.build.reference_year = year;
    }
    if let Some(column) = &args.patient_id_column {
        config.reader.patient_id_column.clone_from(column);
    }
    Ok(config)
}

pub fn run_mapping(args: &MappingArgs) -> Result<()> {
    let path = args
        .mapping
        .clone()
        .unwrap_or_else(|| args.input_dir.join(DEFAULT_MAPPING_FILE));
    let table = load_mapping(&path)?;

    let mut table_view = Table::new();
    table_view.set_header(vec![
        "Variable", "Category", "System", "Code", "Display", "Unit",
    ]);
    apply_table_style(&mut table_view);
    for entry in table.iter() {
        table_view.add_row(vec![
            Cell::new(&entry.source_variable),
            Cell::new(entry.category),
            Cell::new(entry.code_system.as_str()),
            Cell::new(&entry.code),
            Cell::new(&entry.display),
            entry
                .unit
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("Mapping: {} ({} variables)", path.display(), table.len());
    println!("{table_view}");
    Ok(())
}
