use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fhir_cli::types::{DatasetSummary, RunResult};

pub fn print_summary(result: &RunResult) {
    println!("Output: {}", result.output_dir.display());
    if result.dry_run {
        println!("Dry run: no bundles written");
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Files"),
        header_cell("Patients"),
        header_cell("Resources"),
        header_cell("Bundles"),
        header_cell("Skipped rows"),
        header_cell("Skipped fields"),
        header_cell("Failed files"),
        header_cell("Failed writes"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=8 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    for summary in &result.datasets {
        table.add_row(summary_row(
            Cell::new(&summary.dataset)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            summary,
        ));
    }
    if result.datasets.len() > 1 {
        let totals = result.totals();
        let row = summary_row(
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            &totals,
        )
        .into_iter()
        .map(|cell| cell.add_attribute(Attribute::Bold))
        .collect::<Vec<_>>();
        table.add_row(row);
    }
    println!("{table}");
}

fn summary_row(label: Cell, summary: &DatasetSummary) -> Vec<Cell> {
    vec![
        label,
        Cell::new(summary.files),
        Cell::new(summary.patients),
        Cell::new(summary.resources),
        Cell::new(summary.bundles_written),
        count_cell(summary.skipped_rows, Color::Yellow),
        count_cell(summary.skipped_fields, Color::Yellow),
        count_cell(summary.failed_files, Color::Red),
        count_cell(summary.failed_writes, Color::Red),
    ]
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
