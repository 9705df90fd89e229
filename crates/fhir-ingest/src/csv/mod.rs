//! CSV reading utilities.

mod header;
mod reader;

pub use header::{find_column, normalize_cell, normalize_header, sniff_delimiter};
pub use reader::{
    DEFAULT_PATIENT_ID_COLUMN, PATIENT_ID_FALLBACKS, ReaderOptions, RecordLayout, RecordReader,
    open_csv_reader,
};
