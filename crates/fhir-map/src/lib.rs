//! Code-mapping table for trial source variables.
//!
//! The table links every raw source variable to a standard code (LOINC or
//! SNOMED CT), its display text, an optional UCUM unit and the variable
//! category that selects the resource builder. It is loaded once at startup
//! and read-only afterwards.

pub mod error;
pub mod loader;
pub mod table;

pub use error::{LoadError, Result};
pub use loader::load_mapping_table;
pub use table::MappingTable;
