//! FHIR bundle output.
//!
//! One JSON file per patient, `bundle_<patient_id>.json`, indented by four
//! spaces. Output is deterministic: the same bundle always renders to the
//! same bytes.

pub mod error;
pub mod writer;

pub use error::{Result, WriteError};
pub use writer::{bundle_file_name, bundle_path, read_bundle, render_bundle, write_bundle};
