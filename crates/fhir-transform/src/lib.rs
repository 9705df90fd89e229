//! Record-to-FHIR transformation.
//!
//! [`builders`] turn one mapped source field into at most one resource;
//! [`BundleAssembler`] groups those resources into one collection bundle per
//! patient with the Patient resource first.

pub mod assembler;
pub mod builders;
pub mod context;
pub mod error;

pub use assembler::{BundleAssembler, RecordOutcome};
pub use builders::{BuildFn, Demographics, SourceField, build_field, build_patient, builder_for};
pub use context::BuildContext;
pub use error::{BuildError, BundleError};
