//! CLI library components for trial-fhir.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;
