//! Error types for resource building and bundle assembly.

use thiserror::Error;

/// A single field could not be turned into a resource.
///
/// Recoverable: the field is skipped and the patient continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The variable has no row in the mapping table.
    #[error("variable '{variable}' is not in the mapping table")]
    MappingLookup { variable: String },

    /// The raw value does not fit the variable's category.
    #[error("variable '{variable}': {reason}")]
    InvalidValue {
        variable: String,
        /// Raw cell value. Kept out of the message so logs can redact it.
        value: String,
        reason: &'static str,
    },
}

impl BuildError {
    pub fn invalid(variable: &str, value: &str, reason: &'static str) -> Self {
        BuildError::InvalidValue {
            variable: variable.to_string(),
            value: value.to_string(),
            reason,
        }
    }

    /// Source variable the error is about.
    pub fn variable(&self) -> &str {
        match self {
            BuildError::MappingLookup { variable } | BuildError::InvalidValue { variable, .. } => {
                variable
            }
        }
    }
}

/// Violations of the one-patient-per-bundle invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("{resource_type}/{id} references {reference}, not {expected}")]
    ForeignResource {
        resource_type: &'static str,
        id: String,
        reference: String,
        expected: String,
    },

    /// Required elements are missing (code, or an Observation's result).
    #[error("{resource_type}/{id} is missing required elements")]
    Incomplete {
        resource_type: &'static str,
        id: String,
    },
}
