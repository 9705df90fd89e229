//! Build context threaded through every builder.

use fhir_model::{BuildOptions, PatientId, Reference, derive_resource_id};

/// Dataset name plus build options, shared read-only by all builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Dataset the records come from; part of every resource id.
    pub dataset: String,
    pub options: BuildOptions,
}

impl BuildContext {
    pub fn new(dataset: impl Into<String>, options: BuildOptions) -> Self {
        Self {
            dataset: dataset.into(),
            options,
        }
    }

    /// Deterministic id of the resource built for `variable` of `patient_id`.
    pub fn resource_id(&self, patient_id: &PatientId, variable: &str) -> String {
        derive_resource_id(&[&self.dataset, patient_id.as_str(), variable])
    }

    /// Deterministic id of the patient's bundle.
    pub fn bundle_id(&self, patient_id: &PatientId) -> String {
        derive_resource_id(&[&self.dataset, patient_id.as_str(), "Bundle"])
    }

    pub fn subject(&self, patient_id: &PatientId) -> Reference {
        Reference::new(patient_id.reference())
    }
}
