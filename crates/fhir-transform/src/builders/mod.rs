//! Resource builders, one per variable category.
//!
//! Each builder is a pure function from one mapped source field to at most
//! one FHIR resource. [`builder_for`] is the static dispatch table: the
//! `match` is exhaustive over [`VariableCategory`], so a new category cannot
//! be added without deciding how it is built.
//!
//! | Category | Builder | Resource |
//! |----------|---------|----------|
//! | Demographics | (Patient builder) | Patient |
//! | Diagnosis | `condition::build_diagnosis` | Condition |
//! | Remission | `condition::build_remission` | Condition |
//! | Condition | `condition::build_condition` | Condition |
//! | LaboratoryValue | `observation::build_laboratory_value` | Observation |
//! | MolecularGenetics, Cytogenetics | `observation::build_detection` | Observation |
//! | Karyotype | `observation::build_karyotype` | Observation |
//! | NormalKaryotype | `observation::build_normal_karyotype` | Observation |
//! | EventStatus | `observation::build_event_status` | Observation |
//! | SurvivalStatus | `observation::build_survival_status` | Observation |
//! | EventTime | `observation::build_event_time` | Observation |
//! | Medication | `medication::build_medication` | MedicationStatement |
//! | Observation | `observation::build_observation` | Observation |

pub mod codes;
mod condition;
mod medication;
mod observation;
mod patient;
pub mod value;

use fhir_model::{
    CodeableConcept, FhirResource, MappingEntry, PatientId, VariableCategory, is_missing_value,
};

use crate::context::BuildContext;
use crate::error::BuildError;

pub use patient::{Demographics, build_patient};

/// One mapped source field of one patient.
#[derive(Debug, Clone, Copy)]
pub struct SourceField<'a> {
    pub patient_id: &'a PatientId,
    pub variable: &'a str,
    pub value: &'a str,
}

impl<'a> SourceField<'a> {
    pub fn new(patient_id: &'a PatientId, variable: &'a str, value: &'a str) -> Self {
        Self {
            patient_id,
            variable,
            value,
        }
    }

    pub fn is_missing(&self) -> bool {
        is_missing_value(self.value)
    }

    /// Trimmed raw value.
    pub fn raw(&self) -> &'a str {
        self.value.trim()
    }

    fn invalid(&self, reason: &'static str) -> BuildError {
        BuildError::invalid(self.variable, self.value, reason)
    }
}

/// Signature shared by every builder. `Ok(None)` means nothing to emit.
pub type BuildFn =
    fn(&SourceField<'_>, &MappingEntry, &BuildContext) -> Result<Option<FhirResource>, BuildError>;

/// Returns the builder for a category.
///
/// `None` for [`VariableCategory::Demographics`]: those fields are folded
/// into the Patient resource by [`build_patient`].
pub fn builder_for(category: VariableCategory) -> Option<BuildFn> {
    let build: BuildFn = match category {
        VariableCategory::Demographics => return None,
        VariableCategory::Diagnosis => condition::build_diagnosis,
        VariableCategory::Remission => condition::build_remission,
        VariableCategory::Condition => condition::build_condition,
        VariableCategory::LaboratoryValue => observation::build_laboratory_value,
        VariableCategory::MolecularGenetics | VariableCategory::Cytogenetics => {
            observation::build_detection
        }
        VariableCategory::Karyotype => observation::build_karyotype,
        VariableCategory::NormalKaryotype => observation::build_normal_karyotype,
        VariableCategory::EventStatus => observation::build_event_status,
        VariableCategory::SurvivalStatus => observation::build_survival_status,
        VariableCategory::EventTime => observation::build_event_time,
        VariableCategory::Medication => medication::build_medication,
        VariableCategory::Observation => observation::build_observation,
    };
    Some(build)
}

/// Builds the resource for one field using the builder of its category.
pub fn build_field(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> Result<Option<FhirResource>, BuildError> {
    match builder_for(entry.category) {
        Some(build) => build(field, entry, context),
        None => Ok(None),
    }
}

/// The mapped code of `entry` as a concept.
fn mapped_code(entry: &MappingEntry) -> CodeableConcept {
    CodeableConcept::coded(entry.code_system.system_uri(), &entry.code, &entry.display)
}
