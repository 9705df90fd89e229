pub mod bundle;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod options;
pub mod record;
pub mod resource;

pub use bundle::{Bundle, BundleEntry, BundleResourceType, BundleType};
pub use error::{ModelError, Result};
pub use ids::{PatientId, derive_resource_id, name_digest};
pub use mapping::{CodeSystem, MappingEntry, VariableCategory};
pub use options::{BuildOptions, DEFAULT_BASE_URL, DEFAULT_REFERENCE_YEAR};
pub use record::{Field, PatientRecord, is_missing_value};
pub use resource::{
    AdministrativeGender, Annotation, CodeableConcept, Coding, Condition, Dosage, DoseAndRate,
    FhirResource, Identifier, MedicationStatement, MedicationStatementStatus, Narrative,
    NarrativeStatus, Observation, ObservationStatus, ObservationValue, Patient, Quantity,
    Reference,
};
