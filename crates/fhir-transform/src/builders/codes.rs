//! Fixed terminology used by the builders.

pub const SNOMED: &str = "http://snomed.info/sct";
pub const UCUM: &str = "http://unitsofmeasure.org";

pub const OBSERVATION_CATEGORY: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";
pub const OBSERVATION_INTERPRETATION: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ObservationInterpretation";
pub const DATA_ABSENT_REASON: &str = "http://terminology.hl7.org/CodeSystem/data-absent-reason";
pub const CONDITION_CLINICAL: &str = "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const CONDITION_VERIFICATION: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub const CONDITION_CATEGORY: &str = "http://terminology.hl7.org/CodeSystem/condition-category";

/// Identifier system for subject ids as found in the source data.
pub const SOURCE_SUBJECT_ID: &str = "urn:trial-fhir:source-subject-id";

/// SNOMED CT "Detected".
pub const DETECTED: (&str, &str) = ("260373001", "Detected");
/// SNOMED CT "Not detected".
pub const NOT_DETECTED: (&str, &str) = ("260415000", "Not Detected");

/// SNOMED CT "Alive".
pub const ALIVE: (&str, &str) = ("438949009", "Alive");
/// SNOMED CT "Dead".
pub const DEAD: (&str, &str) = ("419099009", "Dead");

/// Unit used for event times when the mapping names none.
pub const DEFAULT_TIME_UNIT: (&str, &str) = ("months", "mo");
