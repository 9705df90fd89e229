//! Code-mapping types linking raw source variables to standard codes.
//!
//! A mapping table row names a source variable (a column in the trial data,
//! e.g. `HB` or `NPM1`), the coding system and code it maps to, and the
//! variable category that decides which FHIR resource is produced for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Terminology a mapped code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeSystem {
    /// Logical Observation Identifiers Names and Codes.
    Loinc,
    /// SNOMED Clinical Terms.
    Snomed,
}

impl CodeSystem {
    /// Canonical FHIR system URI.
    pub fn system_uri(&self) -> &'static str {
        match self {
            CodeSystem::Loinc => "http://loinc.org",
            CodeSystem::Snomed => "http://snomed.info/sct",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSystem::Loinc => "LOINC",
            CodeSystem::Snomed => "SNOMED",
        }
    }
}

impl fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CodeSystem {
    type Err = ModelError;

    /// Accepts the short names used in mapping spreadsheets as well as the
    /// canonical system URIs (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        match normalized.as_str() {
            "LOINC" | "HTTP://LOINC.ORG" => Ok(CodeSystem::Loinc),
            "SNOMED" | "SNOMED CT" | "SNOMED-CT" | "SNOMEDCT" | "SCT"
            | "HTTP://SNOMED.INFO/SCT" => Ok(CodeSystem::Snomed),
            _ => Err(ModelError::UnknownCodeSystem(s.trim().to_string())),
        }
    }
}

/// Category of a source variable.
///
/// Each category is handled by exactly one resource builder; adding a
/// variant forces every dispatch `match` to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableCategory {
    /// Age, sex: folded into the Patient resource.
    Demographics,
    /// Primary diagnosis with subtype (Condition).
    Diagnosis,
    /// Remission achieved (Condition with remission status).
    Remission,
    /// Yes/no condition flag (Condition when present).
    Condition,
    /// Numeric laboratory measurement with unit (Observation).
    LaboratoryValue,
    /// Gene mutation detection status (Observation).
    MolecularGenetics,
    /// Cytogenetic aberration detection status (Observation).
    Cytogenetics,
    /// Complex karyotype flag: set means complex (Observation).
    Karyotype,
    /// Normal karyotype flag: set means normal (Observation).
    NormalKaryotype,
    /// Binary outcome event such as relapse (Observation).
    EventStatus,
    /// Death flag of overall survival, coded alive/dead (Observation).
    SurvivalStatus,
    /// Time to an outcome event (Observation).
    EventTime,
    /// Medication received (MedicationStatement).
    Medication,
    /// Anything else: numeric or free-text Observation.
    Observation,
}

impl VariableCategory {
    pub const ALL: [VariableCategory; 14] = [
        VariableCategory::Demographics,
        VariableCategory::Diagnosis,
        VariableCategory::Remission,
        VariableCategory::Condition,
        VariableCategory::LaboratoryValue,
        VariableCategory::MolecularGenetics,
        VariableCategory::Cytogenetics,
        VariableCategory::Karyotype,
        VariableCategory::NormalKaryotype,
        VariableCategory::EventStatus,
        VariableCategory::SurvivalStatus,
        VariableCategory::EventTime,
        VariableCategory::Medication,
        VariableCategory::Observation,
    ];

    /// Name as written in the `Type` column of the mapping table.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableCategory::Demographics => "demographics",
            VariableCategory::Diagnosis => "diagnosis",
            VariableCategory::Remission => "remission",
            VariableCategory::Condition => "condition",
            VariableCategory::LaboratoryValue => "laboratory value",
            VariableCategory::MolecularGenetics => "molecular genetics",
            VariableCategory::Cytogenetics => "cytogenetics",
            VariableCategory::Karyotype => "karyotype",
            VariableCategory::NormalKaryotype => "normal karyotype",
            VariableCategory::EventStatus => "event status",
            VariableCategory::SurvivalStatus => "survival status",
            VariableCategory::EventTime => "event time",
            VariableCategory::Medication => "medication",
            VariableCategory::Observation => "observation",
        }
    }

    /// Returns true for categories that never produce a resource of their own.
    pub fn is_patient_attribute(&self) -> bool {
        matches!(self, VariableCategory::Demographics)
    }
}

impl fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VariableCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "demographics" | "demographic" | "patient" => Ok(VariableCategory::Demographics),
            "diagnosis" => Ok(VariableCategory::Diagnosis),
            "remission" => Ok(VariableCategory::Remission),
            "condition" => Ok(VariableCategory::Condition),
            "laboratory value" | "laboratory" | "lab" | "lab value" => {
                Ok(VariableCategory::LaboratoryValue)
            }
            "molecular genetics" | "genetics" => Ok(VariableCategory::MolecularGenetics),
            "cytogenetics" => Ok(VariableCategory::Cytogenetics),
            "karyotype" | "complex karyotype" => Ok(VariableCategory::Karyotype),
            "normal karyotype" | "karyotype normal" => Ok(VariableCategory::NormalKaryotype),
            "event status" | "outcome status" | "outcome" => Ok(VariableCategory::EventStatus),
            "survival status" | "overall survival" | "vital status" => {
                Ok(VariableCategory::SurvivalStatus)
            }
            "event time" | "survival time" | "outcome time" => Ok(VariableCategory::EventTime),
            "medication" | "treatment" => Ok(VariableCategory::Medication),
            "observation" | "other" => Ok(VariableCategory::Observation),
            _ => Err(ModelError::UnknownCategory(s.trim().to_string())),
        }
    }
}

/// One row of the code-mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Source variable (column) name, e.g. `HB`.
    pub source_variable: String,
    /// Terminology of `code`.
    pub code_system: CodeSystem,
    /// Standard code, e.g. `718-7`.
    pub code: String,
    /// Display text for the code.
    pub display: String,
    /// Human-readable unit, e.g. `g/dL`.
    pub unit: Option<String>,
    /// UCUM code for the unit; falls back to `unit`.
    pub unit_code: Option<String>,
    /// Which builder handles the variable.
    pub category: VariableCategory,
    /// Free-text description from the source codebook.
    pub label: Option<String>,
}

impl MappingEntry {
    /// Creates an entry with the required columns only.
    pub fn new(
        source_variable: impl Into<String>,
        code_system: CodeSystem,
        code: impl Into<String>,
        display: impl Into<String>,
        category: VariableCategory,
    ) -> Self {
        Self {
            source_variable: source_variable.into(),
            code_system,
            code: code.into(),
            display: display.into(),
            unit: None,
            unit_code: None,
            category,
            label: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_unit_code(mut self, unit_code: impl Into<String>) -> Self {
        self.unit_code = Some(unit_code.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// UCUM code to put in `Quantity.code`.
    pub fn ucum_code(&self) -> Option<&str> {
        self.unit_code.as_deref().or(self.unit.as_deref())
    }

    /// Label when present, otherwise the display text.
    pub fn description(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.display)
    }
}
