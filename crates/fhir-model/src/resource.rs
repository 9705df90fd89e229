//! FHIR R4 resources emitted by the converter.
//!
//! These models are not complete representations of the FHIR specification;
//! they carry the elements the builders populate. Optional elements are
//! omitted from JSON when empty.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// XHTML namespace required on narrative `div`s.
const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// [Coding](<https://hl7.org/fhir/R4/datatypes.html#Coding>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>, display: &str) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: Some(display.to_string()),
        }
    }
}

/// [CodeableConcept](<https://hl7.org/fhir/R4/datatypes.html#CodeableConcept>)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// A concept with a single coding.
    pub fn coded(system: impl Into<String>, code: impl Into<String>, display: &str) -> Self {
        Self {
            coding: vec![Coding::new(system, code, display)],
            text: None,
        }
    }

    /// A concept carrying only free text.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Code of the first coding, if any.
    pub fn first_code(&self) -> Option<&str> {
        self.coding.first().map(|coding| coding.code.as_str())
    }
}

/// [Quantity](<https://hl7.org/fhir/R4/datatypes.html#Quantity>)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Quantity {
    /// A bare number without unit.
    pub fn unitless(value: f64) -> Self {
        Self {
            value,
            unit: None,
            system: None,
            code: None,
        }
    }

    /// A UCUM-coded quantity.
    pub fn ucum(value: f64, unit: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            value,
            unit: Some(unit.into()),
            system: Some("http://unitsofmeasure.org".to_string()),
            code: Some(code.into()),
        }
    }
}

/// [Reference](<https://hl7.org/fhir/R4/references.html#Reference>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// [Annotation](<https://hl7.org/fhir/R4/datatypes.html#Annotation>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
}

impl Annotation {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// [Identifier](<https://hl7.org/fhir/R4/datatypes.html#Identifier>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Generated,
}

/// [Narrative](<https://hl7.org/fhir/R4/narrative.html#Narrative>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub status: NarrativeStatus,
    pub div: String,
}

impl Narrative {
    /// Generated narrative wrapping `text` in an XHTML `div`.
    pub fn generated(text: &str) -> Self {
        Self {
            status: NarrativeStatus::Generated,
            div: format!("<div xmlns=\"{XHTML_NS}\">{}</div>", escape_xhtml(text)),
        }
    }
}

fn escape_xhtml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// [AdministrativeGender](<https://hl7.org/fhir/R4/valueset-administrative-gender.html>)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

/// [Patient](<https://hl7.org/fhir/R4/patient.html>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationStatus {
    Final,
}

/// The `value[x]` choice of an Observation.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationValue {
    Quantity(Quantity),
    CodeableConcept(CodeableConcept),
    String(String),
    Boolean(bool),
}

/// [Observation](<https://hl7.org/fhir/R4/observation.html>)
///
/// At most one of the `value_*` fields is set; use [`Observation::set_value`]
/// to keep it that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    pub status: ObservationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_absent_reason: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

impl Observation {
    /// A final observation with no value yet.
    pub fn new(id: impl Into<String>, code: CodeableConcept, subject: Reference) -> Self {
        Self {
            id: id.into(),
            text: None,
            status: ObservationStatus::Final,
            category: Vec::new(),
            code,
            subject,
            value_quantity: None,
            value_codeable_concept: None,
            value_string: None,
            value_boolean: None,
            data_absent_reason: None,
            interpretation: Vec::new(),
            note: Vec::new(),
        }
    }

    /// Sets `value[x]`, clearing any previous value and absent reason.
    pub fn set_value(&mut self, value: ObservationValue) {
        self.value_quantity = None;
        self.value_codeable_concept = None;
        self.value_string = None;
        self.value_boolean = None;
        self.data_absent_reason = None;
        match value {
            ObservationValue::Quantity(quantity) => self.value_quantity = Some(quantity),
            ObservationValue::CodeableConcept(concept) => {
                self.value_codeable_concept = Some(concept)
            }
            ObservationValue::String(text) => self.value_string = Some(text),
            ObservationValue::Boolean(flag) => self.value_boolean = Some(flag),
        }
    }

    pub fn value(&self) -> Option<ObservationValue> {
        if let Some(quantity) = &self.value_quantity {
            return Some(ObservationValue::Quantity(quantity.clone()));
        }
        if let Some(concept) = &self.value_codeable_concept {
            return Some(ObservationValue::CodeableConcept(concept.clone()));
        }
        if let Some(text) = &self.value_string {
            return Some(ObservationValue::String(text.clone()));
        }
        self.value_boolean.map(ObservationValue::Boolean)
    }

    /// True when the observation carries a value or says why it has none.
    pub fn has_result(&self) -> bool {
        self.value().is_some() || self.data_absent_reason.is_some()
    }
}

/// [Condition](<https://hl7.org/fhir/R4/condition.html>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    pub clinical_status: CodeableConcept,
    pub verification_status: CodeableConcept,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationStatementStatus {
    Completed,
    NotTaken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseAndRate {
    pub dose_quantity: Quantity,
}

/// [Dosage](<https://hl7.org/fhir/R4/dosage.html>)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dose_and_rate: Vec<DoseAndRate>,
}

/// [MedicationStatement](<https://hl7.org/fhir/R4/medicationstatement.html>)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    pub status: MedicationStatementStatus,
    pub medication_codeable_concept: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage: Vec<Dosage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

/// Any resource that can appear in a patient bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum FhirResource {
    Patient(Patient),
    Observation(Observation),
    Condition(Condition),
    MedicationStatement(MedicationStatement),
}

impl FhirResource {
    /// FHIR resource type name.
    pub fn resource_type(&self) -> &'static str {
        match self {
            FhirResource::Patient(_) => "Patient",
            FhirResource::Observation(_) => "Observation",
            FhirResource::Condition(_) => "Condition",
            FhirResource::MedicationStatement(_) => "MedicationStatement",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            FhirResource::Patient(patient) => &patient.id,
            FhirResource::Observation(observation) => &observation.id,
            FhirResource::Condition(condition) => &condition.id,
            FhirResource::MedicationStatement(statement) => &statement.id,
        }
    }

    /// Reference to the patient this resource belongs to.
    ///
    /// For a Patient this is the reference to itself.
    pub fn patient_reference(&self) -> Cow<'_, str> {
        match self {
            FhirResource::Patient(patient) => Cow::Owned(format!("Patient/{}", patient.id)),
            FhirResource::Observation(observation) => {
                Cow::Borrowed(observation.subject.reference.as_str())
            }
            FhirResource::Condition(condition) => {
                Cow::Borrowed(condition.subject.reference.as_str())
            }
            FhirResource::MedicationStatement(statement) => {
                Cow::Borrowed(statement.subject.reference.as_str())
            }
        }
    }
}

impl From<Patient> for FhirResource {
    fn from(value: Patient) -> Self {
        FhirResource::Patient(value)
    }
}

impl From<Observation> for FhirResource {
    fn from(value: Observation) -> Self {
        FhirResource::Observation(value)
    }
}

impl From<Condition> for FhirResource {
    fn from(value: Condition) -> Self {
        FhirResource::Condition(value)
    }
}

impl From<MedicationStatement> for FhirResource {
    fn from(value: MedicationStatement) -> Self {
        FhirResource::MedicationStatement(value)
    }
}
