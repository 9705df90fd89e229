//! Per-patient FHIR Bundle.

use serde::{Deserialize, Serialize};

use crate::ids::PatientId;
use crate::resource::FhirResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleResourceType {
    Bundle,
}

/// [Bundle.type](<https://hl7.org/fhir/R4/valueset-bundle-type.html>)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    Collection,
}

/// One `Bundle.entry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: FhirResource,
}

/// A collection bundle holding every resource produced for one patient.
///
/// Invariant: every entry's patient reference equals `Patient/<patient_id>`.
/// The assembler enforces it; `patient_id` itself is not serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    pub resource_type: BundleResourceType,
    pub id: String,
    #[serde(rename = "type")]
    pub bundle_type: BundleType,
    #[serde(rename = "entry", default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<BundleEntry>,
    #[serde(skip)]
    pub patient_id: Option<PatientId>,
}

impl Bundle {
    /// An empty collection bundle for `patient_id`.
    pub fn collection(id: impl Into<String>, patient_id: PatientId) -> Self {
        Self {
            resource_type: BundleResourceType::Bundle,
            id: id.into(),
            bundle_type: BundleType::Collection,
            entries: Vec::new(),
            patient_id: Some(patient_id),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resource type names in entry order.
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .map(|entry| entry.resource.resource_type())
            .collect()
    }

    /// Checks that every entry belongs to the bundle's patient.
    pub fn is_single_patient(&self) -> bool {
        let Some(patient_id) = &self.patient_id else {
            return false;
        };
        let expected = patient_id.reference();
        self.entries
            .iter()
            .all(|entry| entry.resource.patient_reference() == expected.as_str())
    }
}
