#![deny(unsafe_code)]

use std::fmt;

use uuid::Uuid;

use crate::ModelError;

/// Maximum length of a FHIR logical id.
const FHIR_ID_MAX_LEN: usize = 64;

/// Hex digits kept by [`name_digest`].
const DIGEST_LEN: usize = 8;

fn is_fhir_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '.'
}

/// Subject identifier as found in the source data (e.g. `SUBJID`).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim().trim_matches('\u{feff}');
        if trimmed.is_empty() {
            return Err(ModelError::EmptyPatientId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as a FHIR logical id, `[A-Za-z0-9\-.]{1,64}`.
    ///
    /// Ids already in that alphabet are kept as they are. Otherwise every
    /// other character becomes `-` and [`name_digest`] of the source id is
    /// appended, so `AML_001` and `AML-001` stay distinct.
    pub fn fhir_id(&self) -> String {
        let fits = self.0.len() <= FHIR_ID_MAX_LEN && self.0.chars().all(is_fhir_id_char);
        if fits {
            return self.0.clone();
        }
        let mut id: String = self
            .0
            .chars()
            .map(|ch| if is_fhir_id_char(ch) { ch } else { '-' })
            .take(FHIR_ID_MAX_LEN - DIGEST_LEN - 1)
            .collect();
        id.push('-');
        id.push_str(&name_digest(&self.0));
        id
    }

    /// Relative literal reference to the Patient resource, `Patient/<id>`.
    pub fn reference(&self) -> String {
        format!("Patient/{}", self.fhir_id())
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Namespace for all name-based ids minted by this crate.
fn id_namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, b"urn:trial-fhir")
}

/// Short stable digest of `value`: the first hex digits of its UUIDv5.
///
/// Appended to names that had characters replaced, keeping them unique.
pub fn name_digest(value: &str) -> String {
    Uuid::new_v5(&id_namespace(), value.as_bytes())
        .simple()
        .to_string()
        .chars()
        .take(DIGEST_LEN)
        .collect()
}

/// Derives a stable resource id from its naming parts.
///
/// Deterministic: UUIDv5 over `parts` joined with NUL separators, so the same
/// dataset, patient and variable always yield the same id across runs.
pub fn derive_resource_id(parts: &[&str]) -> String {
    let mut name = Vec::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            name.push(0u8);
        }
        name.extend_from_slice(part.as_bytes());
    }
    Uuid::new_v5(&id_namespace(), &name).to_string()
}
