//! Configuration options for resource building.

use serde::{Deserialize, Serialize};

/// Default base for `Bundle.entry.fullUrl`.
pub const DEFAULT_BASE_URL: &str = "https://example.org/fhir";

/// Year ages are counted back from when approximating a birth date.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2010;

/// Options controlling how records become FHIR resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Base URL used to form entry `fullUrl`s (`<base>/<Type>/<id>`).
    pub base_url: String,

    /// Reference year for birth-date approximation.
    ///
    /// Source data only carries the age at inclusion; the birth date is set
    /// to January 1 of `reference_year - age`.
    pub reference_year: i32,

    /// Column holding the patient's age in years.
    pub age_column: String,

    /// Column holding the patient's sex (`m`/`f`).
    pub sex_column: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            reference_year: DEFAULT_REFERENCE_YEAR,
            age_column: "AGE".to_string(),
            sex_column: "SEX".to_string(),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Returns true if `variable` is consumed by the Patient resource.
    pub fn is_demographic_column(&self, variable: &str) -> bool {
        variable.eq_ignore_ascii_case(&self.age_column)
            || variable.eq_ignore_ascii_case(&self.sex_column)
    }

    /// `fullUrl` for a resource of `resource_type` with logical `id`.
    pub fn full_url(&self, resource_type: &str, id: &str) -> String {
        format!(
            "{}/{resource_type}/{id}",
            self.base_url.trim_end_matches('/')
        )
    }
}
