//! Patient builder.
//!
//! Source data carries no birth date, only the age at inclusion. The birth
//! date is approximated as January 1 of `reference_year - age` and the
//! narrative says so.

use chrono::NaiveDate;
use fhir_model::{
    AdministrativeGender, BuildOptions, Identifier, Narrative, Patient, PatientId,
    is_missing_value,
};

use crate::context::BuildContext;
use crate::error::BuildError;

use super::codes::SOURCE_SUBJECT_ID;
use super::value::parse_decimal;

const MAX_AGE: f64 = 150.0;

/// Demographic values collected across a patient's records.
///
/// The first valid value of each attribute wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demographics {
    /// Age in whole years.
    pub age: Option<i32>,
    pub gender: Option<AdministrativeGender>,
}

impl Demographics {
    /// Records `value` if `variable` is the age or sex column.
    ///
    /// Returns `Ok(false)` when the variable is not a demographic column.
    /// Missing values are accepted and ignored.
    pub fn absorb(
        &mut self,
        variable: &str,
        value: &str,
        options: &BuildOptions,
    ) -> Result<bool, BuildError> {
        let is_age = variable.eq_ignore_ascii_case(&options.age_column);
        if !is_age && !variable.eq_ignore_ascii_case(&options.sex_column) {
            return Ok(false);
        }
        if is_missing_value(value) {
            return Ok(true);
        }

        if is_age {
            let age = parse_age(value).ok_or_else(|| {
                BuildError::invalid(variable, value, "age is not a whole number of years")
            })?;
            self.age.get_or_insert(age);
        } else {
            let gender =
                parse_gender(value).ok_or_else(|| BuildError::invalid(variable, value, "unknown sex"))?;
            self.gender.get_or_insert(gender);
        }
        Ok(true)
    }
}

fn parse_gender(raw: &str) -> Option<AdministrativeGender> {
    match raw.trim().to_lowercase().as_str() {
        "m" | "male" => Some(AdministrativeGender::Male),
        "f" | "female" => Some(AdministrativeGender::Female),
        "o" | "other" => Some(AdministrativeGender::Other),
        "u" | "unknown" => Some(AdministrativeGender::Unknown),
        _ => None,
    }
}

/// Whole years, accepting `51` as well as `51.0`.
fn parse_age(raw: &str) -> Option<i32> {
    let value = parse_decimal(raw)?;
    if !(0.0..=MAX_AGE).contains(&value) || value.fract() != 0.0 {
        return None;
    }
    Some(value as i32)
}

/// Builds the Patient resource of a bundle.
pub fn build_patient(
    patient_id: &PatientId,
    demographics: &Demographics,
    context: &BuildContext,
) -> Patient {
    let reference_year = context.options.reference_year;
    let birth_date = demographics
        .age
        .and_then(|age| reference_year.checked_sub(age))
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .map(|date| date.format("%Y-%m-%d").to_string());

    let source_note = format!("In the source system the id was '{}'.", patient_id.as_str());
    let text = match (demographics.age, &birth_date) {
        (Some(age), Some(_)) => format!(
            "Birthdate is approximated based on the given age of {age} calculated from a \
             hypothetical date of January 1, {reference_year}, due to the original birthdate \
             being unknown. {source_note}"
        ),
        _ => source_note,
    };

    Patient {
        id: patient_id.fhir_id(),
        text: Some(Narrative::generated(&text)),
        identifier: vec![Identifier {
            use_: Some("usual".to_string()),
            system: Some(SOURCE_SUBJECT_ID.to_string()),
            value: patient_id.as_str().to_string(),
        }],
        gender: demographics.gender,
        birth_date,
    }
}
