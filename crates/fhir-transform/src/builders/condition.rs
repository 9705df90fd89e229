//! Condition builders.

use fhir_model::{Annotation, CodeableConcept, Condition, FhirResource, MappingEntry, Narrative};

use crate::context::BuildContext;
use crate::error::BuildError;

use super::codes::{CONDITION_CATEGORY, CONDITION_CLINICAL, CONDITION_VERIFICATION};
use super::value::parse_flag;
use super::{SourceField, mapped_code};

type BuildResult = Result<Option<FhirResource>, BuildError>;

/// Diagnosis subtypes and their long forms.
const SUBTYPES: [(&str, &str); 4] = [
    ("de novo", "de novo"),
    ("sAML", "Secondary Acute Myeloid Leukemia (sAML)"),
    ("tAML", "Therapy-related acute myeloid leukemia (tAML)"),
    ("Unknown", "Unknown"),
];

fn base_condition(
    field: &SourceField<'_>,
    context: &BuildContext,
    clinical_status: CodeableConcept,
    code: CodeableConcept,
    text: String,
) -> Condition {
    Condition {
        id: context.resource_id(field.patient_id, field.variable),
        text: Some(Narrative::generated(&text)),
        clinical_status,
        verification_status: CodeableConcept::coded(CONDITION_VERIFICATION, "confirmed", "Confirmed"),
        category: vec![CodeableConcept::coded(
            CONDITION_CATEGORY,
            "encounter-diagnosis",
            "Encounter Diagnosis",
        )],
        code,
        subject: context.subject(field.patient_id),
        note: vec![Annotation::new(text)],
    }
}

fn active() -> CodeableConcept {
    CodeableConcept::coded(CONDITION_CLINICAL, "active", "Active")
}

/// Reads a presence flag. Missing counts as absent.
fn is_present(field: &SourceField<'_>) -> Result<bool, BuildError> {
    if field.is_missing() {
        return Ok(false);
    }
    parse_flag(field.raw()).ok_or_else(|| field.invalid("expected a yes/no flag"))
}

/// Primary diagnosis with its subtype. Always emitted; missing subtypes
/// become `Unknown`.
pub(super) fn build_diagnosis(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    let subtype = if field.is_missing() {
        "Unknown"
    } else {
        let raw = field.raw();
        SUBTYPES
            .iter()
            .find(|(short, _)| short.eq_ignore_ascii_case(raw))
            .map(|(_, long)| *long)
            .ok_or_else(|| field.invalid("unknown diagnosis subtype"))?
    };

    let condition = base_condition(
        field,
        context,
        active(),
        mapped_code(entry).with_text(format!("{}, subtype: {subtype}", entry.display)),
        format!("Patient diagnosed with {}, subtype: {subtype}.", entry.display),
    );
    Ok(Some(condition.into()))
}

/// Remission achieved. Emitted only when the flag is set.
pub(super) fn build_remission(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    if !is_present(field)? {
        return Ok(None);
    }
    let description = entry.description();
    let condition = base_condition(
        field,
        context,
        CodeableConcept::coded(CONDITION_CLINICAL, "remission", "Remission")
            .with_text(description),
        mapped_code(entry).with_text(description),
        format!("Patient achieved {description}."),
    );
    Ok(Some(condition.into()))
}

/// Yes/no condition flag. Emitted only when the flag is set.
pub(super) fn build_condition(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    if !is_present(field)? {
        return Ok(None);
    }
    let description = entry.description();
    let condition = base_condition(
        field,
        context,
        active(),
        mapped_code(entry).with_text(description),
        format!("Patient diagnosed with {description}."),
    );
    Ok(Some(condition.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir_model::{BuildOptions, CodeSystem, PatientId, VariableCategory};

    fn context() -> BuildContext {
        BuildContext::new("ctab", BuildOptions::default())
    }

    fn aml() -> MappingEntry {
        MappingEntry::new(
            "AMLSTAT",
            CodeSystem::Snomed,
            "91861009",
            "Acute myeloid leukemia",
            VariableCategory::Diagnosis,
        )
    }

    fn condition(resource: Option<FhirResource>) -> Condition {
        match resource {
            Some(FhirResource::Condition(condition)) => condition,
            other => panic!("expected a Condition, got {other:?}"),
        }
    }

    #[test]
    fn diagnosis_expands_subtype() {
        let patient = PatientId::new("1001").unwrap();
        let field = SourceField::new(&patient, "AMLSTAT", "sAML");

        let cond = condition(build_diagnosis(&field, &aml(), &context()).unwrap());
        assert_eq!(cond.code.first_code(), Some("91861009"));
        assert_eq!(
            cond.code.text.as_deref(),
            Some("Acute myeloid leukemia, subtype: Secondary Acute Myeloid Leukemia (sAML)")
        );
        assert_eq!(cond.clinical_status.first_code(), Some("active"));
        assert_eq!(cond.subject.reference, "Patient/1001");
    }

    #[test]
    fn diagnosis_without_value_is_unknown() {
        let patient = PatientId::new("1001").unwrap();
        let field = SourceField::new(&patient, "AMLSTAT", "NA");

        let cond = condition(build_diagnosis(&field, &aml(), &context()).unwrap());
        assert!(cond.code.text.unwrap().ends_with("subtype: Unknown"));
    }

    #[test]
    fn diagnosis_rejects_unlisted_subtype() {
        let patient = PatientId::new("1001").unwrap();
        let field = SourceField::new(&patient, "AMLSTAT", "APL");

        assert!(matches!(
            build_diagnosis(&field, &aml(), &context()),
            Err(BuildError::InvalidValue { .. })
        ));
    }

    #[test]
    fn remission_only_when_achieved() {
        let entry = MappingEntry::new(
            "CR1",
            CodeSystem::Snomed,
            "765205004",
            "Disorder in remission",
            VariableCategory::Remission,
        )
        .with_label("First Complete Remission (CR1)");
        let patient = PatientId::new("1001").unwrap();

        let achieved = condition(
            build_remission(&SourceField::new(&patient, "CR1", "1"), &entry, &context()).unwrap(),
        );
        assert_eq!(achieved.clinical_status.first_code(), Some("remission"));
        assert_eq!(achieved.code.first_code(), Some("765205004"));

        let not_achieved =
            build_remission(&SourceField::new(&patient, "CR1", "0"), &entry, &context()).unwrap();
        assert!(not_achieved.is_none());
        let missing =
            build_remission(&SourceField::new(&patient, "CR1", ""), &entry, &context()).unwrap();
        assert!(missing.is_none());
    }
}
