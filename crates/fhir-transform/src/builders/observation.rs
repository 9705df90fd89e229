//! Observation builders.

use fhir_model::{
    Annotation, CodeableConcept, FhirResource, MappingEntry, Narrative, Observation,
    ObservationValue, Quantity,
};

use crate::context::BuildContext;
use crate::error::BuildError;

use super::codes::{
    ALIVE, DATA_ABSENT_REASON, DEAD, DEFAULT_TIME_UNIT, DETECTED, NOT_DETECTED,
    OBSERVATION_CATEGORY, OBSERVATION_INTERPRETATION, SNOMED,
};
use super::value::{parse_decimal, parse_flag};
use super::{SourceField, mapped_code};

type BuildResult = Result<Option<FhirResource>, BuildError>;

fn base_observation(
    field: &SourceField<'_>,
    context: &BuildContext,
    code: CodeableConcept,
) -> Observation {
    Observation::new(
        context.resource_id(field.patient_id, field.variable),
        code,
        context.subject(field.patient_id),
    )
}

fn category(code: &str, display: &str) -> CodeableConcept {
    CodeableConcept::coded(OBSERVATION_CATEGORY, code, display)
}

fn interpretation(code: &str, display: &str) -> CodeableConcept {
    CodeableConcept::coded(OBSERVATION_INTERPRETATION, code, display)
}

/// Finishes an observation whose source value is missing or unusable.
fn absent(mut observation: Observation, entry: &MappingEntry) -> BuildResult {
    observation.data_absent_reason = Some(CodeableConcept::coded(
        DATA_ABSENT_REASON,
        "unknown",
        "Unknown",
    ));
    observation.text = Some(Narrative::generated(&format!(
        "{}: no value recorded.",
        entry.description()
    )));
    Ok(Some(observation.into()))
}

/// Quantity in the mapping entry's unit, unitless when none is mapped.
fn quantity_for(value: f64, entry: &MappingEntry) -> Quantity {
    match entry.ucum_code() {
        Some(code) => Quantity::ucum(value, entry.unit.as_deref().unwrap_or(code), code),
        None => Quantity::unitless(value),
    }
}

fn describe_quantity(quantity: &Quantity) -> String {
    match &quantity.unit {
        Some(unit) => format!("{} {unit}", quantity.value),
        None => quantity.value.to_string(),
    }
}

pub(super) fn build_laboratory_value(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    let mut observation = base_observation(
        field,
        context,
        mapped_code(entry).with_text(entry.description()),
    );
    observation.category = vec![category("laboratory", "Laboratory")];
    if field.is_missing() {
        return absent(observation, entry);
    }

    let value = parse_decimal(field.raw()).ok_or_else(|| field.invalid("not a number"))?;
    let quantity = quantity_for(value, entry);
    observation.text = Some(Narrative::generated(&format!(
        "{}: {}.",
        entry.description(),
        describe_quantity(&quantity)
    )));
    observation.set_value(ObservationValue::Quantity(quantity));
    Ok(Some(observation.into()))
}

/// Molecular genetics and cytogenetics: was the finding detected?
///
/// Values other than a yes/no flag are recorded as unknown rather than
/// rejected; the source data uses free codes for "not examined".
pub(super) fn build_detection(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    let text = format!(
        "{} [{};{}]",
        field.variable,
        entry.category,
        entry.description()
    );
    let mut observation = base_observation(field, context, mapped_code(entry).with_text(text));
    observation.category = vec![category("laboratory", "Laboratory")];

    let detected = if field.is_missing() {
        None
    } else {
        parse_flag(field.raw())
    };
    let Some(detected) = detected else {
        return absent(observation, entry);
    };

    let ((code, display), (flag, flag_display)) = if detected {
        (DETECTED, ("POS", "Positive"))
    } else {
        (NOT_DETECTED, ("NEG", "Negative"))
    };
    observation.set_value(ObservationValue::CodeableConcept(CodeableConcept::coded(
        SNOMED, code, display,
    )));
    observation.interpretation = vec![interpretation(flag, flag_display)];
    observation.text = Some(Narrative::generated(&format!(
        "{} ({}): {display}.",
        entry.description(),
        field.variable
    )));
    Ok(Some(observation.into()))
}

/// Which karyotype a set flag stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KaryotypeFlag {
    Complex,
    Normal,
}

fn karyotype(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
    flag: KaryotypeFlag,
) -> BuildResult {
    let mut observation = base_observation(
        field,
        context,
        mapped_code(entry)
            .with_text("Test whether the cytogenetic karyotype is normal or complex (abnormal)"),
    );
    observation.category = vec![category("laboratory", "Laboratory")];
    if field.is_missing() {
        return absent(observation, entry);
    }

    let set = parse_flag(field.raw()).ok_or_else(|| field.invalid("expected a yes/no flag"))?;
    let (text, code, code_display) = match (flag, set) {
        (KaryotypeFlag::Complex, true) => ("Complex karyotype observed", "A", "Abnormal"),
        (KaryotypeFlag::Normal, false) => ("Abnormal karyotype observed", "A", "Abnormal"),
        (KaryotypeFlag::Complex, false) | (KaryotypeFlag::Normal, true) => {
            ("Normal karyotype observed", "N", "Normal")
        }
    };
    observation.set_value(ObservationValue::String(text.to_string()));
    observation.interpretation = vec![interpretation(code, code_display)];
    observation.text = Some(Narrative::generated(&format!("{text}.")));
    Ok(Some(observation.into()))
}

/// Complex karyotype flag (e.g. `CGCX`).
pub(super) fn build_karyotype(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    karyotype(field, entry, context, KaryotypeFlag::Complex)
}

/// Normal karyotype flag (e.g. `CGNK`).
pub(super) fn build_normal_karyotype(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    karyotype(field, entry, context, KaryotypeFlag::Normal)
}

/// Binary outcome with a note. `describe` gives the interpretation and the
/// note text for the parsed flag.
fn outcome_status(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
    describe: fn(bool, &str) -> (CodeableConcept, String),
) -> BuildResult {
    let label = format!("{} ({})", entry.description(), field.variable);
    let mut observation =
        base_observation(field, context, mapped_code(entry).with_text(label.clone()));
    observation.category = vec![category("survey", "Survey")];
    if field.is_missing() {
        return absent(observation, entry);
    }

    let occurred = parse_flag(field.raw()).ok_or_else(|| field.invalid("expected a yes/no flag"))?;
    let (summary, text) = describe(occurred, &label);
    observation.set_value(ObservationValue::Boolean(occurred));
    observation.interpretation = vec![summary];
    observation.text = Some(Narrative::generated(&text));
    observation.note = vec![Annotation::new(text)];
    Ok(Some(observation.into()))
}

/// Binary outcome such as relapse or any event (EFS).
pub(super) fn build_event_status(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    outcome_status(field, entry, context, |occurred, label| {
        if occurred {
            (
                CodeableConcept::text_only("Event occurred"),
                format!("Event: {label} occurred during this study."),
            )
        } else {
            (
                CodeableConcept::text_only("No event (censored)"),
                format!(
                    "Event: {label} did not occur until the end of the study period \
                     or loss to follow-up (censored)."
                ),
            )
        }
    })
}

/// Death flag of overall survival (e.g. `OSSTAT`): interpretation is SNOMED
/// Dead or Alive.
pub(super) fn build_survival_status(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    outcome_status(field, entry, context, |died, label| {
        let (code, display) = if died { DEAD } else { ALIVE };
        let text = if died {
            format!("Event: {label}. The patient died during this study.")
        } else {
            format!(
                "Event: {label}. The patient was alive at the end of the study period \
                 or at loss to follow-up (censored)."
            )
        };
        (CodeableConcept::coded(SNOMED, code, display), text)
    })
}

/// Time from study start to an outcome event.
pub(super) fn build_event_time(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    let label = format!("{} ({})", entry.description(), field.variable);
    let mut observation =
        base_observation(field, context, mapped_code(entry).with_text(label.clone()));
    observation.category = vec![category("survey", "Survey")];
    if field.is_missing() {
        return absent(observation, entry);
    }

    let value = parse_decimal(field.raw()).ok_or_else(|| field.invalid("not a number"))?;
    let quantity = match entry.ucum_code() {
        Some(_) => quantity_for(value, entry),
        None => Quantity::ucum(value, DEFAULT_TIME_UNIT.0, DEFAULT_TIME_UNIT.1),
    };
    let text = format!(
        "{label}: {} from the start of the study until the event or censoring.",
        describe_quantity(&quantity)
    );
    observation.set_value(ObservationValue::Quantity(quantity));
    observation.text = Some(Narrative::generated(&text));
    observation.note = vec![Annotation::new(text)];
    Ok(Some(observation.into()))
}

/// Fallback: numeric values become quantities, anything else free text.
pub(super) fn build_observation(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> BuildResult {
    let mut observation = base_observation(
        field,
        context,
        mapped_code(entry).with_text(entry.description()),
    );
    if field.is_missing() {
        return absent(observation, entry);
    }

    let value = match parse_decimal(field.raw()) {
        Some(number) => ObservationValue::Quantity(quantity_for(number, entry)),
        None => ObservationValue::String(field.raw().to_string()),
    };
    let shown = match &value {
        ObservationValue::Quantity(quantity) => describe_quantity(quantity),
        _ => field.raw().to_string(),
    };
    observation.text = Some(Narrative::generated(&format!(
        "{}: {shown}.",
        entry.description()
    )));
    observation.set_value(value);
    Ok(Some(observation.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir_model::{BuildOptions, CodeSystem, PatientId, VariableCategory};

    fn context() -> BuildContext {
        BuildContext::new("ctab", BuildOptions::default())
    }

    fn observation(resource: Option<FhirResource>) -> Observation {
        match resource {
            Some(FhirResource::Observation(observation)) => observation,
            other => panic!("expected an Observation, got {other:?}"),
        }
    }

    #[test]
    fn laboratory_value_uses_mapped_unit() {
        let entry = MappingEntry::new(
            "WBC",
            CodeSystem::Loinc,
            "6690-2",
            "Leukocytes [#/volume] in Blood",
            VariableCategory::LaboratoryValue,
        )
        .with_unit("10^6/L")
        .with_unit_code("10*6/L");
        let patient = PatientId::new("1001").unwrap();
        let field = SourceField::new(&patient, "WBC", "4,7");

        let obs = observation(build_laboratory_value(&field, &entry, &context()).unwrap());
        let quantity = obs.value_quantity.unwrap();
        assert_eq!(quantity.value, 4.7);
        assert_eq!(quantity.unit.as_deref(), Some("10^6/L"));
        assert_eq!(quantity.code.as_deref(), Some("10*6/L"));
        assert_eq!(obs.category[0].first_code(), Some("laboratory"));
    }

    #[test]
    fn laboratory_value_rejects_text() {
        let entry = MappingEntry::new(
            "HB",
            CodeSystem::Loinc,
            "718-7",
            "Hemoglobin",
            VariableCategory::LaboratoryValue,
        );
        let patient = PatientId::new("1001").unwrap();
        let field = SourceField::new(&patient, "HB", "high");

        let err = build_laboratory_value(&field, &entry, &context()).unwrap_err();
        assert_eq!(err, BuildError::invalid("HB", "high", "not a number"));
    }

    #[test]
    fn detection_maps_flags_and_unknowns() {
        let entry = MappingEntry::new(
            "NPM1",
            CodeSystem::Snomed,
            "445207003",
            "NPM1 gene mutation",
            VariableCategory::MolecularGenetics,
        )
        .with_label("NPM1 mutation");
        let patient = PatientId::new("1001").unwrap();

        let detected = observation(
            build_detection(&SourceField::new(&patient, "NPM1", "1"), &entry, &context()).unwrap(),
        );
        assert_eq!(
            detected.value_codeable_concept.unwrap().first_code(),
            Some("260373001")
        );
        assert_eq!(detected.interpretation[0].first_code(), Some("POS"));
        assert_eq!(
            detected.code.text.as_deref(),
            Some("NPM1 [molecular genetics;NPM1 mutation]")
        );

        let negative = observation(
            build_detection(&SourceField::new(&patient, "NPM1", "0"), &entry, &context()).unwrap(),
        );
        assert_eq!(negative.interpretation[0].first_code(), Some("NEG"));

        let unknown = observation(
            build_detection(&SourceField::new(&patient, "NPM1", "9"), &entry, &context()).unwrap(),
        );
        assert!(unknown.value().is_none());
        assert_eq!(
            unknown.data_absent_reason.unwrap().first_code(),
            Some("unknown")
        );
    }

    fn flag_entry(variable: &str, category: VariableCategory) -> MappingEntry {
        MappingEntry::new(variable, CodeSystem::Snomed, "1", "Flag", category)
    }

    fn build(
        builder: fn(&SourceField<'_>, &MappingEntry, &BuildContext) -> BuildResult,
        entry: &MappingEntry,
        value: &str,
    ) -> BuildResult {
        let patient = PatientId::new("1001").unwrap();
        builder(
            &SourceField::new(&patient, &entry.source_variable, value),
            entry,
            &context(),
        )
    }

    #[test]
    fn complex_karyotype_flag() {
        let entry = flag_entry("CGCX", VariableCategory::Karyotype);

        let complex = observation(build(build_karyotype, &entry, "1").unwrap());
        assert_eq!(
            complex.value_string.as_deref(),
            Some("Complex karyotype observed")
        );
        assert_eq!(complex.interpretation[0].first_code(), Some("A"));
        assert_eq!(complex.category[0].first_code(), Some("laboratory"));

        let normal = observation(build(build_karyotype, &entry, "0").unwrap());
        assert_eq!(normal.value_string.as_deref(), Some("Normal karyotype observed"));
        assert_eq!(normal.interpretation[0].first_code(), Some("N"));

        let missing = observation(build(build_karyotype, &entry, "NA").unwrap());
        assert!(missing.value().is_none());
        assert!(missing.interpretation.is_empty());
        assert_eq!(
            missing.data_absent_reason.unwrap().first_code(),
            Some("unknown")
        );

        let err = build(build_karyotype, &entry, "7").unwrap_err();
        assert_eq!(err, BuildError::invalid("CGCX", "7", "expected a yes/no flag"));
    }

    #[test]
    fn normal_karyotype_flag_agrees_with_complex_flag() {
        let complex = flag_entry("CGCX", VariableCategory::Karyotype);
        let normal = flag_entry("CGNK", VariableCategory::NormalKaryotype);

        // A normal karyotype is recorded as CGCX=0, CGNK=1.
        let from_complex = observation(build(build_karyotype, &complex, "0").unwrap());
        let from_normal = observation(build(build_normal_karyotype, &normal, "1").unwrap());
        assert_eq!(from_normal.value_string, from_complex.value_string);
        assert_eq!(from_normal.interpretation, from_complex.interpretation);

        let abnormal = observation(build(build_normal_karyotype, &normal, "no").unwrap());
        assert_eq!(
            abnormal.value_string.as_deref(),
            Some("Abnormal karyotype observed")
        );
        assert_eq!(abnormal.interpretation[0].first_code(), Some("A"));

        let missing = observation(build(build_normal_karyotype, &normal, "").unwrap());
        assert!(missing.data_absent_reason.is_some());
        assert!(build(build_normal_karyotype, &normal, "maybe").is_err());
    }

    #[test]
    fn event_status_records_flag_and_note() {
        let entry =
            flag_entry("EFSSTAT", VariableCategory::EventStatus).with_label("Event-free survival");

        let occurred = observation(build(build_event_status, &entry, "1").unwrap());
        assert_eq!(occurred.value_boolean, Some(true));
        assert_eq!(occurred.category[0].first_code(), Some("survey"));
        assert_eq!(
            occurred.interpretation[0].text.as_deref(),
            Some("Event occurred")
        );
        assert_eq!(
            occurred.note[0].text,
            "Event: Event-free survival (EFSSTAT) occurred during this study."
        );
        assert_eq!(
            occurred.code.text.as_deref(),
            Some("Event-free survival (EFSSTAT)")
        );

        let censored = observation(build(build_event_status, &entry, "0").unwrap());
        assert_eq!(censored.value_boolean, Some(false));
        assert_eq!(
            censored.interpretation[0].text.as_deref(),
            Some("No event (censored)")
        );
        assert!(censored.note[0].text.contains("(censored)"));

        let missing = observation(build(build_event_status, &entry, "NaN").unwrap());
        assert_eq!(missing.value_boolean, None);
        assert!(missing.note.is_empty());
        assert!(missing.data_absent_reason.is_some());

        let err = build(build_event_status, &entry, "2").unwrap_err();
        assert_eq!(err, BuildError::invalid("EFSSTAT", "2", "expected a yes/no flag"));
    }

    #[test]
    fn survival_status_is_coded_alive_or_dead() {
        let entry = flag_entry("OSSTAT", VariableCategory::SurvivalStatus);

        let dead = observation(build(build_survival_status, &entry, "1").unwrap());
        assert_eq!(dead.value_boolean, Some(true));
        assert_eq!(dead.interpretation[0].first_code(), Some("419099009"));
        assert!(dead.note[0].text.contains("died"));

        let alive = observation(build(build_survival_status, &entry, "0").unwrap());
        assert_eq!(alive.value_boolean, Some(false));
        assert_eq!(alive.interpretation[0].first_code(), Some("438949009"));
        assert_eq!(alive.interpretation[0].coding[0].system, SNOMED);

        assert!(observation(build(build_survival_status, &entry, ".").unwrap())
            .data_absent_reason
            .is_some());
        assert!(build(build_survival_status, &entry, "alive").is_err());
    }

    #[test]
    fn event_time_defaults_to_months() {
        let entry = MappingEntry::new(
            "OSTM",
            CodeSystem::Snomed,
            "445320007",
            "Survival time",
            VariableCategory::EventTime,
        );
        let patient = PatientId::new("1001").unwrap();
        let field = SourceField::new(&patient, "OSTM", "12,5");

        let obs = observation(build_event_time(&field, &entry, &context()).unwrap());
        let quantity = obs.value_quantity.unwrap();
        assert_eq!(quantity.value, 12.5);
        assert_eq!(quantity.code.as_deref(), Some("mo"));
        assert_eq!(obs.category[0].first_code(), Some("survey"));
        assert_eq!(obs.note.len(), 1);
    }

    #[test]
    fn generic_observation_keeps_text_values() {
        let entry = MappingEntry::new(
            "ECOG",
            CodeSystem::Loinc,
            "89247-1",
            "ECOG Performance Status score",
            VariableCategory::Observation,
        );
        let patient = PatientId::new("1001").unwrap();

        let text = observation(
            build_observation(&SourceField::new(&patient, "ECOG", "ambulatory"), &entry, &context())
                .unwrap(),
        );
        assert_eq!(text.value_string.as_deref(), Some("ambulatory"));
        assert!(text.category.is_empty());

        let number = observation(
            build_observation(&SourceField::new(&patient, "ECOG", "2"), &entry, &context())
                .unwrap(),
        );
        assert_eq!(number.value_quantity.unwrap().value, 2.0);
    }
}
