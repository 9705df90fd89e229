//! MedicationStatement builder.

use fhir_model::{
    Dosage, DoseAndRate, FhirResource, MappingEntry, MedicationStatement,
    MedicationStatementStatus, Narrative, Quantity,
};

use crate::context::BuildContext;
use crate::error::BuildError;

use super::value::{parse_decimal, parse_flag};
use super::{SourceField, mapped_code};

/// Medication received.
///
/// A yes/no flag gives `completed` or `not-taken`; a number is taken as the
/// dose, in the mapped unit when there is one. Missing values emit nothing.
pub(super) fn build_medication(
    field: &SourceField<'_>,
    entry: &MappingEntry,
    context: &BuildContext,
) -> Result<Option<FhirResource>, BuildError> {
    if field.is_missing() {
        return Ok(None);
    }
    let raw = field.raw();
    let description = entry.description();

    let (status, dosage, text) = if let Some(taken) = parse_flag(raw) {
        if taken {
            (
                MedicationStatementStatus::Completed,
                Vec::new(),
                format!("{description} was administered."),
            )
        } else {
            (
                MedicationStatementStatus::NotTaken,
                Vec::new(),
                format!("{description} was not administered."),
            )
        }
    } else {
        let amount = parse_decimal(raw).ok_or_else(|| field.invalid("unknown medication flag"))?;
        let dose = match entry.ucum_code() {
            Some(code) => Quantity::ucum(amount, entry.unit.as_deref().unwrap_or(code), code),
            None => Quantity::unitless(amount),
        };
        let shown = match &dose.unit {
            Some(unit) => format!("{amount} {unit}"),
            None => amount.to_string(),
        };
        (
            MedicationStatementStatus::Completed,
            vec![Dosage {
                text: Some(shown.clone()),
                dose_and_rate: vec![DoseAndRate {
                    dose_quantity: dose,
                }],
            }],
            format!("{description} was administered, dose {shown}."),
        )
    };

    let statement = MedicationStatement {
        id: context.resource_id(field.patient_id, field.variable),
        text: Some(Narrative::generated(&text)),
        status,
        medication_codeable_concept: mapped_code(entry).with_text(description),
        subject: context.subject(field.patient_id),
        dosage,
        note: Vec::new(),
    };
    Ok(Some(statement.into()))
}
