//! Per-patient bundle assembly.

use std::collections::{BTreeMap, BTreeSet};

use fhir_map::MappingTable;
use fhir_model::{
    Bundle, BundleEntry, FhirResource, PatientId, PatientRecord, derive_resource_id,
};
use tracing::{debug, trace};

use crate::builders::{Demographics, SourceField, build_field, build_patient};
use crate::context::BuildContext;
use crate::error::{BuildError, BundleError};

/// What happened to the fields of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Resources added to the patient's bundle.
    pub resources: usize,
    /// Fields folded into the Patient resource.
    pub demographics: usize,
    /// Fields that legitimately produced nothing (e.g. an unset flag).
    pub empty: usize,
    /// Fields skipped because they could not be built.
    pub errors: Vec<BuildError>,
    /// Built resources the bundle refused.
    pub rejected: Vec<BundleError>,
}

impl RecordOutcome {
    pub fn skipped(&self) -> usize {
        self.errors.len() + self.rejected.len()
    }
}

/// Everything collected for one patient so far.
#[derive(Debug, Default)]
struct PatientEntries {
    demographics: Demographics,
    resources: Vec<FhirResource>,
    ids: BTreeSet<String>,
}

/// Collects the resources of one dataset into one bundle per patient.
///
/// Resources keep production order: records in file order, fields in
/// column order. The Patient resource is built at [`BundleAssembler::finish`]
/// from the demographics seen across all of the patient's records.
#[derive(Debug)]
pub struct BundleAssembler {
    context: BuildContext,
    patients: BTreeMap<PatientId, PatientEntries>,
}

impl BundleAssembler {
    /// `dataset` replaces `context.dataset`; it names the resource ids.
    pub fn new(dataset: impl Into<String>, context: BuildContext) -> Self {
        let mut context = context;
        context.dataset = dataset.into();
        Self {
            context,
            patients: BTreeMap::new(),
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// Builds every field of `record` into the patient's bundle.
    ///
    /// Field-level failures never abort the record; they are returned in the
    /// outcome for the caller to report.
    pub fn add_record(&mut self, record: &PatientRecord, table: &MappingTable) -> RecordOutcome {
        let mut outcome = RecordOutcome::default();
        let patient_id = &record.patient_id;
        let entries = self.patients.entry(patient_id.clone()).or_default();
        let options = &self.context.options;

        for field in &record.fields {
            if options.is_demographic_column(&field.variable) {
                match entries
                    .demographics
                    .absorb(&field.variable, &field.value, options)
                {
                    Ok(_) => outcome.demographics += 1,
                    Err(error) => outcome.errors.push(error),
                }
                continue;
            }

            let Some(entry) = table.get(&field.variable) else {
                outcome.errors.push(BuildError::MappingLookup {
                    variable: field.variable.clone(),
                });
                continue;
            };

            if entry.category.is_patient_attribute() {
                // Mapped as demographic but not the configured age or sex column.
                debug!(variable = %field.variable, "demographic variable has no Patient element");
                outcome.empty += 1;
                continue;
            }

            let source = SourceField::new(patient_id, &field.variable, &field.value);
            match build_field(&source, entry, &self.context) {
                Ok(Some(resource)) => {
                    match push_resource(entries, &self.context, patient_id, &field.variable, resource)
                    {
                        Ok(()) => outcome.resources += 1,
                        Err(error) => outcome.rejected.push(error),
                    }
                }
                Ok(None) => outcome.empty += 1,
                Err(error) => outcome.errors.push(error),
            }
        }

        trace!(
            source = %record.source,
            line = record.line,
            resources = outcome.resources,
            skipped = outcome.skipped(),
            "record assembled"
        );
        outcome
    }

    /// Adds an already built resource to `patient_id`'s bundle.
    pub fn add_resource(
        &mut self,
        patient_id: &PatientId,
        resource: FhirResource,
    ) -> Result<(), BundleError> {
        let entries = self.patients.entry(patient_id.clone()).or_default();
        let key = resource.id().to_string();
        push_resource(entries, &self.context, patient_id, &key, resource)
    }

    /// Consumes the assembler, returning one bundle per patient ordered by
    /// patient id. The Patient resource is always the first entry.
    pub fn finish(self) -> Vec<Bundle> {
        let BundleAssembler { context, patients } = self;
        patients
            .into_iter()
            .map(|(patient_id, entries)| {
                let patient = build_patient(&patient_id, &entries.demographics, &context);
                let mut bundle = Bundle::collection(context.bundle_id(&patient_id), patient_id);
                bundle.entries.reserve(entries.resources.len() + 1);
                bundle
                    .entries
                    .push(entry_for(&context, FhirResource::Patient(patient)));
                bundle.entries.extend(
                    entries
                        .resources
                        .into_iter()
                        .map(|resource| entry_for(&context, resource)),
                );
                bundle
            })
            .collect()
    }
}

fn entry_for(context: &BuildContext, resource: FhirResource) -> BundleEntry {
    BundleEntry {
        full_url: context
            .options
            .full_url(resource.resource_type(), resource.id()),
        resource,
    }
}

/// Checks the one-patient invariant and required elements, then stores the
/// resource under an id unique within the bundle.
fn push_resource(
    entries: &mut PatientEntries,
    context: &BuildContext,
    patient_id: &PatientId,
    variable: &str,
    mut resource: FhirResource,
) -> Result<(), BundleError> {
    let expected = patient_id.reference();
    let reference = resource.patient_reference();
    if reference != expected.as_str() {
        return Err(BundleError::ForeignResource {
            resource_type: resource.resource_type(),
            id: resource.id().to_string(),
            reference: reference.into_owned(),
            expected,
        });
    }
    if !is_complete(&resource) {
        return Err(BundleError::Incomplete {
            resource_type: resource.resource_type(),
            id: resource.id().to_string(),
        });
    }

    // The same variable can occur more than once for a patient (long layout,
    // merged files); later occurrences get a counter in their id.
    let mut occurrence = 1u32;
    while entries.ids.contains(resource.id()) {
        occurrence += 1;
        let id = derive_resource_id(&[
            &context.dataset,
            patient_id.as_str(),
            variable,
            &occurrence.to_string(),
        ]);
        set_id(&mut resource, id);
    }

    entries.ids.insert(resource.id().to_string());
    entries.resources.push(resource);
    Ok(())
}

/// A resource must carry a code; an Observation also a value or a reason
/// for its absence.
fn is_complete(resource: &FhirResource) -> bool {
    match resource {
        FhirResource::Patient(_) => true,
        FhirResource::Observation(observation) => {
            !observation.code.coding.is_empty() && observation.has_result()
        }
        FhirResource::Condition(condition) => !condition.code.coding.is_empty(),
        FhirResource::MedicationStatement(statement) => {
            !statement.medication_codeable_concept.coding.is_empty()
        }
    }
}

fn set_id(resource: &mut FhirResource, id: String) {
    match resource {
        FhirResource::Patient(patient) => patient.id = id,
        FhirResource::Observation(observation) => observation.id = id,
        FhirResource::Condition(condition) => condition.id = id,
        FhirResource::MedicationStatement(statement) => statement.id = id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir_model::{
        BuildOptions, CodeSystem, CodeableConcept, MappingEntry, Observation, Reference,
        VariableCategory,
    };

    fn table() -> MappingTable {
        [
            MappingEntry::new(
                "HB",
                CodeSystem::Loinc,
                "718-7",
                "Hemoglobin",
                VariableCategory::LaboratoryValue,
            )
            .with_unit("g/dL"),
            MappingEntry::new(
                "CR1",
                CodeSystem::Snomed,
                "765205004",
                "Disorder in remission",
                VariableCategory::Remission,
            ),
        ]
        .into_iter()
        .collect()
    }

    fn assembler() -> BundleAssembler {
        BundleAssembler::new("ctab", BuildContext::new("", BuildOptions::default()))
    }

    #[test]
    fn outcome_counts_each_field_once() {
        let mut assembler = assembler();
        let record = PatientRecord::new(PatientId::new("1001").unwrap(), "ctab.csv", 2)
            .with_field("AGE", "51")
            .with_field("SEX", "f")
            .with_field("HB", "13,2")
            .with_field("CR1", "0")
            .with_field("PLT", "210");

        let outcome = assembler.add_record(&record, &table());
        assert_eq!(outcome.resources, 1);
        assert_eq!(outcome.demographics, 2);
        assert_eq!(outcome.empty, 1);
        assert_eq!(
            outcome.errors,
            vec![BuildError::MappingLookup {
                variable: "PLT".to_string()
            }]
        );
    }

    #[test]
    fn repeated_variable_gets_distinct_ids() {
        let mut assembler = assembler();
        let patient_id = PatientId::new("P001").unwrap();
        for value in ["13.2", "12.9"] {
            let record = PatientRecord::new(patient_id.clone(), "labs.csv", 2)
                .with_field("HB", value);
            assembler.add_record(&record, &table());
        }

        let bundles = assembler.finish();
        let ids: BTreeSet<&str> = bundles[0]
            .entries
            .iter()
            .map(|entry| entry.resource.id())
            .collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn foreign_resource_is_rejected() {
        let mut assembler = assembler();
        let observation = Observation::new(
            "obs-1",
            CodeableConcept::coded("http://loinc.org", "718-7", "Hemoglobin"),
            Reference::new("Patient/P999"),
        );

        let err = assembler
            .add_resource(&PatientId::new("P001").unwrap(), observation.into())
            .unwrap_err();
        assert!(matches!(err, BundleError::ForeignResource { .. }));
    }

    #[test]
    fn observation_without_result_is_incomplete() {
        let mut assembler = assembler();
        let observation = Observation::new(
            "obs-1",
            CodeableConcept::coded("http://loinc.org", "718-7", "Hemoglobin"),
            Reference::new("Patient/P001"),
        );

        let err = assembler
            .add_resource(&PatientId::new("P001").unwrap(), observation.into())
            .unwrap_err();
        assert!(matches!(err, BundleError::Incomplete { .. }));
    }
}
