//! Integration tests for turning records into per-patient bundles.

use fhir_map::MappingTable;
use fhir_model::{
    BuildOptions, CodeSystem, FhirResource, MappingEntry, PatientId, PatientRecord,
    VariableCategory,
};
use fhir_transform::{BuildContext, BuildError, BundleAssembler};

fn aml_table() -> MappingTable {
    [
        MappingEntry::new(
            "HGB",
            CodeSystem::Loinc,
            "718-7",
            "Hemoglobin",
            VariableCategory::LaboratoryValue,
        )
        .with_unit("g/dL"),
        MappingEntry::new(
            "AMLSTAT",
            CodeSystem::Snomed,
            "91861009",
            "Acute myeloid leukemia",
            VariableCategory::Diagnosis,
        ),
        MappingEntry::new(
            "CR1",
            CodeSystem::Snomed,
            "765205004",
            "Disorder in remission",
            VariableCategory::Remission,
        ),
        MappingEntry::new(
            "OSSTAT",
            CodeSystem::Snomed,
            "278844005",
            "General clinical state",
            VariableCategory::EventStatus,
        )
        .with_label("Overall Survival Status"),
        MappingEntry::new(
            "NPM1",
            CodeSystem::Snomed,
            "445207003",
            "NPM1 gene mutation",
            VariableCategory::MolecularGenetics,
        ),
    ]
    .into_iter()
    .collect()
}

fn assembler() -> BundleAssembler {
    BundleAssembler::new("trial", BuildContext::new("trial", BuildOptions::default()))
}

fn record(patient: &str, line: u64) -> PatientRecord {
    PatientRecord::new(PatientId::new(patient).unwrap(), "trial.csv", line)
}

#[test]
fn hemoglobin_row_becomes_lab_observation() {
    let mut assembler = assembler();
    let outcome = assembler.add_record(&record("P001", 2).with_field("HGB", "13.2"), &aml_table());
    assert_eq!(outcome.resources, 1);

    let bundles = assembler.finish();
    assert_eq!(bundles.len(), 1);
    let bundle = &bundles[0];
    assert_eq!(bundle.resource_types(), vec!["Patient", "Observation"]);
    assert_eq!(
        bundle.entries[0].full_url,
        "https://example.org/fhir/Patient/P001"
    );

    let observation = &bundle.entries[1].resource;
    let FhirResource::Observation(obs) = observation else {
        panic!("expected an Observation");
    };
    assert_eq!(obs.code.first_code(), Some("718-7"));
    assert_eq!(obs.subject.reference, "Patient/P001");
    let quantity = obs.value_quantity.as_ref().unwrap();
    assert_eq!(quantity.value, 13.2);
    assert_eq!(quantity.unit.as_deref(), Some("g/dL"));

    insta::assert_json_snapshot!(observation, @r###"
    {
      "resourceType": "Observation",
      "id": "00670f2d-d9a8-5ec8-8726-30cf4bad5284",
      "text": {
        "status": "generated",
        "div": "<div xmlns=\"http://www.w3.org/1999/xhtml\">Hemoglobin: 13.2 g/dL.</div>"
      },
      "status": "final",
      "category": [
        {
          "coding": [
            {
              "system": "http://terminology.hl7.org/CodeSystem/observation-category",
              "code": "laboratory",
              "display": "Laboratory"
            }
          ]
        }
      ],
      "code": {
        "coding": [
          {
            "system": "http://loinc.org",
            "code": "718-7",
            "display": "Hemoglobin"
          }
        ],
        "text": "Hemoglobin"
      },
      "subject": {
        "reference": "Patient/P001"
      },
      "valueQuantity": {
        "value": 13.2,
        "unit": "g/dL",
        "system": "http://unitsofmeasure.org",
        "code": "g/dL"
      }
    }
    "###);
}

#[test]
fn every_patient_gets_exactly_one_bundle() {
    let mut assembler = assembler();
    let table = aml_table();
    let rows = [
        ("P002", "HGB", "11.0"),
        ("P001", "HGB", "13.2"),
        ("P002", "CR1", "1"),
        ("P003", "AMLSTAT", "tAML"),
        ("P001", "NPM1", "0"),
    ];
    for (line, (patient, variable, value)) in rows.iter().enumerate() {
        assembler.add_record(
            &record(patient, line as u64 + 2).with_field(*variable, *value),
            &table,
        );
    }
    assert_eq!(assembler.patient_count(), 3);

    let bundles = assembler.finish();
    let patients: Vec<&str> = bundles
        .iter()
        .map(|bundle| bundle.patient_id.as_ref().unwrap().as_str())
        .collect();
    assert_eq!(patients, vec!["P001", "P002", "P003"]);

    for bundle in &bundles {
        assert!(bundle.is_single_patient(), "bundle {}", bundle.id);
        assert_eq!(bundle.resource_types()[0], "Patient");
        assert_eq!(
            bundle
                .resource_types()
                .iter()
                .filter(|kind| **kind == "Patient")
                .count(),
            1
        );
    }
    assert_eq!(
        bundles[0].resource_types(),
        vec!["Patient", "Observation", "Observation"]
    );
    assert_eq!(bundles[1].resource_types(), vec!["Patient", "Observation", "Condition"]);
}

#[test]
fn unmapped_variable_is_skipped_without_losing_the_row() {
    let mut assembler = assembler();
    let row = record("P001", 2)
        .with_field("AGE", "51")
        .with_field("SEX", "m")
        .with_field("LDH", "300")
        .with_field("HGB", "NA")
        .with_field("OSSTAT", "1");

    let outcome = assembler.add_record(&row, &aml_table());
    assert_eq!(
        outcome.errors,
        vec![BuildError::MappingLookup {
            variable: "LDH".to_string()
        }]
    );
    assert_eq!(outcome.resources, 2);
    assert_eq!(outcome.demographics, 2);

    let bundles = assembler.finish();
    let json = serde_json::to_value(&bundles[0]).unwrap();
    let entries = json["entry"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["resource"]["birthDate"], "1959-01-01");
    assert_eq!(entries[0]["resource"]["gender"], "male");
    assert_eq!(
        entries[1]["resource"]["dataAbsentReason"]["coding"][0]["code"],
        "unknown"
    );
    assert_eq!(entries[2]["resource"]["valueBoolean"], true);
}

#[test]
fn bundles_are_deterministic() {
    let build = || {
        let mut assembler = assembler();
        assembler.add_record(
            &record("P001", 2)
                .with_field("HGB", "13,2")
                .with_field("AMLSTAT", "de novo"),
            &aml_table(),
        );
        serde_json::to_string_pretty(&assembler.finish()).unwrap()
    };
    assert_eq!(build(), build());
}
