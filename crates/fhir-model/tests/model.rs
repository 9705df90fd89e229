//! Tests for fhir-model types.

use fhir_model::{
    Bundle, BundleEntry, CodeableConcept, Condition, FhirResource, Observation, ObservationValue,
    PatientId, Quantity, Reference,
};

fn hemoglobin(subject: &str) -> Observation {
    let mut observation = Observation::new(
        "obs-hb",
        CodeableConcept::coded("http://loinc.org", "718-7", "Hemoglobin"),
        Reference::new(subject),
    );
    observation.set_value(ObservationValue::Quantity(Quantity::ucum(13.2, "g/dL", "g/dL")));
    observation
}

#[test]
fn observation_serializes_value_choice_by_name() {
    let resource = FhirResource::from(hemoglobin("Patient/P001"));
    let json = serde_json::to_value(&resource).expect("serialize observation");

    assert_eq!(json["resourceType"], "Observation");
    assert_eq!(json["status"], "final");
    assert_eq!(json["subject"]["reference"], "Patient/P001");
    assert_eq!(json["valueQuantity"]["value"], 13.2);
    assert_eq!(json["valueQuantity"]["system"], "http://unitsofmeasure.org");
    assert!(json.get("valueString").is_none());
    assert!(json.get("interpretation").is_none());
}

#[test]
fn resource_deserializes_from_tagged_json() {
    let json = r#"{
        "resourceType": "Condition",
        "id": "cond-1",
        "clinicalStatus": {"coding": [{"system": "http://terminology.hl7.org/CodeSystem/condition-clinical", "code": "active"}]},
        "verificationStatus": {"coding": [{"system": "http://terminology.hl7.org/CodeSystem/condition-ver-status", "code": "confirmed"}]},
        "code": {"coding": [{"system": "http://snomed.info/sct", "code": "91861009", "display": "Acute myeloid leukemia"}]},
        "subject": {"reference": "Patient/P002"}
    }"#;

    let resource: FhirResource = serde_json::from_str(json).expect("parse condition");
    let FhirResource::Condition(Condition { code, subject, .. }) = &resource else {
        panic!("expected a Condition, got {}", resource.resource_type());
    };
    assert_eq!(code.first_code(), Some("91861009"));
    assert_eq!(subject.reference, "Patient/P002");
    assert_eq!(resource.patient_reference(), "Patient/P002");
}

#[test]
fn bundle_detects_foreign_entries() {
    let patient_id = PatientId::new("P001").unwrap();
    let mut bundle = Bundle::collection("bundle-1", patient_id);
    bundle.entries.push(BundleEntry {
        full_url: "https://example.org/fhir/Observation/obs-hb".to_string(),
        resource: hemoglobin("Patient/P001").into(),
    });
    assert!(bundle.is_single_patient());

    bundle.entries.push(BundleEntry {
        full_url: "https://example.org/fhir/Observation/obs-other".to_string(),
        resource: hemoglobin("Patient/P999").into(),
    });
    assert!(!bundle.is_single_patient());
    assert_eq!(bundle.resource_types(), vec!["Observation", "Observation"]);
}

#[test]
fn bundle_round_trips_entry_kinds() {
    let mut bundle = Bundle::collection("bundle-1", PatientId::new("P001").unwrap());
    bundle.entries.push(BundleEntry {
        full_url: "https://example.org/fhir/Observation/obs-hb".to_string(),
        resource: hemoglobin("Patient/P001").into(),
    });

    let json = serde_json::to_string(&bundle).expect("serialize bundle");
    let round: Bundle = serde_json::from_str(&json).expect("parse bundle");

    assert_eq!(round.id, "bundle-1");
    assert_eq!(round.resource_types(), bundle.resource_types());
    assert_eq!(round.entries, bundle.entries);
    assert!(round.patient_id.is_none());
}
