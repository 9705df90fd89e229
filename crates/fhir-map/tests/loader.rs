//! Integration tests for loading mapping tables from disk.

use std::path::PathBuf;

use fhir_map::{LoadError, load_mapping_table};
use fhir_model::{CodeSystem, VariableCategory};
use proptest::prelude::*;
use tempfile::TempDir;

fn write_mapping(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

const AML_MAPPING: &str = "\
Type;Variable;Label;Vocabulary;Vocabulary Code;Vocabulary Display Name;Unit;Unit Code
laboratory value;HB;Hemoglobin;LOINC;718-7;Hemoglobin [Mass/volume] in Blood;mmol/L;mmol/L
laboratory value;WBC;White blood cells;LOINC;6690-2;Leukocytes [#/volume] in Blood;10^6/L;10*6/L
molecular genetics;NPM1;NPM1 mutation;SNOMED;445207003;NPM1 gene mutation;;
;;;;;;;
diagnosis;AMLSUB;AML subtype;SNOMED;91861009;Acute myeloid leukemia;;
laboratory value;HB;Duplicate;LOINC;59260-0;Hemoglobin;g/dL;g/dL
";

#[test]
fn loads_semicolon_table_with_type_column() {
    let dir = TempDir::new().unwrap();
    let path = write_mapping(&dir, "mapping_fhir.csv", AML_MAPPING);

    let table = load_mapping_table(&path).unwrap();
    assert_eq!(table.len(), 4);

    let hb = table.get("HB").unwrap();
    assert_eq!(hb.code, "718-7");
    assert_eq!(hb.code_system, CodeSystem::Loinc);
    assert_eq!(hb.unit.as_deref(), Some("mmol/L"));
    assert_eq!(hb.label.as_deref(), Some("Hemoglobin"));

    let wbc = table.get("wbc").unwrap();
    assert_eq!(wbc.ucum_code(), Some("10*6/L"));

    let npm1 = table.get("NPM1").unwrap();
    assert_eq!(npm1.category, VariableCategory::MolecularGenetics);
    assert_eq!(npm1.unit, None);

    let order: Vec<&str> = table.iter().map(|e| e.source_variable.as_str()).collect();
    assert_eq!(order, vec!["HB", "WBC", "NPM1", "AMLSUB"]);
}

#[test]
fn category_defaults_from_unit_presence() {
    let dir = TempDir::new().unwrap();
    let path = write_mapping(
        &dir,
        "map.csv",
        "source_variable,code_system,code,display,unit\nHGB,LOINC,718-7,Hemoglobin,g/dL\nECOG,LOINC,89247-1,ECOG Performance Status score,\n",
    );

    let table = load_mapping_table(&path).unwrap();
    assert_eq!(
        table.get("HGB").unwrap().category,
        VariableCategory::LaboratoryValue
    );
    assert_eq!(
        table.get("ECOG").unwrap().category,
        VariableCategory::Observation
    );
}

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let result = load_mapping_table(&dir.path().join("mapping_fhir.csv"));
    assert!(matches!(result, Err(LoadError::NotFound { .. })));
}

#[test]
fn workbook_is_rejected_with_hint() {
    let dir = TempDir::new().unwrap();
    let path = write_mapping(&dir, "mapping_fhir.xlsx", "PK");

    let err = load_mapping_table(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    assert!(err.to_string().contains("export the sheet as CSV"));
}

#[test]
fn row_without_code_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_mapping(
        &dir,
        "map.csv",
        "Variable,Vocabulary,Vocabulary Code,Vocabulary Display Name\nHB,LOINC,718-7,Hemoglobin\nWBC,LOINC,,Leukocytes\n",
    );

    let err = load_mapping_table(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadError::MissingValue {
            line: 3,
            column: "Vocabulary Code",
            ..
        }
    ));
}

#[test]
fn unknown_code_system_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_mapping(
        &dir,
        "map.csv",
        "Variable,Vocabulary,Vocabulary Code,Vocabulary Display Name\nHB,ICD-10,D64.9,Anaemia\n",
    );

    let err = load_mapping_table(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnknownCodeSystem { ref value, .. } if value == "ICD-10"));
}

#[test]
fn unknown_category_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_mapping(
        &dir,
        "map.csv",
        "Type,Variable,Vocabulary,Vocabulary Code,Vocabulary Display Name\nimaging,CT,LOINC,24627-2,Chest CT\n",
    );

    let err = load_mapping_table(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnknownCategory { ref value, .. } if value == "imaging"));
}

fn cell() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ./()\\[\\]-]{0,30}[A-Za-z0-9)]"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn loaded_code_and_display_match_source_row(
        rows in prop::collection::btree_map("[A-Z][A-Z0-9_]{0,11}", (cell(), cell()), 1..12),
        loinc in any::<bool>(),
    ) {
        let dir = TempDir::new().unwrap();
        let system = if loinc { "LOINC" } else { "SNOMED" };
        let mut contents = String::from("Variable,Vocabulary,Vocabulary Code,Vocabulary Display Name\n");
        for (variable, (code, display)) in &rows {
            contents.push_str(&format!("{variable},{system},\"{code}\",\"{display}\"\n"));
        }
        let path = write_mapping(&dir, "map.csv", &contents);

        let table = load_mapping_table(&path).unwrap();
        prop_assert_eq!(table.len(), rows.len());
        for (variable, (code, display)) in &rows {
            let entry = table.get(variable).unwrap();
            prop_assert_eq!(&entry.code, code);
            prop_assert_eq!(&entry.display, display);
        }
    }
}
