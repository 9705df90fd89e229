//! Bundle serialization to `bundle_<patient_id>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use fhir_model::{Bundle, PatientId, name_digest};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::error::{Result, WriteError};

const INDENT: &[u8] = b"    ";

/// File name for a patient's bundle.
///
/// Ids made only of `[A-Za-z0-9._-]` are used as they are. Otherwise the
/// other characters become `_` and [`name_digest`] of the id is appended,
/// so `A 1` and `A_1` get different files.
pub fn bundle_file_name(patient_id: &str) -> String {
    let is_safe = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.');
    if patient_id.chars().all(is_safe) {
        return format!("bundle_{patient_id}.json");
    }
    let safe: String = patient_id
        .chars()
        .map(|ch| if is_safe(ch) { ch } else { '_' })
        .collect();
    format!("bundle_{safe}-{}.json", name_digest(patient_id))
}

/// Where [`write_bundle`] puts `bundle` inside `output_dir`.
///
/// Uses the bundle's patient id, or its bundle id when the patient is
/// unknown (e.g. a bundle read back from disk).
pub fn bundle_path(bundle: &Bundle, output_dir: &Path) -> PathBuf {
    let key = bundle
        .patient_id
        .as_ref()
        .map_or(bundle.id.as_str(), PatientId::as_str);
    output_dir.join(bundle_file_name(key))
}

/// Serializes a bundle as JSON indented by four spaces.
pub fn render_bundle(bundle: &Bundle) -> std::result::Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    bundle.serialize(&mut serializer)?;
    out.push(b'\n');
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Writes `bundle` to `output_dir`, creating the directory if needed.
///
/// Returns the path written. An existing file is overwritten.
pub fn write_bundle(bundle: &Bundle, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|source| WriteError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = bundle_path(bundle, output_dir);
    let json = render_bundle(bundle).map_err(|source| WriteError::Serialize {
        bundle_id: bundle.id.clone(),
        source,
    })?;
    fs::write(&path, json).map_err(|source| WriteError::Write {
        path: path.clone(),
        source,
    })?;

    debug!(path = %path.display(), entries = bundle.len(), "bundle written");
    Ok(path)
}

/// Parses a bundle file written by [`write_bundle`].
pub fn read_bundle(path: &Path) -> Result<Bundle> {
    let contents = fs::read_to_string(path).map_err(|source| WriteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| WriteError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
