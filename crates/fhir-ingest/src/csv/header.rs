//! CSV header normalization and delimiter detection.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{IngestError, Result};

/// Delimiters tried when sniffing, in tie-break order.
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Normalizes a header value by trimming whitespace and a leading BOM.
pub fn normalize_header(value: &str) -> String {
    value.trim_start_matches('\u{feff}').trim().to_string()
}

/// Normalizes a data cell. Only surrounding whitespace is removed.
pub fn normalize_cell(value: &str) -> String {
    value.trim().to_string()
}

/// Index of the first header matching any candidate, case-insensitively.
///
/// Candidates are tried in order, so earlier names win over later ones.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(candidate))
    })
}

/// Guesses the field delimiter from the first non-blank line.
///
/// Picks whichever of `,` `;` or tab occurs most often outside quotes.
/// Falls back to `,` when none occur.
pub fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut reader = BufReader::new(file);
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        if read == 0 || !line.trim().is_empty() {
            break;
        }
    }

    Ok(delimiter_for_line(&line))
}

fn delimiter_for_line(line: &str) -> u8 {
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(idx) = CANDIDATE_DELIMITERS.iter().position(|d| *d == byte) {
            counts[idx] += 1;
        }
    }

    let best = (1..counts.len()).fold(0, |best, idx| {
        if counts[idx] > counts[best] { idx } else { best }
    });
    CANDIDATE_DELIMITERS[best]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  SUBJID  "), "SUBJID");
        assert_eq!(normalize_header("\u{feff}SUBJID"), "SUBJID");
    }

    #[test]
    fn test_delimiter_for_line() {
        assert_eq!(delimiter_for_line("SUBJID;AGE;SEX\n"), b';');
        assert_eq!(delimiter_for_line("SUBJID,AGE,SEX\n"), b',');
        assert_eq!(delimiter_for_line("SUBJID\tAGE\n"), b'\t');
        assert_eq!(delimiter_for_line("\"a;b\",c,d\n"), b',');
        assert_eq!(delimiter_for_line("SUBJID\n"), b',');
    }

    #[test]
    fn test_find_column_prefers_earlier_candidates() {
        let headers = vec![
            "USUBJID".to_string(),
            "subjid".to_string(),
            "AGE".to_string(),
        ];
        assert_eq!(find_column(&headers, &["SUBJID", "USUBJID"]), Some(1));
        assert_eq!(find_column(&headers, &["PATIENT_ID"]), None);
    }
}
