//! Reader for tab-separated contig tables: `contig<TAB>sequence`.
//!
//! Blank lines and `#` comments are skipped, and the first data line is
//! treated as a header when its first field is a known column name.

use std::path::Path;

use crate::parsing::{ParseError, SequenceRecord};

const HEADER_NAMES: [&str; 4] = ["contig", "contig_name", "name", "sequence_name"];

/// Read a contigs table from disk.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn read_contigs_table(path: &Path) -> Result<Vec<SequenceRecord>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_contigs_table(&content)
}

/// Parse contigs table text.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 2 fields, a
/// name or sequence is empty, or no contigs are found.
pub fn parse_contigs_table(text: &str) -> Result<Vec<SequenceRecord>, ParseError> {
    let mut records = Vec::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();

        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if HEADER_NAMES.contains(&first.as_str()) {
                continue;
            }
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 2 fields"
            )));
        }

        let name = fields[0].trim();
        let sequence = fields[1].trim();
        if name.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has an empty contig name"
            )));
        }
        if sequence.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Contig '{name}' on line {line_num} has an empty sequence"
            )));
        }

        records.push(SequenceRecord::new(name, sequence));
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No contigs found in table".to_string(),
        ));
    }

    Ok(records)
}

/// Check that a file parses as a contigs table.
///
/// # Errors
///
/// Returns the first `ParseError` encountered.
pub fn check_contigs_table(path: &Path) -> Result<(), ParseError> {
    read_contigs_table(path).map(|_| ())
}
