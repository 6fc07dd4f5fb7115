//! FASTA reader using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files; compression
//! is detected from the `.gz` / `.bgz` extension.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;

use crate::parsing::{ParseError, SequenceRecord};

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

fn open(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read every record of a FASTA file.
///
/// Names are the definition line up to the first whitespace; sequence lines
/// are concatenated.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles`
/// if parsing fails, or `ParseError::InvalidFormat` if no sequences are
/// found.
pub fn read_fasta_file(path: &Path) -> Result<Vec<SequenceRecord>, ParseError> {
    let mut reader = fasta::io::Reader::new(open(path)?);
    read_fasta_records(&mut reader)
}

fn read_fasta_records<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<SequenceRecord>, ParseError> {
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        let sequence = record.sequence().as_ref().to_vec();
        records.push(SequenceRecord::new(name, sequence));
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(records)
}

/// Check that a file starts with a FASTA definition line and that its first
/// record parses.
///
/// # Errors
///
/// Returns a `ParseError` describing why the file is not FASTA.
pub fn check_fasta_file(path: &Path) -> Result<(), ParseError> {
    let mut input = open(path)?;

    let mut first_line = String::new();
    while first_line.trim().is_empty() {
        first_line.clear();
        if input.read_line(&mut first_line)? == 0 {
            return Err(ParseError::InvalidFormat("File is empty".to_string()));
        }
    }
    if !first_line.starts_with('>') {
        return Err(ParseError::InvalidFormat(
            "First line is not a '>' definition line".to_string(),
        ));
    }

    let mut reader = fasta::io::Reader::new(open(path)?);
    match reader.records().next() {
        Some(Ok(_)) => Ok(()),
        Some(Err(e)) => Err(ParseError::Noodles(format!(
            "Failed to parse FASTA record: {e}"
        ))),
        None => Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        )),
    }
}
