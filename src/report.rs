//! Run summaries and the tabular palindrome report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::palindrome::{Palindrome, TSV_HEADERS};
use crate::search::config::ConfigError;
use crate::search::store::SequenceResult;
use crate::utils::validation::check_output_writable;

/// The longest or most distant palindrome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub sequence_name: String,
    pub length: usize,
    pub distance: usize,
}

impl Highlight {
    fn of(palindrome: &Palindrome) -> Self {
        Self {
            sequence_name: palindrome.sequence_name().to_string(),
            length: palindrome.length(),
            distance: palindrome.distance(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    pub num_sequences: usize,
    pub num_sequences_with_palindromes: usize,
    pub num_palindromes: usize,
    pub longest: Option<Highlight>,
    pub most_distant: Option<Highlight>,
}

impl SearchSummary {
    /// Summarize results. Ties keep the first palindrome in result order.
    pub fn from_results(results: &[SequenceResult]) -> Self {
        let mut summary = Self {
            num_sequences: results.len(),
            ..Self::default()
        };

        let mut longest: Option<&Palindrome> = None;
        let mut most_distant: Option<&Palindrome> = None;

        for result in results {
            if !result.palindromes.is_empty() {
                summary.num_sequences_with_palindromes += 1;
            }
            summary.num_palindromes += result.palindromes.len();

            for palindrome in &result.palindromes {
                if longest.map_or(true, |best| palindrome.length() > best.length()) {
                    longest = Some(palindrome);
                }
                if most_distant.map_or(true, |best| palindrome.distance() > best.distance()) {
                    most_distant = Some(palindrome);
                }
            }
        }

        summary.longest = longest.map(Highlight::of);
        summary.most_distant = most_distant.map(Highlight::of);
        summary
    }
}

/// Where the palindrome table goes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub output_file: Option<PathBuf>,
}

impl OutputOptions {
    /// Check that the output file can be created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutputNotWritable`] if the file exists or its
    /// directory is missing or read-only.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.output_file {
            Some(path) => check_output_writable(path),
            None => Ok(()),
        }
    }
}

/// Write palindromes of every result as a TSV table, header first.
///
/// # Errors
///
/// Returns any I/O error from `writer`.
pub fn write_tsv<W: Write>(mut writer: W, results: &[SequenceResult]) -> io::Result<()> {
    writeln!(writer, "{}", TSV_HEADERS.join("\t"))?;
    for palindrome in results.iter().flat_map(|r| &r.palindromes) {
        writeln!(writer, "{}", palindrome.tsv_fields().join("\t"))?;
    }
    writer.flush()
}

/// Write the TSV table to `path`.
///
/// # Errors
///
/// Returns any I/O error creating or writing the file.
pub fn write_tsv_file(path: &Path, results: &[SequenceResult]) -> io::Result<()> {
    let file = File::create(path)?;
    write_tsv(BufWriter::new(file), results)
}
