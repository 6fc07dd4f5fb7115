//! Readers for the sequence sources a search can run on.
//!
//! - **FASTA files**: plain, gzip or bgzip compressed (see [`fasta`])
//! - **Contigs tables**: tab-separated `contig<TAB>sequence` rows (see
//!   [`contigs_table`])
//!
//! Exactly one source is used per run; [`InputOptions::resolve`] rejects
//! configurations that name both.
//!
//! ## Example
//!
//! ```rust,no_run
//! use palindrome_search::parsing::{InputOptions, SequenceSource};
//! use std::path::PathBuf;
//!
//! let inputs = InputOptions {
//!     fasta: Some(PathBuf::from("contigs.fa")),
//!     contigs_table: None,
//! };
//! if let Some(source) = inputs.resolve().unwrap() {
//!     for record in source.read().unwrap() {
//!         println!("{}: {} bp", record.name, record.sequence.len());
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::search::config::ConfigError;

pub mod contigs_table;
pub mod fasta;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),
}

/// A named nucleotide sequence as read from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }
}

/// Where the sequences of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSource {
    Fasta(PathBuf),
    ContigsTable(PathBuf),
}

impl SequenceSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Fasta(path) | Self::ContigsTable(path) => path,
        }
    }

    fn format_name(&self) -> &'static str {
        match self {
            Self::Fasta(_) => "FASTA file",
            Self::ContigsTable(_) => "contigs table",
        }
    }

    /// Read every record, in file order.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the file cannot be read or is malformed.
    pub fn read(&self) -> Result<Vec<SequenceRecord>, ParseError> {
        match self {
            Self::Fasta(path) => fasta::read_fasta_file(path),
            Self::ContigsTable(path) => contigs_table::read_contigs_table(path),
        }
    }

    /// Check that the source exists and looks like its format, without
    /// reading it all.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSource`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checked = match self {
            Self::Fasta(path) => fasta::check_fasta_file(path),
            Self::ContigsTable(path) => contigs_table::check_contigs_table(path),
        };

        checked.map_err(|e| ConfigError::InvalidSource {
            path: self.path().to_path_buf(),
            format: self.format_name(),
            reason: e.to_string(),
        })
    }
}

/// Input options as given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOptions {
    pub fasta: Option<PathBuf>,
    pub contigs_table: Option<PathBuf>,
}

impl InputOptions {
    /// The single configured source, or `None` when nothing was given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConflictingSources`] when both a FASTA file and a
    /// contigs table are given, or [`ConfigError::InvalidSource`] when the
    /// chosen source fails validation.
    pub fn resolve(&self) -> Result<Option<SequenceSource>, ConfigError> {
        let source = match (&self.fasta, &self.contigs_table) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingSources),
            (Some(path), None) => SequenceSource::Fasta(path.clone()),
            (None, Some(path)) => SequenceSource::ContigsTable(path.clone()),
            (None, None) => return Ok(None),
        };

        source.validate()?;
        Ok(Some(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_conflicting_sources() {
        let inputs = InputOptions {
            fasta: Some(PathBuf::from("a.fa")),
            contigs_table: Some(PathBuf::from("b.tsv")),
        };
        assert!(matches!(
            inputs.resolve(),
            Err(ConfigError::ConflictingSources)
        ));
    }

    #[test]
    fn test_no_source() {
        assert_eq!(InputOptions::default().resolve().unwrap(), None);
    }

    #[test]
    fn test_resolves_valid_fasta() {
        let mut temp = NamedTempFile::with_suffix(".fa").unwrap();
        temp.write_all(b">seq1\nACGT\n").unwrap();
        temp.flush().unwrap();

        let inputs = InputOptions {
            fasta: Some(temp.path().to_path_buf()),
            contigs_table: None,
        };
        assert_eq!(
            inputs.resolve().unwrap(),
            Some(SequenceSource::Fasta(temp.path().to_path_buf()))
        );
    }

    #[test]
    fn test_rejects_non_fasta() {
        let mut temp = NamedTempFile::with_suffix(".fa").unwrap();
        temp.write_all(b"this is not a fasta file\n").unwrap();
        temp.flush().unwrap();

        let inputs = InputOptions {
            fasta: Some(temp.path().to_path_buf()),
            contigs_table: None,
        };
        let err = inputs.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSource { .. }));
    }
}
