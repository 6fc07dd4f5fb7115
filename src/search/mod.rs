//! Palindrome search.
//!
//! Two strategies find inverted repeats in a single sequence:
//!
//! - [`ScanFinder`]: direct scan against the reverse complement
//!   ([`scanner`]), for short sequences
//! - [`AlignmentFinder`]: local alignment against the reverse complement
//!   ([`alignment`]), whose hits are filtered and split into qualifying
//!   segments ([`segmenter`])
//!
//! [`PalindromeSearch`] picks a strategy per sequence, applies the acceptance
//! criteria, and keeps results per sequence name.

use thiserror::Error;

use crate::core::palindrome::Palindrome;
use crate::core::sequence::EncodedSequence;
use crate::diagnostics::Diagnostics;
use crate::parsing::ParseError;

pub mod alignment;
pub mod config;
pub mod engine;
pub mod scanner;
pub mod segmenter;
pub mod store;

pub use alignment::{AlignerKind, AlignmentBackend, AlignmentError};
pub use config::{ConfigError, SearchConfig};
pub use engine::PalindromeSearch;
pub use store::{ResultStore, SequenceResult};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Sequence '{0}' has already been searched; sequence names must be unique")]
    DuplicateSequence(String),

    #[error("No FASTA file or contigs table to process")]
    NoSource,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read sequences: {0}")]
    Parse(#[from] ParseError),

    #[error("Alignment failed for '{sequence_name}': {source}")]
    Alignment {
        sequence_name: String,
        #[source]
        source: AlignmentError,
    },

    #[error("Failed to build search thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A way of finding palindromes in one sequence
pub trait PalindromeFinder {
    /// Candidate palindromes, before the acceptance criteria are applied
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the underlying tool fails.
    fn find(
        &self,
        sequence: &EncodedSequence,
        sequence_name: &str,
    ) -> Result<Vec<Palindrome>, SearchError>;
}

/// Direct scan of the sequence
#[derive(Debug, Clone, Copy)]
pub struct ScanFinder {
    params: scanner::ScanParams,
}

impl ScanFinder {
    pub fn new(params: scanner::ScanParams) -> Self {
        Self { params }
    }
}

impl PalindromeFinder for ScanFinder {
    fn find(
        &self,
        sequence: &EncodedSequence,
        sequence_name: &str,
    ) -> Result<Vec<Palindrome>, SearchError> {
        Ok(scanner::find_palindromes(sequence, sequence_name, self.params))
    }
}

/// Local alignment against the reverse complement, then hit filtering
pub struct AlignmentFinder<'a> {
    backend: &'a dyn AlignmentBackend,
    config: &'a SearchConfig,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> AlignmentFinder<'a> {
    pub fn new(
        backend: &'a dyn AlignmentBackend,
        config: &'a SearchConfig,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Self {
            backend,
            config,
            diagnostics,
        }
    }
}

impl PalindromeFinder for AlignmentFinder<'_> {
    fn find(
        &self,
        sequence: &EncodedSequence,
        sequence_name: &str,
    ) -> Result<Vec<Palindrome>, SearchError> {
        let request = alignment::AlignmentRequest {
            query: sequence.text(),
            min_percent_identity: self.config.min_percent_identity(),
            word_size: self.config.blast_word_size,
            num_threads: self.config.num_threads,
        };

        let hits = self
            .backend
            .search(&request, self.diagnostics)
            .map_err(|source| SearchError::Alignment {
                sequence_name: sequence_name.to_string(),
                source,
            })?;

        Ok(alignment::filter_hits(
            &hits,
            sequence_name,
            self.config.hit_filter_params(),
            self.diagnostics,
        ))
    }
}
