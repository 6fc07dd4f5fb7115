//! Search configuration.
//!
//! [`SearchConfig`] holds every tunable of a run. Defaults match the
//! command line defaults, and [`SearchConfig::validate`] is the single place
//! where settings are checked before any sequence is read.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::palindrome::Palindrome;
use crate::core::types::SearchStrategy;
use crate::search::alignment::HitFilterParams;
use crate::search::scanner::ScanParams;

pub const DEFAULT_MIN_PALINDROME_LENGTH: usize = 10;
pub const DEFAULT_MAX_NUM_MISMATCHES: usize = 0;
pub const DEFAULT_MIN_DISTANCE: usize = 0;
pub const DEFAULT_MIN_MISMATCH_DISTANCE_TO_FIRST_BASE: usize = 1;
pub const DEFAULT_BLAST_WORD_SIZE: usize = 10;
pub const DEFAULT_NUM_THREADS: usize = 1;
pub const DEFAULT_LENGTH_THRESHOLD: usize = 5000;
pub const DEFAULT_JOBS: usize = 1;

/// Smallest arm length and alignment word size accepted
pub const MIN_WORD_SIZE: usize = 4;

/// Below this arm length, alignment on long sequences is reported as slow
pub const SHORT_PALINDROME_WARNING_LENGTH: usize = 20;
/// Sequences longer than this trigger the short-palindrome warning
pub const LONG_SEQUENCE_WARNING_LENGTH: usize = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Choose either a FASTA file or a contigs table as the sequence source, not both")]
    ConflictingSources,

    #[error("The minimum mismatch distance to the first base of either arm must be at least 1 (got {0})")]
    MismatchDistanceTooSmall(usize),

    #[error("Expected a non-negative integer, got '{value}'")]
    InvalidInteger { value: String },

    #[error("The word size for alignment must be at least {MIN_WORD_SIZE} (got {0})")]
    WordSizeTooSmall(usize),

    #[error("The minimum palindrome length must be at least {MIN_WORD_SIZE} (got {0})")]
    MinLengthTooSmall(usize),

    #[error("{setting} must be at least 1")]
    ZeroWorkers { setting: &'static str },

    #[error("Output file '{path}' is not writable: {reason}")]
    OutputNotWritable { path: PathBuf, reason: String },

    #[error("'{path}' is not a valid {format}: {reason}")]
    InvalidSource {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },
}

/// All tunables of a palindrome search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum arm length
    pub min_palindrome_length: usize,
    /// Maximum mismatched columns per palindrome
    pub max_num_mismatches: usize,
    /// Minimum number of bases between the arms
    pub min_distance: usize,
    /// Mismatches must lie at least this many columns (1-based) inside
    /// either end of the arms
    pub min_mismatch_distance_to_first_base: usize,
    /// Seed length for the alignment strategy
    pub blast_word_size: usize,
    /// Threads given to the alignment backend
    pub num_threads: usize,
    /// Sequences shorter than this are scanned, longer ones aligned
    pub length_threshold: usize,
    /// Force one strategy for every sequence
    pub strategy: Option<SearchStrategy>,
    /// Sequences searched concurrently by `process`
    pub jobs: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_palindrome_length: DEFAULT_MIN_PALINDROME_LENGTH,
            max_num_mismatches: DEFAULT_MAX_NUM_MISMATCHES,
            min_distance: DEFAULT_MIN_DISTANCE,
            min_mismatch_distance_to_first_base: DEFAULT_MIN_MISMATCH_DISTANCE_TO_FIRST_BASE,
            blast_word_size: DEFAULT_BLAST_WORD_SIZE,
            num_threads: DEFAULT_NUM_THREADS,
            length_threshold: DEFAULT_LENGTH_THRESHOLD,
            strategy: None,
            jobs: DEFAULT_JOBS,
        }
    }
}

impl SearchConfig {
    /// Check every setting.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_mismatch_distance_to_first_base < 1 {
            return Err(ConfigError::MismatchDistanceTooSmall(
                self.min_mismatch_distance_to_first_base,
            ));
        }
        if self.blast_word_size < MIN_WORD_SIZE {
            return Err(ConfigError::WordSizeTooSmall(self.blast_word_size));
        }
        if self.min_palindrome_length < MIN_WORD_SIZE {
            return Err(ConfigError::MinLengthTooSmall(self.min_palindrome_length));
        }
        if self.num_threads == 0 {
            return Err(ConfigError::ZeroWorkers {
                setting: "The number of alignment threads",
            });
        }
        if self.jobs == 0 {
            return Err(ConfigError::ZeroWorkers {
                setting: "The number of parallel jobs",
            });
        }
        Ok(())
    }

    /// Strategy for a sequence of `length` bases, honouring a forced one
    pub fn strategy_for(&self, length: usize) -> SearchStrategy {
        self.strategy
            .unwrap_or_else(|| SearchStrategy::for_length(length, self.length_threshold))
    }

    /// Identity floor handed to the aligner: `100 - max mismatches`,
    /// never below zero
    pub fn min_percent_identity(&self) -> f64 {
        100usize.saturating_sub(self.max_num_mismatches) as f64
    }

    pub fn scan_params(&self) -> ScanParams {
        ScanParams {
            min_length: self.min_palindrome_length,
            max_mismatches: self.max_num_mismatches,
            min_distance: self.min_distance,
        }
    }

    pub fn hit_filter_params(&self) -> HitFilterParams {
        HitFilterParams {
            min_length: self.min_palindrome_length,
            max_mismatches: self.max_num_mismatches,
            min_distance: self.min_distance,
        }
    }

    /// Shortest sequence that can hold two arms and the required spacer
    pub fn min_sequence_length(&self) -> usize {
        2 * self.min_palindrome_length + self.min_distance
    }

    /// Whether a palindrome meets every acceptance criterion.
    ///
    /// Besides length, mismatch, gap and distance limits, no mismatch may sit
    /// closer to either end of the arms than
    /// `min_mismatch_distance_to_first_base - 1` columns.
    pub fn accepts(&self, palindrome: &Palindrome) -> bool {
        if palindrome.length() < self.min_palindrome_length
            || palindrome.num_mismatches() > self.max_num_mismatches
            || palindrome.num_gaps() > 0
            || palindrome.distance() < self.min_distance
            || palindrome.first().len() != palindrome.second().len()
        {
            return false;
        }

        let edge = self.min_mismatch_distance_to_first_base.saturating_sub(1);
        if edge == 0 {
            return true;
        }
        let last = palindrome.length().saturating_sub(1);
        palindrome
            .mismatch_offsets()
            .all(|offset| offset >= edge && offset + edge <= last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::palindrome::Arm;
    use crate::core::types::SearchMethod;

    #[test]
    fn test_defaults_are_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_palindrome_length, 10);
        assert_eq!(config.length_threshold, 5000);
        assert!((config.min_percent_identity() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validation_errors() {
        let config = SearchConfig {
            min_mismatch_distance_to_first_base: 0,
            ..SearchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MismatchDistanceTooSmall(0))
        ));

        let config = SearchConfig {
            blast_word_size: 3,
            ..SearchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WordSizeTooSmall(3))
        ));

        let config = SearchConfig {
            min_palindrome_length: 2,
            ..SearchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MinLengthTooSmall(2))
        ));

        let config = SearchConfig {
            jobs: 0,
            ..SearchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroWorkers { .. })
        ));
    }

    #[test]
    fn test_forced_strategy() {
        let config = SearchConfig::default();
        assert_eq!(config.strategy_for(100), SearchStrategy::Scan);
        assert_eq!(config.strategy_for(5000), SearchStrategy::Alignment);

        let config = SearchConfig {
            strategy: Some(SearchStrategy::Alignment),
            ..SearchConfig::default()
        };
        assert_eq!(config.strategy_for(100), SearchStrategy::Alignment);
    }

    #[test]
    fn test_identity_floor() {
        let config = SearchConfig {
            max_num_mismatches: 150,
            ..SearchConfig::default()
        };
        assert!(config.min_percent_identity().abs() < f64::EPSILON);
    }

    #[test]
    fn test_mismatch_edge_distance() {
        // mismatch in column 1 of a 10-column palindrome
        let palindrome = Palindrome::new(
            "s",
            SearchMethod::Alignment,
            Arm::new(0, 10, "ACGTACGTAC"),
            Arm::new(20, 30, "AGGTACGTAC"),
            10,
        );
        let lenient = SearchConfig {
            min_palindrome_length: 10,
            max_num_mismatches: 1,
            ..SearchConfig::default()
        };
        assert!(lenient.accepts(&palindrome));

        let strict = SearchConfig {
            min_mismatch_distance_to_first_base: 3,
            ..lenient.clone()
        };
        assert!(!strict.accepts(&palindrome));

        let edge = SearchConfig {
            min_mismatch_distance_to_first_base: 2,
            ..lenient
        };
        assert!(edge.accepts(&palindrome));
    }
}
