//! The search orchestrator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::core::palindrome::Palindrome;
use crate::core::sequence::EncodedSequence;
use crate::core::types::SearchStrategy;
use crate::diagnostics::{DiagnosticEvent, Diagnostics, TracingDiagnostics};
use crate::parsing::{SequenceRecord, SequenceSource};
use crate::report::SearchSummary;
use crate::search::alignment::{AlignmentBackend, SeedExtendAligner};
use crate::search::config::{
    ConfigError, SearchConfig, LONG_SEQUENCE_WARNING_LENGTH, SHORT_PALINDROME_WARNING_LENGTH,
};
use crate::search::store::{ResultStore, SequenceResult, Slot};
use crate::search::{AlignmentFinder, PalindromeFinder, ScanFinder, SearchError};

/// Where a [`PalindromeSearch::process`] run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    Searching,
    Reporting,
    Done,
    Aborted,
}

/// Finds palindromes in named sequences and keeps the results.
///
/// Each sequence name can be searched once per engine. The engine is `Sync`;
/// [`process`](Self::process) searches records concurrently on a pool of
/// [`SearchConfig::jobs`] workers.
pub struct PalindromeSearch {
    config: SearchConfig,
    aligner: Box<dyn AlignmentBackend>,
    diagnostics: Arc<dyn Diagnostics>,
    store: ResultStore,
    state: Mutex<RunState>,
    warned_short_palindromes: AtomicBool,
}

impl std::fmt::Debug for PalindromeSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PalindromeSearch")
            .field("config", &self.config)
            .field("aligner", &self.aligner.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PalindromeSearch {
    /// Build an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in `config`.
    pub fn new(
        config: SearchConfig,
        aligner: Box<dyn AlignmentBackend>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            aligner,
            diagnostics,
            store: ResultStore::new(),
            state: Mutex::new(RunState::Idle),
            warned_short_palindromes: AtomicBool::new(false),
        })
    }

    /// Engine with the built-in aligner that logs through `tracing`
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in `config`.
    pub fn with_defaults(config: SearchConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            Box::new(SeedExtendAligner::default()),
            Arc::new(TracingDiagnostics),
        )
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn aligner_name(&self) -> &'static str {
        self.aligner.name()
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Search one sequence and store its palindromes under `sequence_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::DuplicateSequence`] if the name was searched
    /// before, or an alignment error from the backend.
    pub fn find(
        &self,
        sequence: &[u8],
        sequence_name: &str,
    ) -> Result<Vec<Palindrome>, SearchError> {
        self.find_with(sequence, sequence_name, self.config.strategy)
    }

    /// Like [`find`](Self::find), with an explicit strategy overriding the
    /// configured one.
    ///
    /// # Errors
    ///
    /// See [`find`](Self::find).
    pub fn find_with(
        &self,
        sequence: &[u8],
        sequence_name: &str,
        strategy: Option<SearchStrategy>,
    ) -> Result<Vec<Palindrome>, SearchError> {
        let slot = self.store.reserve(sequence_name)?;

        match self.search(sequence, sequence_name, strategy) {
            Ok(result) => {
                let palindromes = result.palindromes.clone();
                self.store.fill(slot, result);
                Ok(palindromes)
            }
            Err(e) => {
                self.store.release(sequence_name);
                Err(e)
            }
        }
    }

    /// Search one sequence without storing anything.
    ///
    /// Scan results come longest first; alignment results keep the order
    /// hits were reported in.
    ///
    /// # Errors
    ///
    /// Returns an alignment error from the backend.
    pub fn search(
        &self,
        sequence: &[u8],
        sequence_name: &str,
        strategy: Option<SearchStrategy>,
    ) -> Result<SequenceResult, SearchError> {
        let encoded = EncodedSequence::new(sequence);
        let length = encoded.len();
        let strategy = strategy.unwrap_or_else(|| self.config.strategy_for(length));

        if length < self.config.min_sequence_length() {
            self.diagnostics.emit(DiagnosticEvent::SequenceTooShort {
                sequence_name: sequence_name.to_string(),
                length,
                min_palindrome_length: self.config.min_palindrome_length,
                min_distance: self.config.min_distance,
            });
        }

        let mut palindromes = match strategy {
            SearchStrategy::Scan => {
                ScanFinder::new(self.config.scan_params()).find(&encoded, sequence_name)?
            }
            SearchStrategy::Alignment => {
                self.warn_short_palindromes(sequence_name, length);
                AlignmentFinder::new(
                    self.aligner.as_ref(),
                    &self.config,
                    self.diagnostics.as_ref(),
                )
                .find(&encoded, sequence_name)?
            }
        };
        palindromes.retain(|p| self.config.accepts(p));

        self.diagnostics.emit(DiagnosticEvent::SequenceSearched {
            sequence_name: sequence_name.to_string(),
            length,
            strategy,
            palindromes: palindromes.len(),
        });

        Ok(SequenceResult {
            sequence_name: sequence_name.to_string(),
            length,
            strategy,
            palindromes,
        })
    }

    fn warn_short_palindromes(&self, sequence_name: &str, length: usize) {
        if self.config.min_palindrome_length >= SHORT_PALINDROME_WARNING_LENGTH
            || length <= LONG_SEQUENCE_WARNING_LENGTH
        {
            return;
        }
        if self
            .warned_short_palindromes
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            self.diagnostics
                .emit(DiagnosticEvent::ShortPalindromesOnLongSequence {
                    sequence_name: sequence_name.to_string(),
                    length,
                    min_palindrome_length: self.config.min_palindrome_length,
                });
        }
    }

    /// Read every record of `source`, search them all and summarize.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NoSource`] without a source, and otherwise the
    /// first read, duplicate-name or alignment error.
    pub fn process(&self, source: Option<&SequenceSource>) -> Result<SearchSummary, SearchError> {
        self.set_state(RunState::Validating);
        let records = source
            .ok_or(SearchError::NoSource)
            .and_then(|source| {
                self.config.validate()?;
                source.validate()?;
                Ok(source.read()?)
            });

        match records {
            Ok(records) => self.process_records(records),
            Err(e) => {
                self.set_state(RunState::Aborted);
                Err(e)
            }
        }
    }

    /// Search already-loaded records and summarize.
    ///
    /// All names are reserved in input order before any search starts, so a
    /// duplicate name fails the run up front and results keep input order.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate-name or alignment error.
    pub fn process_records(
        &self,
        records: Vec<SequenceRecord>,
    ) -> Result<SearchSummary, SearchError> {
        self.set_state(RunState::Searching);
        let outcome = self.search_all(&records);
        match outcome {
            Ok(()) => {
                self.set_state(RunState::Reporting);
                let summary = self.summary();
                self.set_state(RunState::Done);
                Ok(summary)
            }
            Err(e) => {
                self.set_state(RunState::Aborted);
                Err(e)
            }
        }
    }

    fn search_all(&self, records: &[SequenceRecord]) -> Result<(), SearchError> {
        let names = || records.iter().map(|record| record.name.as_str());

        let mut slots = Vec::with_capacity(records.len());
        for record in records {
            match self.store.reserve(&record.name) {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    self.store.release_unfilled(names().take(slots.len()));
                    return Err(e);
                }
            }
        }

        let outcome = self.search_reserved(records, &slots);
        if outcome.is_err() {
            // names that never got a result can be searched again
            self.store.release_unfilled(names());
        }
        outcome
    }

    fn search_reserved(
        &self,
        records: &[SequenceRecord],
        slots: &[Slot],
    ) -> Result<(), SearchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()?;

        pool.install(|| {
            records
                .par_iter()
                .zip(slots.par_iter())
                .try_for_each(|(record, slot)| {
                    let result =
                        self.search(&record.sequence, &record.name, self.config.strategy)?;
                    self.store.fill(*slot, result);
                    Ok(())
                })
        })
    }

    /// Palindromes stored for `sequence_name`, if it was searched
    pub fn palindromes(&self, sequence_name: &str) -> Option<Vec<Palindrome>> {
        self.store.get(sequence_name).map(|r| r.palindromes)
    }

    /// Every stored result in the order names were reserved
    pub fn results(&self) -> Vec<SequenceResult> {
        self.store.results()
    }

    pub fn summary(&self) -> SearchSummary {
        SearchSummary::from_results(&self.results())
    }
}
