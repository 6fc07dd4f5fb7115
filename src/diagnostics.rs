//! Diagnostics collaborator for the search engine.
//!
//! The engine never logs through a global; it reports [`DiagnosticEvent`]s to
//! whatever [`Diagnostics`] implementation it was built with. Events are
//! informational only and never influence results.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::core::types::SearchStrategy;

/// Something worth telling the user about while searching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// The sequence cannot hold two arms of the minimum length plus the
    /// minimum distance; the search still runs and is expected to be empty
    SequenceTooShort {
        sequence_name: String,
        length: usize,
        min_palindrome_length: usize,
        min_distance: usize,
    },
    /// Short palindromes on a long sequence can make alignment very slow.
    /// Reported at most once per engine.
    ShortPalindromesOnLongSequence {
        sequence_name: String,
        length: usize,
        min_palindrome_length: usize,
    },
    /// An alignment hit failed the acceptance criteria and was split
    HitSplit {
        sequence_name: String,
        first_start: usize,
        first_end: usize,
        midline: String,
        segments: usize,
    },
    /// A temporary directory used for an external tool was kept on request
    TemporaryDirectoryKept { path: PathBuf },
    /// A sequence finished searching
    SequenceSearched {
        sequence_name: String,
        length: usize,
        strategy: SearchStrategy,
        palindromes: usize,
    },
}

/// Sink for [`DiagnosticEvent`]s
pub trait Diagnostics: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::SequenceTooShort {
                sequence_name,
                length,
                min_palindrome_length,
                min_distance,
            } => warn!(
                sequence = %sequence_name,
                length,
                min_palindrome_length,
                min_distance,
                "Sequence is too short to hold palindromes of the requested length and distance, it will most likely yield nothing"
            ),
            DiagnosticEvent::ShortPalindromesOnLongSequence {
                sequence_name,
                length,
                min_palindrome_length,
            } => warn!(
                sequence = %sequence_name,
                length,
                min_palindrome_length,
                "Searching for short palindromes in a long sequence may take a very long time; \
                 consider a longer --min-palindrome-length and a larger --blast-word-size"
            ),
            DiagnosticEvent::HitSplit {
                sequence_name,
                first_start,
                first_end,
                midline,
                segments,
            } => debug!(
                sequence = %sequence_name,
                first_start,
                first_end,
                %midline,
                segments,
                "Split alignment hit"
            ),
            DiagnosticEvent::TemporaryDirectoryKept { path } => {
                info!(path = %path.display(), "Temporary alignment directory kept");
            }
            DiagnosticEvent::SequenceSearched {
                sequence_name,
                length,
                strategy,
                palindromes,
            } => debug!(
                sequence = %sequence_name,
                length,
                %strategy,
                palindromes,
                "Searched sequence"
            ),
        }
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn emit(&self, _event: DiagnosticEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let diagnostics = RecordingDiagnostics::new();
        diagnostics.emit(DiagnosticEvent::TemporaryDirectoryKept {
            path: PathBuf::from("/tmp/a"),
        });
        diagnostics.emit(DiagnosticEvent::TemporaryDirectoryKept {
            path: PathBuf::from("/tmp/b"),
        });

        let events = diagnostics.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            DiagnosticEvent::TemporaryDirectoryKept {
                path: PathBuf::from("/tmp/b")
            }
        );
    }
}
