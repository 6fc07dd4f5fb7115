//! Local-alignment boundary.
//!
//! The alignment strategy aligns a sequence against its own reverse
//! complement with any [`AlignmentBackend`], then runs the raw hits through
//! [`filter::filter_hits`], which drops duplicates and splits hits that fail
//! the acceptance criteria.
//!
//! Two backends ship with the crate:
//!
//! - [`SeedExtendAligner`]: in-process k-mer seeding and ungapped X-drop
//!   extension, the default
//! - [`BlastnAligner`]: NCBI BLAST+ `blastn`, run in a scoped temporary
//!   directory

use thiserror::Error;

use crate::core::types::Span;
use crate::diagnostics::Diagnostics;

pub mod blastn;
pub mod filter;
pub mod seed_extend;

pub use blastn::BlastnAligner;
pub use filter::{filter_hits, HitFilterParams};
pub use seed_extend::SeedExtendAligner;

#[derive(Error, Debug)]
pub enum AlignmentError {
    #[error("Could not find executable '{executable}'. Install BLAST+ or set {env_var}")]
    ToolNotFound {
        executable: String,
        env_var: &'static str,
    },

    #[error("{executable} failed (status={status:?}): {stderr}")]
    ToolFailed {
        executable: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Malformed alignment output on line {line}: {reason}")]
    MalformedOutput { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build alignment thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One self-vs-reverse-complement alignment request.
///
/// The query is aligned against its own reverse complement only; hits on the
/// forward strand are never requested.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentRequest<'a> {
    /// Normalized uppercase sequence text
    pub query: &'a [u8],
    /// Hits below this percent identity are not reported
    pub min_percent_identity: f64,
    /// Seed length
    pub word_size: usize,
    /// Worker threads the tool may use
    pub num_threads: usize,
}

/// A local alignment between a stretch of the query and a stretch of its
/// reverse complement, in BLAST conventions.
///
/// Coordinates are 1-based and inclusive. The hit arm lies on the minus
/// strand, so `hit_from > hit_to` for every hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentHit {
    pub query_from: usize,
    pub query_to: usize,
    pub hit_from: usize,
    pub hit_to: usize,
    /// Aligned query text, `-` for gaps
    pub query_aligned: String,
    /// Aligned hit text (reverse-complemented), `-` for gaps
    pub hit_aligned: String,
    pub align_len: usize,
    pub identity: usize,
    pub gaps: usize,
}

impl AlignmentHit {
    /// First arm as 0-based half-open coordinates
    pub fn first_arm(&self) -> Span {
        Span::new(self.query_from.saturating_sub(1), self.query_to)
    }

    /// Second arm as 0-based half-open coordinates on the forward strand
    pub fn second_arm(&self) -> Span {
        let low = self.hit_from.min(self.hit_to);
        let high = self.hit_from.max(self.hit_to);
        Span::new(low.saturating_sub(1), high)
    }

    pub fn mismatches(&self) -> usize {
        self.align_len.saturating_sub(self.identity)
    }
}

/// A local-alignment capability
pub trait AlignmentBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Align `request.query` against its reverse complement.
    ///
    /// # Errors
    ///
    /// Any failure is fatal for the sequence; partial hit lists are never
    /// returned.
    fn search(
        &self,
        request: &AlignmentRequest<'_>,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Vec<AlignmentHit>, AlignmentError>;
}

/// Which alignment backend to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AlignerKind {
    /// In-process seed-and-extend
    #[default]
    Builtin,
    /// External NCBI BLAST+ blastn
    Blastn,
}

impl AlignerKind {
    /// Build the backend. `keep_temp` only affects tools that use temporary
    /// files.
    pub fn build(self, keep_temp: bool) -> Box<dyn AlignmentBackend> {
        match self {
            Self::Builtin => Box::new(SeedExtendAligner::default()),
            Self::Blastn => Box::new(BlastnAligner::from_env(keep_temp)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_arms() {
        let hit = AlignmentHit {
            query_from: 4,
            query_to: 7,
            hit_from: 14,
            hit_to: 11,
            query_aligned: "ATCC".to_string(),
            hit_aligned: "ATCC".to_string(),
            align_len: 4,
            identity: 4,
            gaps: 0,
        };
        assert_eq!(hit.first_arm(), Span::new(3, 7));
        assert_eq!(hit.second_arm(), Span::new(10, 14));
        assert_eq!(hit.mismatches(), 0);
    }
}
