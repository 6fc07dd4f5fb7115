//! # palindrome-search
//!
//! A library for finding palindromes (inverted repeats) in nucleotide
//! sequences.
//!
//! A palindrome is a pair of arms where the second arm, read on the opposite
//! strand, matches the first. The arms may touch (an in-place palindrome such
//! as `GAATTC`) or be separated by a spacer, and may differ at a limited
//! number of positions.
//!
//! ## Features
//!
//! - **Direct scan**: exhaustive scan against the reverse complement for
//!   short sequences
//! - **Alignment**: seed-and-extend (or NCBI BLAST+) alignment of long
//!   sequences against their reverse complement
//! - **Hit segmentation**: noisy alignment hits are split into the longest
//!   disjoint segments that meet the length and mismatch limits
//! - **Parallel runs**: sequences of a FASTA file or contigs table are
//!   searched concurrently
//!
//! ## Example
//!
//! ```rust
//! use palindrome_search::{PalindromeSearch, SearchConfig};
//!
//! let config = SearchConfig {
//!     min_palindrome_length: 4,
//!     blast_word_size: 4,
//!     ..SearchConfig::default()
//! };
//! let search = PalindromeSearch::with_defaults(config).unwrap();
//!
//! let found = search.find(b"AAACGTACGTTTT", "example").unwrap();
//! for palindrome in &found {
//!     println!("{palindrome}");
//! }
//! assert_eq!(found[0].distance(), 0);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Sequences, palindromes and shared types
//! - [`search`]: Scanner, aligners, segmenter and the search engine
//! - [`parsing`]: FASTA and contigs table readers
//! - [`report`]: Summaries and the TSV report
//! - [`diagnostics`]: Structured events emitted while searching
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod diagnostics;
pub mod parsing;
pub mod report;
pub mod search;
pub mod utils;

pub use crate::core::{Palindrome, SearchMethod, SearchStrategy, Span};
pub use crate::diagnostics::{
    DiagnosticEvent, Diagnostics, NullDiagnostics, RecordingDiagnostics, TracingDiagnostics,
};
pub use crate::search::{PalindromeSearch, SearchConfig, SearchError};
