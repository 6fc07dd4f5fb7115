//! Core data types for palindrome search.
//!
//! - [`sequence`]: nucleotide encoding and reverse complements
//! - [`Palindrome`]: an inverted repeat with its two arms and match metrics
//! - [`SearchMethod`], [`SearchStrategy`], [`Span`]: shared small types
//!
//! ## Coordinates
//!
//! All coordinates are 0-based and half-open, into the original (forward)
//! sequence. For a palindrome with arms `[a, b)` and `[c, d)`:
//!
//! | Quantity | Value |
//! |----------|-------|
//! | length   | `b - a` (= `d - c`) |
//! | distance | `c - b` |
//!
//! In-place palindromes have `distance == 0`.

pub mod palindrome;
pub mod sequence;
pub mod types;

pub use palindrome::{Arm, Palindrome, TSV_HEADERS};
pub use types::{SearchMethod, SearchStrategy, Span};
