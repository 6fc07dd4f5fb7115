//! Direct double-pointer scan for inverted repeats.
//!
//! For every start `i` in the forward sequence and every start `j` in the
//! reverse complement, the scanner walks both pointers inward (`k` steps) and
//! tracks mismatches and the last matching offset. An arm is emitted once it
//! has matched through offset `m - 1` and the walk stops because the arms
//! would cross or the mismatch budget ran out.
//!
//! After an emission the scan skips ahead by the emitted arm length, both
//! along `j` and (at the end of the row) along `i`, so palindromes nested in
//! an already reported one are not reported again. This greedy skip can hide
//! distinct overlapping palindromes; that is accepted in exchange for
//! speed. The worst case is still quadratic, which is why this strategy is
//! only the default for short sequences.

use crate::core::palindrome::{Arm, Palindrome};
use crate::core::sequence::{codes_pair, EncodedSequence};
use crate::core::types::SearchMethod;

/// Scan parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    /// Minimum arm length (`m`)
    pub min_length: usize,
    /// Maximum mismatches per arm (`N`)
    pub max_mismatches: usize,
    /// Minimum number of bases between the arms (`D`)
    pub min_distance: usize,
}

/// Arm coordinates in the original sequence, half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmPair {
    pub first_start: usize,
    pub first_end: usize,
    pub second_start: usize,
    pub second_end: usize,
}

impl ArmPair {
    pub fn length(&self) -> usize {
        self.first_end - self.first_start
    }
}

/// Scan `seq` against its reverse complement `rev` and return arm pairs in
/// discovery order.
///
/// Both slices must hold the same encoded sequence (see
/// [`EncodedSequence`]).
pub fn scan(seq: &[u8], rev: &[u8], params: ScanParams) -> Vec<ArmPair> {
    let ScanParams {
        min_length: m,
        max_mismatches: max_mm,
        min_distance: d,
    } = params;
    let len = seq.len();
    debug_assert_eq!(len, rev.len());

    let mut pairs = Vec::new();
    if m == 0 {
        return pairs;
    }

    let mut i = 0;
    while i + m < len + 1 {
        let mut skip_i = 0;
        let mut j = 0;

        while i + j + m < len {
            let mut skip_j = 0;

            if codes_pair(rev[j], seq[i]) {
                let mut k = 0;
                let mut mismatches = 0;
                let mut last_match = 0;
                let mut long_enough = false;

                loop {
                    // left pointer at i + k, right pointer at len - j - k - 1
                    if i + j + 2 * k + 2 > len {
                        if long_enough {
                            pairs.push(emit(len, i, j, last_match));
                            skip_j = last_match;
                            skip_i = skip_i.max(last_match);
                        }
                        break;
                    }

                    if codes_pair(rev[j + k], seq[i + k]) {
                        last_match = k;
                    } else {
                        mismatches += 1;
                    }

                    if mismatches > max_mm {
                        if long_enough {
                            pairs.push(emit(len, i, j, last_match));
                            skip_j = last_match;
                            skip_i = skip_i.max(last_match);
                        }
                        break;
                    }

                    if last_match == m - 1 {
                        long_enough = true;
                    }

                    // bases strictly between the two pointers
                    if len - (i + j + 2 * k + 2) < d {
                        break;
                    }

                    k += 1;
                }
            }

            j += skip_j + 1;
        }

        i += skip_i + 1;
    }

    pairs
}

fn emit(len: usize, i: usize, j: usize, last_match: usize) -> ArmPair {
    ArmPair {
        first_start: i,
        first_end: i + last_match + 1,
        second_start: len - j - last_match - 1,
        second_end: len - j,
    }
}

/// Scan an encoded sequence and build palindromes, longest first.
pub fn find_palindromes(
    sequence: &EncodedSequence,
    sequence_name: &str,
    params: ScanParams,
) -> Vec<Palindrome> {
    let mut pairs = scan(sequence.forward(), sequence.reverse_complement(), params);

    // stable, so equal lengths keep discovery order
    pairs.sort_by(|a, b| b.length().cmp(&a.length()));

    pairs
        .into_iter()
        .map(|pair| {
            let first = Arm::new(
                pair.first_start,
                pair.first_end,
                sequence.slice_text(pair.first_start, pair.first_end),
            );
            let second = Arm::new(
                pair.second_start,
                pair.second_end,
                sequence.slice_reverse_complement(pair.second_start, pair.second_end),
            );
            let distance = pair.second_start - pair.first_end;

            Palindrome::new(sequence_name, SearchMethod::Scan, first, second, distance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min_length: usize, max_mismatches: usize, min_distance: usize) -> ScanParams {
        ScanParams {
            min_length,
            max_mismatches,
            min_distance,
        }
    }

    fn coords(text: &str, p: ScanParams) -> Vec<(usize, usize, usize, usize)> {
        let seq = EncodedSequence::new(text.as_bytes());
        scan(seq.forward(), seq.reverse_complement(), p)
            .into_iter()
            .map(|a| (a.first_start, a.first_end, a.second_start, a.second_end))
            .collect()
    }

    #[test]
    fn test_in_place_palindrome() {
        let seq = EncodedSequence::new(b"AAACGTACGTTTT");
        let found = find_palindromes(&seq, "s", params(4, 0, 0));

        assert_eq!(found.len(), 1);
        let p = &found[0];
        assert_eq!((p.first().start, p.first().end), (0, 6));
        assert_eq!((p.second().start, p.second().end), (6, 12));
        assert_eq!(p.first_sequence(), "AAACGT");
        assert_eq!(p.second_sequence(), "AAACGT");
        assert_eq!(p.second_arm_forward(), "ACGTTT");
        assert_eq!(p.distance(), 0);
        assert_eq!(p.num_mismatches(), 0);
        assert_eq!(p.num_gaps(), 0);
        assert_eq!(p.midline(), "||||||");
        assert_eq!(p.method(), SearchMethod::Scan);
    }

    #[test]
    fn test_distant_palindrome_with_spacer() {
        // GGATCC ... spacer ... GGATCC's partner; arms AAAGGG / CCCTTT
        let text = "AAAGGGCACACACACCCTTT";
        assert_eq!(coords(text, params(6, 0, 0)), vec![(0, 6, 14, 20)]);
    }

    #[test]
    fn test_min_distance_floor_drops_close_arms() {
        let text = "AAAGGGCACACACACCCTTT";
        assert!(coords(text, params(6, 0, 10)).is_empty());
        assert_eq!(coords(text, params(6, 0, 8)), vec![(0, 6, 14, 20)]);
    }

    #[test]
    fn test_mismatch_budget() {
        // second arm has one substitution in the middle
        let text = "AAAGGGCACACACACCGTTT";
        assert!(coords(text, params(6, 0, 0)).is_empty());
        assert_eq!(coords(text, params(6, 1, 0)), vec![(0, 6, 14, 20)]);
    }

    #[test]
    fn test_too_short_sequence() {
        assert!(coords("ACGT", params(4, 0, 0)).is_empty());
        assert!(coords("", params(4, 0, 0)).is_empty());
    }

    #[test]
    fn test_ambiguous_bases_do_not_pair() {
        assert!(coords("NNNNNNNNNNNNNNNN", params(4, 0, 0)).is_empty());
    }

    #[test]
    fn test_sorted_longest_first() {
        // a 4-arm in-place palindrome followed by a 6-arm one
        let text = "GACGTCTTTTTTTTTTAAACGTACGTTT";
        let seq = EncodedSequence::new(text.as_bytes());
        let found = find_palindromes(&seq, "s", params(3, 0, 0));
        let lengths: Vec<usize> = found.iter().map(Palindrome::length).collect();
        let mut sorted = lengths.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lengths, sorted);
    }

    #[test]
    fn test_candidates_satisfy_criteria() {
        let text = "TTGACCATGGTCAAGGCTAGCCTTAGCGCTAAGGATCCAATTGGATCCTT";
        let p = params(4, 1, 2);
        let seq = EncodedSequence::new(text.as_bytes());
        for found in find_palindromes(&seq, "s", p) {
            assert!(found.length() >= 4);
            assert!(found.num_mismatches() <= 1);
            assert!(found.distance() >= 2);
            assert_eq!(found.first().len(), found.second().len());
            assert_eq!(found.first().len(), found.length());
        }
    }

    #[test]
    fn test_scan_is_deterministic() {
        let text = "TTGACCATGGTCAAGGCTAGCCTTAGCGCTAAGGATCCAATTGGATCCTT";
        let p = params(4, 1, 0);
        assert_eq!(coords(text, p), coords(text, p));
    }
}
