use serde::Serialize;

use crate::core::sequence::bases_pair;
use crate::core::types::{SearchMethod, Span};

/// Column headers of the tabular palindrome report, in field order
pub const TSV_HEADERS: [&str; 11] = [
    "sequence_name",
    "length",
    "distance",
    "num_mismatches",
    "first_start",
    "first_end",
    "first_sequence",
    "second_start",
    "second_end",
    "second_sequence",
    "midline",
];

/// One arm of a palindrome: its coordinates in the original sequence and
/// its aligned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm {
    pub span: Span,
    pub sequence: String,
}

impl Arm {
    pub fn new(start: usize, end: usize, sequence: impl Into<String>) -> Self {
        Self {
            span: Span::new(start, end),
            sequence: sequence.into(),
        }
    }
}

/// An inverted repeat found in a sequence.
///
/// The second arm's text is stored reverse-complemented, so that column `i`
/// of `first_sequence` and `second_sequence` is the base pair that was
/// compared; `midline` marks each column with `|` (match), `x` (mismatch) or
/// `-` (gap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palindrome {
    sequence_name: String,
    method: SearchMethod,
    length: usize,
    distance: usize,
    num_mismatches: usize,
    num_gaps: usize,
    first_start: usize,
    first_end: usize,
    first_sequence: String,
    second_start: usize,
    second_end: usize,
    second_sequence: String,
    midline: String,
}

impl Palindrome {
    /// Build a palindrome from its two arms.
    ///
    /// Mismatch and gap counts and the midline are derived from the aligned
    /// arm texts.
    pub fn new(
        sequence_name: impl Into<String>,
        method: SearchMethod,
        first: Arm,
        second: Arm,
        distance: usize,
    ) -> Self {
        let midline: String = first
            .sequence
            .bytes()
            .zip(second.sequence.bytes())
            .map(|(a, b)| {
                if a == b'-' || b == b'-' {
                    '-'
                } else if bases_pair(a, b) {
                    '|'
                } else {
                    'x'
                }
            })
            .collect();

        let num_mismatches = midline.bytes().filter(|&c| c == b'x').count();
        let num_gaps = midline.bytes().filter(|&c| c == b'-').count();

        Self {
            sequence_name: sequence_name.into(),
            method,
            length: midline.len(),
            distance,
            num_mismatches,
            num_gaps,
            first_start: first.span.start,
            first_end: first.span.end,
            first_sequence: first.sequence,
            second_start: second.span.start,
            second_end: second.span.end,
            second_sequence: second.sequence,
            midline,
        }
    }

    pub fn sequence_name(&self) -> &str {
        &self.sequence_name
    }

    pub fn method(&self) -> SearchMethod {
        self.method
    }

    /// Number of aligned columns (arm length for gapless palindromes)
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of bases between the end of the first arm and the start of
    /// the second
    pub fn distance(&self) -> usize {
        self.distance
    }

    pub fn num_mismatches(&self) -> usize {
        self.num_mismatches
    }

    pub fn num_gaps(&self) -> usize {
        self.num_gaps
    }

    pub fn first(&self) -> Span {
        Span::new(self.first_start, self.first_end)
    }

    pub fn second(&self) -> Span {
        Span::new(self.second_start, self.second_end)
    }

    pub fn first_sequence(&self) -> &str {
        &self.first_sequence
    }

    /// Second arm, reverse-complemented to pair column-wise with the first
    pub fn second_sequence(&self) -> &str {
        &self.second_sequence
    }

    /// Second arm as it reads in the original sequence
    pub fn second_arm_forward(&self) -> String {
        let text: Vec<u8> = crate::core::sequence::reverse_complement(self.second_sequence.as_bytes());
        String::from_utf8_lossy(&text).into_owned()
    }

    pub fn midline(&self) -> &str {
        &self.midline
    }

    /// Positions (column offsets) of mismatching columns
    pub fn mismatch_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.midline
            .bytes()
            .enumerate()
            .filter(|(_, c)| *c == b'x')
            .map(|(i, _)| i)
    }

    /// Report fields in [`TSV_HEADERS`] order
    pub fn tsv_fields(&self) -> [String; 11] {
        [
            self.sequence_name.clone(),
            self.length.to_string(),
            self.distance.to_string(),
            self.num_mismatches.to_string(),
            self.first_start.to_string(),
            self.first_end.to_string(),
            self.first_sequence.clone(),
            self.second_start.to_string(),
            self.second_end.to_string(),
            self.second_sequence.clone(),
            self.midline.clone(),
        ]
    }
}

impl std::fmt::Display for Palindrome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Len: {}; Dist: {}; {} ({}:{}) :: {} ({}:{})",
            self.length,
            self.distance,
            self.first_sequence,
            self.first_start,
            self.first_end,
            self.second_sequence,
            self.second_start,
            self.second_end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Palindrome {
        Palindrome::new(
            "contig_1",
            SearchMethod::Scan,
            Arm::new(3, 9, "ACGTAA"),
            Arm::new(20, 26, "ACCTAA"),
            11,
        )
    }

    #[test]
    fn test_derived_metrics() {
        let p = sample();
        assert_eq!(p.length(), 6);
        assert_eq!(p.midline(), "||x|||");
        assert_eq!(p.num_mismatches(), 1);
        assert_eq!(p.num_gaps(), 0);
        assert_eq!(p.mismatch_offsets().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_gap_columns() {
        let p = Palindrome::new(
            "s",
            SearchMethod::Alignment,
            Arm::new(0, 4, "AC-GT"),
            Arm::new(10, 15, "ACTGA"),
            6,
        );
        assert_eq!(p.midline(), "||-|x");
        assert_eq!(p.num_gaps(), 1);
        assert_eq!(p.num_mismatches(), 1);
    }

    #[test]
    fn test_second_arm_forward() {
        let p = sample();
        assert_eq!(p.second_arm_forward(), "TTAGGT");
    }

    #[test]
    fn test_tsv_fields_order() {
        let fields = sample().tsv_fields();
        assert_eq!(fields.len(), TSV_HEADERS.len());
        assert_eq!(fields[0], "contig_1");
        assert_eq!(fields[1], "6");
        assert_eq!(fields[2], "11");
        assert_eq!(fields[3], "1");
        assert_eq!(fields[10], "||x|||");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "Len: 6; Dist: 11; ACGTAA (3:9) :: ACCTAA (20:26)"
        );
    }
}
