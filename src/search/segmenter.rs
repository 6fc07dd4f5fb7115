//! Salvage valid sub-palindromes from noisy alignment hits.
//!
//! An alignment hit is reduced to a [`MatchProfile`], one [`Column`] per
//! aligned position. [`resolve`] returns the longest disjoint stretches of the
//! profile that contain no gaps and at most `max_mismatches` mismatches.
//!
//! Using the textual form (`o` match, `x` mismatch, `-` gap):
//!
//! ```text
//! profile:   ooxooooooooooooooooxoooxoxxoxxoxoooooooooxoxxoxooooooooo--ooo-o-xoxoooxoooooooooooooooooo
//! ML 5 MM 0:    oooooooooooooooo             ooooooooo      ooooooooo               oooooooooooooooooo
//! ML 5 MM 1:    ooooooooooooooooxooo         oooooooooxo  oxooooooooo           oooxoooooooooooooooooo
//! ML15 MM 3: ooxooooooooooooooooxoooxo                                        oxoooxoooooooooooooooooo
//! ```

use thiserror::Error;

/// One aligned column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Match,
    Mismatch,
    Gap,
}

impl Column {
    fn symbol(self) -> char {
        match self {
            Self::Match => 'o',
            Self::Mismatch => 'x',
            Self::Gap => '-',
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid match profile symbol '{symbol}' at position {position} (expected 'o', 'x' or '-')")]
pub struct ProfileError {
    pub symbol: char,
    pub position: usize,
}

/// Per-column classification of two aligned arms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchProfile {
    columns: Vec<Column>,
}

impl MatchProfile {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Classify two aligned texts column by column. A `-` on either side is
    /// a gap; otherwise columns that pair are matches.
    pub fn from_aligned(first: &[u8], second: &[u8]) -> Self {
        let columns = first
            .iter()
            .zip(second)
            .map(|(&a, &b)| {
                if a == b'-' || b == b'-' {
                    Column::Gap
                } else if crate::core::sequence::bases_pair(a, b) {
                    Column::Match
                } else {
                    Column::Mismatch
                }
            })
            .collect();

        Self { columns }
    }

    /// Parse the textual `o`/`x`/`-` form
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` on any other character.
    pub fn parse(map: &str) -> Result<Self, ProfileError> {
        let columns = map
            .chars()
            .enumerate()
            .map(|(position, symbol)| match symbol {
                'o' => Ok(Column::Match),
                'x' => Ok(Column::Mismatch),
                '-' => Ok(Column::Gap),
                _ => Err(ProfileError { symbol, position }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of mismatch columns in `[start, end)`
    pub fn mismatches_in(&self, start: usize, end: usize) -> usize {
        self.columns[start..end]
            .iter()
            .filter(|c| **c == Column::Mismatch)
            .count()
    }
}

impl std::fmt::Display for MatchProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for column in &self.columns {
            write!(f, "{}", column.symbol())?;
        }
        Ok(())
    }
}

/// A half-open range of profile columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether `self` lies strictly before or strictly after `other`
    fn separated_from(&self, other: &Segment) -> bool {
        self.end < other.start || self.start > other.end
    }
}

/// Resolve a profile into the longest disjoint segments, sorted by start.
///
/// Every returned segment is longer than `min_length`, contains no gap and at
/// most `max_mismatches` mismatches. Segments are picked longest first, and a
/// segment is only kept when it lies strictly before or after every segment
/// picked so far (touching counts as overlapping).
pub fn resolve(profile: &MatchProfile, min_length: usize, max_mismatches: usize) -> Vec<Segment> {
    if profile.len() < min_length {
        return Vec::new();
    }

    let mut windows: Vec<Segment> = candidate_windows(profile.columns(), max_mismatches)
        .into_iter()
        .filter(|w| w.len() > min_length)
        .collect();

    // stable: equal lengths keep generation order
    windows.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut accepted = Vec::new();
    while !windows.is_empty() {
        let best = windows.remove(0);
        accepted.push(best);
        windows.retain(|w| w.separated_from(&best));
    }

    accepted.sort();
    accepted
}

/// Every maximal window for every restart position.
///
/// Restarts are column 0 and the column after each mismatch. A window never
/// starts on a mismatch: the start steps over it while the end cursor, which
/// lags behind, still counts it against that window's mismatch budget.
fn candidate_windows(columns: &[Column], max_mismatches: usize) -> Vec<Segment> {
    let len = columns.len();
    let restarts = std::iter::once(0).chain(
        columns
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Column::Mismatch)
            .map(|(pos, _)| pos + 1),
    );

    let mut windows = Vec::new();
    let mut close = |start: usize, end: usize| {
        if end > start {
            windows.push(Segment { start, end });
        }
    };

    for restart in restarts {
        let mut start = restart;
        let mut end = restart;
        let mut mismatches = 0;

        while start < len {
            if columns[start] == Column::Mismatch {
                start += 1;
                continue;
            }

            match columns[end] {
                Column::Match => end += 1,
                Column::Mismatch => {
                    mismatches += 1;
                    if mismatches > max_mismatches {
                        close(start, end);
                        mismatches = 0;
                        start = end + 1;
                        end = start;
                    } else {
                        end += 1;
                    }
                }
                Column::Gap => {
                    close(start, end);
                    mismatches = 0;
                    start = end + 1;
                    end = start;
                }
            }

            if end >= len {
                close(start, end);
                break;
            }
        }
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EXAMPLE: &str =
        "ooxooooooooooooooooxoooxoxxoxxoxoooooooooxoxxoxooooooooo--ooo-o-xoxoooxoooooooooooooooooo";

    fn spans(map: &str, min_length: usize, max_mismatches: usize) -> Vec<(usize, usize)> {
        let profile = MatchProfile::parse(map).unwrap();
        resolve(&profile, min_length, max_mismatches)
            .into_iter()
            .map(|s| (s.start, s.end))
            .collect()
    }

    #[test]
    fn test_example_no_mismatches() {
        assert_eq!(
            spans(EXAMPLE, 5, 0),
            vec![(3, 19), (32, 41), (47, 56), (71, 89)]
        );
    }

    #[test]
    fn test_example_one_mismatch() {
        assert_eq!(
            spans(EXAMPLE, 5, 1),
            vec![(3, 23), (32, 43), (45, 56), (67, 89)]
        );
    }

    #[test]
    fn test_example_two_mismatches() {
        assert_eq!(
            spans(EXAMPLE, 5, 2),
            vec![(0, 23), (30, 43), (45, 56), (65, 89)]
        );
    }

    #[test]
    fn test_example_long_segments() {
        assert_eq!(spans(EXAMPLE, 15, 3), vec![(0, 25), (65, 89)]);
    }

    #[test]
    fn test_salvages_clean_run() {
        // mismatches at 4, 11 and 12, then a clean run of 40
        let map = format!("ooooxoooooo{}{}", "xx", "o".repeat(40));
        assert_eq!(spans(&map, 20, 1), vec![(13, 53)]);
    }

    #[test]
    fn test_salvages_clean_run_without_mismatch_budget() {
        let map = format!("oxoooo{}ooooxoooxo", "o".repeat(30));
        assert_eq!(spans(&map, 20, 0), vec![(2, 40)]);
    }

    #[test]
    fn test_budget_absorbs_one_flanking_mismatch() {
        let map = format!("{}x{}x{}x{}", "o".repeat(5), "o".repeat(5), "o".repeat(40), "o".repeat(5));
        assert_eq!(spans(&map, 20, 1), vec![(12, 58)]);
    }

    #[test]
    fn test_short_profile_is_empty() {
        assert!(spans("ooo", 5, 0).is_empty());
    }

    #[test]
    fn test_gaps_are_never_included() {
        assert_eq!(spans("oooooo-oooooooo", 3, 2), vec![(0, 6), (7, 15)]);
        assert_eq!(spans("oooooo-oooooooo", 6, 2), vec![(7, 15)]);
    }

    #[test]
    fn test_length_must_exceed_minimum() {
        assert!(spans("ooooo", 5, 0).is_empty());
        assert_eq!(spans("oooooo", 5, 0), vec![(0, 6)]);
    }

    #[test]
    fn test_trailing_mismatch_does_not_panic() {
        assert_eq!(spans("ooooooox", 3, 0), vec![(0, 7)]);
        assert!(spans("xxxx", 1, 0).is_empty());
    }

    #[test]
    fn test_from_aligned() {
        let profile = MatchProfile::from_aligned(b"ACG-TA", b"ACTATA");
        assert_eq!(profile.to_string(), "oox-oo");
        assert_eq!(profile.len(), 6);
    }

    #[test]
    fn test_parse_rejects_unknown_symbols() {
        let err = MatchProfile::parse("oo?o").unwrap_err();
        assert_eq!(err.symbol, '?');
        assert_eq!(err.position, 2);
    }

    fn column() -> impl Strategy<Value = Column> {
        prop_oneof![
            6 => Just(Column::Match),
            2 => Just(Column::Mismatch),
            1 => Just(Column::Gap),
        ]
    }

    /// Valid ranges that start and end on a match column
    fn valid_ranges(
        profile: &MatchProfile,
        min_length: usize,
        max_mismatches: usize,
    ) -> Vec<Segment> {
        let columns = profile.columns();
        let mut ranges = Vec::new();
        for start in 0..columns.len() {
            for end in start + 1..=columns.len() {
                let range = &columns[start..end];
                if range.len() > min_length
                    && range[0] == Column::Match
                    && range[range.len() - 1] == Column::Match
                    && !range.contains(&Column::Gap)
                    && profile.mismatches_in(start, end) <= max_mismatches
                {
                    ranges.push(Segment { start, end });
                }
            }
        }
        ranges
    }

    proptest! {
        #[test]
        fn prop_segments_are_valid_and_disjoint(
            columns in proptest::collection::vec(column(), 0..80),
            min_length in 1usize..12,
            max_mismatches in 0usize..4,
        ) {
            let profile = MatchProfile::new(columns);
            let segments = resolve(&profile, min_length, max_mismatches);

            for s in &segments {
                prop_assert!(s.len() > min_length);
                prop_assert!(profile.mismatches_in(s.start, s.end) <= max_mismatches);
                prop_assert!(!profile.columns()[s.start..s.end].contains(&Column::Gap));
            }
            for pair in segments.windows(2) {
                prop_assert!(pair[0].end < pair[1].start);
            }
        }

        #[test]
        fn prop_no_longer_valid_range_is_left_out(
            columns in proptest::collection::vec(column(), 0..60),
            min_length in 1usize..10,
            max_mismatches in 0usize..3,
        ) {
            let profile = MatchProfile::new(columns);
            let segments = resolve(&profile, min_length, max_mismatches);
            let longest = segments.iter().map(Segment::len).max().unwrap_or(0);

            for range in valid_ranges(&profile, min_length, max_mismatches) {
                if segments.iter().all(|s| range.separated_from(s)) {
                    prop_assert!(range.len() <= longest);
                }
            }
        }
    }
}
