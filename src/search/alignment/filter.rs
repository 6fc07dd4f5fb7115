//! Turn raw alignment hits into palindromes.
//!
//! Hits are taken in the order the backend reported them. For each hit:
//!
//! 1. The hit whose second arm lies before its first arm is the mirror image
//!    of another hit and is dropped.
//! 2. Hits closer than the minimum distance are dropped.
//! 3. In-place hits (distance 0) whose first arm starts strictly inside an
//!    already accepted in-place palindrome are nested duplicates and are
//!    dropped.
//! 4. Hits shorter than the minimum length are dropped.
//! 5. Hits with too many mismatches, or with any gap, are split into the
//!    qualifying segments found by [`resolve`]; everything else is accepted
//!    whole.

use super::AlignmentHit;
use crate::core::palindrome::{Arm, Palindrome};
use crate::core::types::{SearchMethod, Span};
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::search::segmenter::{resolve, MatchProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitFilterParams {
    pub min_length: usize,
    pub max_mismatches: usize,
    pub min_distance: usize,
}

pub fn filter_hits(
    hits: &[AlignmentHit],
    sequence_name: &str,
    params: HitFilterParams,
    diagnostics: &dyn Diagnostics,
) -> Vec<Palindrome> {
    let mut accepted: Vec<Palindrome> = Vec::new();

    for hit in hits {
        let first = hit.first_arm();
        let second = hit.second_arm();

        let distance = if first.start == second.start {
            0
        } else if second.start >= first.end {
            second.start - first.end
        } else {
            continue;
        };

        if distance < params.min_distance {
            continue;
        }

        if distance == 0
            && accepted
                .iter()
                .any(|p| p.distance() == 0 && p.first().strictly_contains(first.start))
        {
            continue;
        }

        if hit.align_len < params.min_length {
            continue;
        }

        if hit.mismatches() > params.max_mismatches || hit.gaps > 0 {
            accepted.extend(split_hit(
                hit,
                first,
                second,
                distance,
                sequence_name,
                params,
                diagnostics,
            ));
        } else {
            accepted.push(Palindrome::new(
                sequence_name,
                SearchMethod::Alignment,
                Arm::new(first.start, first.end, hit.query_aligned.as_str()),
                Arm::new(second.start, second.end, hit.hit_aligned.as_str()),
                distance,
            ));
        }
    }

    accepted
}

/// Cut the qualifying segments out of a hit.
///
/// Segment columns are mapped back to sequence coordinates by counting the
/// non-gap characters before the segment on each side: forward from the
/// first arm's start, and backward from the second arm's end since the hit
/// arm runs on the minus strand.
fn split_hit(
    hit: &AlignmentHit,
    first: Span,
    second: Span,
    distance: usize,
    sequence_name: &str,
    params: HitFilterParams,
    diagnostics: &dyn Diagnostics,
) -> Vec<Palindrome> {
    let query = hit.query_aligned.as_bytes();
    let subject = hit.hit_aligned.as_bytes();
    let profile = MatchProfile::from_aligned(query, subject);
    let segments = resolve(&profile, params.min_length, params.max_mismatches);
    if segments.is_empty() {
        return Vec::new();
    }

    diagnostics.emit(DiagnosticEvent::HitSplit {
        sequence_name: sequence_name.to_string(),
        first_start: first.start,
        first_end: first.end,
        midline: profile.to_string(),
        segments: segments.len(),
    });

    let query_offsets = residue_offsets(query);
    let subject_offsets = residue_offsets(subject);

    segments
        .iter()
        .map(|segment| {
            let first_start = first.start + query_offsets[segment.start];
            let second_end = second.end.saturating_sub(subject_offsets[segment.start]);
            let length = segment.len();

            Palindrome::new(
                sequence_name,
                SearchMethod::Alignment,
                Arm::new(
                    first_start,
                    first_start + length,
                    slice(query, segment.start, segment.end),
                ),
                Arm::new(
                    second_end.saturating_sub(length),
                    second_end,
                    slice(subject, segment.start, segment.end),
                ),
                distance,
            )
        })
        .collect()
}

/// `offsets[c]` is the number of non-gap characters in `aligned[..c]`
fn residue_offsets(aligned: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(aligned.len() + 1);
    let mut count = 0;
    offsets.push(0);
    for &c in aligned {
        if c != b'-' {
            count += 1;
        }
        offsets.push(count);
    }
    offsets
}

fn slice(aligned: &[u8], start: usize, end: usize) -> String {
    String::from_utf8_lossy(&aligned[start..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{NullDiagnostics, RecordingDiagnostics};

    fn params(min_length: usize, max_mismatches: usize, min_distance: usize) -> HitFilterParams {
        HitFilterParams {
            min_length,
            max_mismatches,
            min_distance,
        }
    }

    fn hit(
        (query_from, query_to): (usize, usize),
        (hit_from, hit_to): (usize, usize),
        query_aligned: &str,
        hit_aligned: &str,
    ) -> AlignmentHit {
        let identity = query_aligned
            .bytes()
            .zip(hit_aligned.bytes())
            .filter(|(a, b)| a == b && *a != b'-')
            .count();
        let gaps = query_aligned
            .bytes()
            .zip(hit_aligned.bytes())
            .filter(|(a, b)| *a == b'-' || *b == b'-')
            .count();
        AlignmentHit {
            query_from,
            query_to,
            hit_from,
            hit_to,
            query_aligned: query_aligned.to_string(),
            hit_aligned: hit_aligned.to_string(),
            align_len: query_aligned.len(),
            identity,
            gaps,
        }
    }

    #[test]
    fn test_accepts_clean_distant_hit() {
        let arm = "ACGTTGCAACGTTGCA";
        let hits = vec![hit((1, 16), (60, 45), arm, arm)];
        let found = filter_hits(&hits, "s", params(10, 0, 0), &NullDiagnostics);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first(), Span::new(0, 16));
        assert_eq!(found[0].second(), Span::new(44, 60));
        assert_eq!(found[0].distance(), 28);
        assert_eq!(found[0].method(), SearchMethod::Alignment);
    }

    #[test]
    fn test_drops_mirror_hit() {
        let arm = "ACGTTGCAACGTTGCA";
        let hits = vec![hit((45, 60), (16, 1), arm, arm)];
        assert!(filter_hits(&hits, "s", params(10, 0, 0), &NullDiagnostics).is_empty());
    }

    #[test]
    fn test_min_distance_and_length() {
        let arm = "ACGTTGCAACGTTGCA";
        let hits = vec![hit((1, 16), (46, 31), arm, arm)];
        assert_eq!(filter_hits(&hits, "s", params(10, 0, 14), &NullDiagnostics).len(), 1);
        assert!(filter_hits(&hits, "s", params(10, 0, 20), &NullDiagnostics).is_empty());
        assert!(filter_hits(&hits, "s", params(20, 0, 0), &NullDiagnostics).is_empty());
    }

    #[test]
    fn test_drops_nested_in_place_duplicate() {
        let outer = "A".repeat(40);
        let inner = "A".repeat(10);
        let hits = vec![
            hit((11, 50), (50, 11), &outer, &outer),
            hit((16, 25), (25, 16), &inner, &inner),
        ];
        let found = filter_hits(&hits, "s", params(10, 0, 0), &NullDiagnostics);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first(), Span::new(10, 50));
        assert_eq!(found[0].distance(), 0);
    }

    #[test]
    fn test_splits_hit_with_too_many_mismatches() {
        // 12 matches, 2 mismatches, 12 matches
        let query = "ACGTACGTACGTAAACGTACGTACGT";
        let subject = "ACGTACGTACGTCCACGTACGTACGT";
        let hits = vec![hit((1, 26), (80, 55), query, subject)];
        let diagnostics = RecordingDiagnostics::new();
        let found = filter_hits(&hits, "s", params(10, 0, 0), &diagnostics);

        assert_eq!(found.len(), 2);
        let mut spans: Vec<(Span, Span)> = found.iter().map(|p| (p.first(), p.second())).collect();
        spans.sort();
        assert_eq!(spans[0], (Span::new(0, 12), Span::new(68, 80)));
        assert_eq!(spans[1], (Span::new(14, 26), Span::new(54, 66)));
        for p in &found {
            assert_eq!(p.num_mismatches(), 0);
            assert_eq!(p.distance(), 28);
        }
        assert!(matches!(
            diagnostics.events().as_slice(),
            [DiagnosticEvent::HitSplit { segments: 2, .. }]
        ));
    }

    #[test]
    fn test_split_remaps_coordinates_across_gaps() {
        // a gap in the hit arm shifts the query coordinates of the second
        // segment by one more than the hit coordinates
        let query = "ACGTACGTACGTAACGTACGTACGTA";
        let subject = "ACGTACGTACGT-ACGTACGTACGTA";
        let hits = vec![hit((1, 26), (90, 66), query, subject)];
        let found = filter_hits(&hits, "s", params(10, 0, 0), &NullDiagnostics);

        let mut spans: Vec<(Span, Span)> = found.iter().map(|p| (p.first(), p.second())).collect();
        spans.sort();
        assert_eq!(
            spans,
            vec![
                (Span::new(0, 12), Span::new(78, 90)),
                (Span::new(13, 26), Span::new(65, 78)),
            ]
        );
        for p in &found {
            assert_eq!(p.num_gaps(), 0);
            assert_eq!(p.first().len(), p.second().len());
        }
    }

    #[test]
    fn test_residue_offsets() {
        assert_eq!(residue_offsets(b"AC-G"), vec![0, 1, 2, 2, 3]);
    }
}
