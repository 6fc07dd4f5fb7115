//! In-process seed-and-extend aligner.
//!
//! Every k-mer of the query is indexed, the reverse complement is scanned for
//! exact seed matches, and each seed is extended without gaps in both
//! directions until the running score drops more than `x_drop` below the best
//! score seen. Seeds that fall inside an extension already made on the same
//! diagonal are skipped.
//!
//! The subject scan is split into fixed-size chunks that run on a rayon pool
//! sized by [`AlignmentRequest::num_threads`]. The pool is built once and
//! reused across requests; a single thread scans in the calling thread.
//! Chunk boundaries never depend on the thread count, and hits are
//! deduplicated and sorted afterwards, so the output is the same for any
//! number of threads.

use std::cmp::Reverse;
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use rayon::ThreadPool;
use rustc_hash::FxHashMap;

use super::{AlignmentBackend, AlignmentError, AlignmentHit, AlignmentRequest};
use crate::core::sequence::{bases_pair, reverse_complement};
use crate::diagnostics::Diagnostics;

pub const DEFAULT_REWARD: i32 = 1;
pub const DEFAULT_PENALTY: i32 = -3;
pub const DEFAULT_X_DROP: i32 = 20;

/// Longest k-mer that fits the 2-bit lookup key
const MAX_KEY_LENGTH: usize = 32;

/// Subject positions scanned per parallel task
const SUBJECT_CHUNK: usize = 4096;

/// Query k-mer positions keyed by 2-bit encoding
type KmerLookup = FxHashMap<u64, Vec<u32>>;

#[derive(Debug)]
pub struct SeedExtendAligner {
    reward: i32,
    penalty: i32,
    x_drop: i32,
    /// Pool of the last requested size
    pool: Mutex<Option<(usize, Arc<ThreadPool>)>>,
}

impl Default for SeedExtendAligner {
    fn default() -> Self {
        Self::new(DEFAULT_REWARD, DEFAULT_PENALTY, DEFAULT_X_DROP)
    }
}

/// Ungapped high-scoring pair, half-open on both sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Hsp {
    q_start: usize,
    q_end: usize,
    s_start: usize,
    s_end: usize,
    score: i32,
}

impl AlignmentBackend for SeedExtendAligner {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn search(
        &self,
        request: &AlignmentRequest<'_>,
        _diagnostics: &dyn Diagnostics,
    ) -> Result<Vec<AlignmentHit>, AlignmentError> {
        let query = request.query;
        let word = request.word_size;
        if word == 0 || query.len() < word {
            return Ok(Vec::new());
        }

        let subject = reverse_complement(query);
        let lookup = build_lookup(query, word);
        if lookup.is_empty() {
            return Ok(Vec::new());
        }

        let positions = query.len() - word + 1;
        let chunks = positions.div_ceil(SUBJECT_CHUNK);

        let scan_chunk = |chunk: usize| {
            let start = chunk * SUBJECT_CHUNK;
            let end = (start + SUBJECT_CHUNK).min(positions);
            self.scan_subject(query, &subject, &lookup, word, start, end)
        };

        let num_threads = request.num_threads.max(1);
        let mut hsps: Vec<Hsp> = if num_threads == 1 {
            (0..chunks).flat_map(scan_chunk).collect()
        } else {
            self.pool(num_threads)?
                .install(|| (0..chunks).into_par_iter().flat_map(scan_chunk).collect())
        };

        hsps.sort_unstable();
        hsps.dedup();
        hsps.sort_by_key(|h| (Reverse(h.score), h.q_start, h.s_start));

        let len = query.len();
        Ok(hsps
            .into_iter()
            .map(|h| to_hit(query, &subject, len, h))
            .filter(|hit| percent_identity(hit) >= request.min_percent_identity)
            .collect())
    }
}

impl SeedExtendAligner {
    pub fn new(reward: i32, penalty: i32, x_drop: i32) -> Self {
        Self {
            reward,
            penalty,
            x_drop,
            pool: Mutex::new(None),
        }
    }

    /// A pool of `num_threads` workers, reused while the size stays the same
    fn pool(&self, num_threads: usize) -> Result<Arc<ThreadPool>, AlignmentError> {
        let mut cached = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((threads, pool)) = cached.as_ref() {
            if *threads == num_threads {
                return Ok(Arc::clone(pool));
            }
        }

        let pool = Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()?,
        );
        *cached = Some((num_threads, Arc::clone(&pool)));
        Ok(pool)
    }

    /// Seeds and extends every subject k-mer starting in `[start, end)`
    fn scan_subject(
        &self,
        query: &[u8],
        subject: &[u8],
        lookup: &KmerLookup,
        word: usize,
        start: usize,
        end: usize,
    ) -> Vec<Hsp> {
        let mut hsps = Vec::new();
        // furthest subject end reached on each diagonal
        let mut covered: FxHashMap<isize, usize> = FxHashMap::default();

        for s_pos in start..end {
            let Some(key) = encode_kmer(subject, s_pos, word) else {
                continue;
            };
            let Some(hits) = lookup.get(&key) else {
                continue;
            };

            for &q_pos in hits {
                let q_pos = q_pos as usize;
                let diagonal = s_pos as isize - q_pos as isize;
                if covered.get(&diagonal).is_some_and(|&end| s_pos < end) {
                    continue;
                }
                // keys only hold the first bases of long words
                if query[q_pos..q_pos + word] != subject[s_pos..s_pos + word] {
                    continue;
                }

                let hsp = self.extend(query, subject, q_pos, s_pos);
                covered.insert(diagonal, hsp.s_end);
                hsps.push(hsp);
            }
        }

        hsps
    }

    /// X-drop ungapped extension. The seed base is scored once, on the left
    /// pass.
    fn extend(&self, query: &[u8], subject: &[u8], q_pos: usize, s_pos: usize) -> Hsp {
        let score_of = |q: u8, s: u8| {
            if bases_pair(q, s) {
                self.reward
            } else {
                self.penalty
            }
        };

        let mut score = 0;
        let mut best = 0;
        let mut best_left = 0;
        for i in 0..=q_pos.min(s_pos) {
            score += score_of(query[q_pos - i], subject[s_pos - i]);
            if score > best {
                best = score;
                best_left = i;
            } else if best - score > self.x_drop {
                break;
            }
        }

        let mut score = best;
        let mut best_right = 0;
        let mut j = 1;
        while q_pos + j < query.len() && s_pos + j < subject.len() {
            score += score_of(query[q_pos + j], subject[s_pos + j]);
            if score > best {
                best = score;
                best_right = j;
            } else if best - score > self.x_drop {
                break;
            }
            j += 1;
        }

        Hsp {
            q_start: q_pos - best_left,
            q_end: q_pos + best_right + 1,
            s_start: s_pos - best_left,
            s_end: s_pos + best_right + 1,
            score: best,
        }
    }
}

/// 2-bit encode `seq[start..start + k]`, keyed on at most the first
/// [`MAX_KEY_LENGTH`] bases. `None` if the window holds anything but ACGT.
fn encode_kmer(seq: &[u8], start: usize, k: usize) -> Option<u64> {
    let window = seq.get(start..start + k)?;
    if window.iter().any(|b| !matches!(b, b'A' | b'C' | b'G' | b'T')) {
        return None;
    }

    let mut encoded: u64 = 0;
    for &base in window.iter().take(MAX_KEY_LENGTH) {
        let code = match base {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            _ => 3,
        };
        encoded = (encoded << 2) | code;
    }
    Some(encoded)
}

fn build_lookup(query: &[u8], word: usize) -> KmerLookup {
    let mut lookup = KmerLookup::default();
    for q_pos in 0..=query.len() - word {
        if let Some(key) = encode_kmer(query, q_pos, word) {
            lookup.entry(key).or_default().push(q_pos as u32);
        }
    }
    lookup
}

/// Convert subject coordinates on the reverse complement back to 1-based
/// minus-strand coordinates on the forward sequence
fn to_hit(query: &[u8], subject: &[u8], len: usize, hsp: Hsp) -> AlignmentHit {
    let q = &query[hsp.q_start..hsp.q_end];
    let s = &subject[hsp.s_start..hsp.s_end];
    let identity = q.iter().zip(s).filter(|(a, b)| bases_pair(**a, **b)).count();

    AlignmentHit {
        query_from: hsp.q_start + 1,
        query_to: hsp.q_end,
        hit_from: len - hsp.s_start,
        hit_to: len - hsp.s_end + 1,
        query_aligned: String::from_utf8_lossy(q).into_owned(),
        hit_aligned: String::from_utf8_lossy(s).into_owned(),
        align_len: q.len(),
        identity,
        gaps: 0,
    }
}

fn percent_identity(hit: &AlignmentHit) -> f64 {
    if hit.align_len == 0 {
        return 0.0;
    }
    hit.identity as f64 * 100.0 / hit.align_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::normalize;
    use crate::diagnostics::NullDiagnostics;

    fn request(query: &[u8], word_size: usize, min_percent_identity: f64) -> AlignmentRequest<'_> {
        AlignmentRequest {
            query,
            min_percent_identity,
            word_size,
            num_threads: 1,
        }
    }

    #[test]
    fn test_encode_kmer_rejects_ambiguous() {
        assert_eq!(encode_kmer(b"ACGT", 0, 4), Some(0b00_01_10_11));
        assert_eq!(encode_kmer(b"ACNT", 0, 4), None);
        assert_eq!(encode_kmer(b"ACG", 0, 4), None);
    }

    #[test]
    fn test_extension_stops_at_x_drop() {
        let aligner = SeedExtendAligner::default();
        let query = b"GGGGGGACGTACGTGGGGGG";
        let subject = b"CCCCCCACGTACGTCCCCCC";
        let hsp = aligner.extend(query, subject, 6, 6);
        assert_eq!((hsp.q_start, hsp.q_end), (6, 14));
        assert_eq!(hsp.score, 8);
    }

    #[test]
    fn test_finds_planted_inverted_repeat() {
        // arms GAATTCCGATCGGTACCTTA and its reverse complement, spaced apart
        let left = b"GAATTCCGATCGGTACCTTA";
        let right = reverse_complement(left);
        let mut text = b"CCCCCCCCCC".to_vec();
        text.extend_from_slice(left);
        text.extend_from_slice(b"CCCCCCCCCCCCCCCCCCCC");
        text.extend_from_slice(&right);
        text.extend_from_slice(b"CCCCCCCCCC");
        let query = normalize(&text);

        let hits = SeedExtendAligner::default()
            .search(&request(&query, 10, 100.0), &NullDiagnostics)
            .unwrap();

        let planted = hits
            .iter()
            .find(|h| h.query_from == 11 && h.query_to == 30)
            .expect("planted arm should be aligned");
        assert_eq!((planted.hit_from, planted.hit_to), (70, 51));
        assert_eq!(planted.query_aligned, planted.hit_aligned);
        assert_eq!(planted.identity, planted.align_len);
    }

    #[test]
    fn test_thread_count_does_not_change_hits() {
        let text = normalize(b"TTGACCATGGTCAAGGCTAGCCTTAGCGCTAAGGATCCAATTGGATCCTTGACCATGGTCAA");
        let aligner = SeedExtendAligner::default();
        let single = aligner
            .search(&request(&text, 6, 0.0), &NullDiagnostics)
            .unwrap();
        let mut multi_request = request(&text, 6, 0.0);
        multi_request.num_threads = 4;
        let multi = aligner.search(&multi_request, &NullDiagnostics).unwrap();
        assert_eq!(single, multi);
    }

    #[test]
    fn test_pool_is_reused_for_same_size() {
        let aligner = SeedExtendAligner::default();
        let first = aligner.pool(2).unwrap();
        let again = aligner.pool(2).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.current_num_threads(), 2);

        let resized = aligner.pool(3).unwrap();
        assert!(!Arc::ptr_eq(&first, &resized));
        assert_eq!(resized.current_num_threads(), 3);
    }

    #[test]
    fn test_short_query() {
        let hits = SeedExtendAligner::default()
            .search(&request(b"ACGT", 10, 100.0), &NullDiagnostics)
            .unwrap();
        assert!(hits.is_empty());
    }
}
