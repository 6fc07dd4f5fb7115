//! Nucleotide encoding and reverse complements.
//!
//! Sequences are encoded into a small numeric alphabet before scanning:
//!
//! | Base | Code | Complement |
//! |------|------|------------|
//! | A    | 0    | T          |
//! | T    | 1    | A          |
//! | C    | 2    | G          |
//! | G    | 3    | C          |
//! | other| 4    | N          |
//!
//! Anything outside A/C/G/T (case-insensitive) collapses to the ambiguity
//! code `N`, which complements to itself and never pairs with anything,
//! including another `N`.

/// Numeric code for bases outside A/C/G/T
pub const AMBIGUOUS: u8 = 4;

/// Encode a single base into the numeric alphabet
#[must_use]
pub fn encode_base(base: u8) -> u8 {
    match base {
        b'A' | b'a' => 0,
        b'T' | b't' | b'U' | b'u' => 1,
        b'C' | b'c' => 2,
        b'G' | b'g' => 3,
        _ => AMBIGUOUS,
    }
}

/// Complement of an encoded base
#[must_use]
pub fn complement_code(code: u8) -> u8 {
    match code {
        0 => 1,
        1 => 0,
        2 => 3,
        3 => 2,
        _ => AMBIGUOUS,
    }
}

/// Complement of an uppercase text base
#[must_use]
pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'-' => b'-',
        _ => b'N',
    }
}

/// Whether two aligned text columns count as a match.
///
/// `N` and gap characters never match.
#[must_use]
pub fn bases_pair(a: u8, b: u8) -> bool {
    a == b && a != b'N' && a != b'-'
}

/// Whether two encoded bases count as a match
#[must_use]
pub fn codes_pair(a: u8, b: u8) -> bool {
    a == b && a != AMBIGUOUS
}

/// Normalize raw sequence text: uppercase A/C/G/T, everything else `N`.
#[must_use]
pub fn normalize(raw: &[u8]) -> Vec<u8> {
    raw.iter()
        .map(|b| match b.to_ascii_uppercase() {
            b'U' => b'T',
            upper @ (b'A' | b'C' | b'G' | b'T') => upper,
            _ => b'N',
        })
        .collect()
}

/// Reverse complement of normalized sequence text
#[must_use]
pub fn reverse_complement(text: &[u8]) -> Vec<u8> {
    text.iter().rev().map(|&b| complement_base(b)).collect()
}

/// A sequence prepared for scanning: normalized text plus the forward and
/// reverse-complement numeric arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSequence {
    text: Vec<u8>,
    forward: Vec<u8>,
    reverse_complement: Vec<u8>,
}

impl EncodedSequence {
    pub fn new(raw: &[u8]) -> Self {
        let text = normalize(raw);
        let forward: Vec<u8> = text.iter().map(|&b| encode_base(b)).collect();
        let reverse_complement = forward.iter().rev().map(|&c| complement_code(c)).collect();

        Self {
            text,
            forward,
            reverse_complement,
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Normalized uppercase text
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn forward(&self) -> &[u8] {
        &self.forward
    }

    pub fn reverse_complement(&self) -> &[u8] {
        &self.reverse_complement
    }

    /// Decode `[start, end)` of the original sequence
    pub fn slice_text(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.text[start..end]).into_owned()
    }

    /// Decode `[start, end)` of the original sequence as its reverse
    /// complement, i.e. in the orientation that pairs with a first arm.
    pub fn slice_reverse_complement(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&reverse_complement(&self.text[start..end])).into_owned()
    }
}
