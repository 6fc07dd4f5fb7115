use serde::{Deserialize, Serialize};

/// How a palindrome was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Direct double-pointer scan of the sequence against its reverse complement
    Scan,
    /// Local-alignment hit, possibly split by the segmenter
    Alignment,
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Alignment => write!(f, "alignment"),
        }
    }
}

/// Search strategy applied to a single sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Combinatorial scan, quadratic in sequence length
    Scan,
    /// Local alignment against the reverse complement, then segmentation
    Alignment,
}

impl SearchStrategy {
    /// Pick a strategy by sequence length: anything shorter than
    /// `threshold` is scanned directly.
    #[must_use]
    pub fn for_length(length: usize, threshold: usize) -> Self {
        if length < threshold {
            Self::Scan
        } else {
            Self::Alignment
        }
    }

    #[must_use]
    pub fn method(self) -> SearchMethod {
        match self {
            Self::Scan => SearchMethod::Scan,
            Self::Alignment => SearchMethod::Alignment,
        }
    }
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.method().fmt(f)
    }
}

/// Half-open coordinates `[start, end)` into the original sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `pos` lies strictly inside this span
    #[must_use]
    pub fn strictly_contains(&self, pos: usize) -> bool {
        pos > self.start && pos < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_threshold() {
        assert_eq!(SearchStrategy::for_length(4999, 5000), SearchStrategy::Scan);
        assert_eq!(
            SearchStrategy::for_length(5000, 5000),
            SearchStrategy::Alignment
        );
        assert_eq!(SearchStrategy::for_length(0, 0), SearchStrategy::Alignment);
    }

    #[test]
    fn test_span_contains_is_strict() {
        let span = Span::new(10, 50);
        assert!(span.strictly_contains(15));
        assert!(!span.strictly_contains(10));
        assert!(!span.strictly_contains(50));
        assert_eq!(span.len(), 40);
    }
}
