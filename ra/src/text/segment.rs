//! Boundary-aware text segmentation
//!
//! Shorter fragments reach first audio sooner and let the prefetcher pipeline
//! loads across fragment boundaries.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Sentence and clause boundaries
///
/// Matches `. ! ? : ;` or a closing paren followed by whitespace, whitespace
/// before an opening paren, a spaced dash, and the full-width full stop,
/// exclamation, question mark, colon, comma and semicolon. Surrounding runs
/// of punctuation and whitespace are absorbed into the boundary.
static BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[.!?:;\s]*(?:\s+\(|\s+-\s+|[.!?:;)]\s+|[\x{3002}\x{FF01}\x{FF1F}\x{FF1A}\x{FF0C}\x{FF1B}])+[.!?:;\s]*",
    )
    .expect("boundary pattern is valid")
});

/// Split text into trimmed, non-empty fragments at boundaries
///
/// Total over all inputs: empty or punctuation-only text yields an empty
/// vector, and no fragment contains a boundary match.
pub fn split_boundaries(text: &str) -> Vec<String> {
    let fragments: Vec<String> = BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|piece| !piece.is_empty() && !BOUNDARY.is_match(piece))
        .map(str::to_string)
        .collect();
    debug!(input_len = text.len(), fragments = fragments.len(), "split_boundaries: done");
    fragments
}

/// Whether `text` contains a boundary
pub fn has_boundary(text: &str) -> bool {
    BOUNDARY.is_match(text)
}

/// Segmenter with the boundary-splitting switch applied
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    split_by_boundaries: bool,
}

impl Segmenter {
    pub fn new(split_by_boundaries: bool) -> Self {
        Self { split_by_boundaries }
    }

    /// Produce the fragments to enqueue for `text`
    pub fn segment(&self, text: &str) -> Vec<String> {
        if self.split_by_boundaries {
            return split_boundaries(text);
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(true)
    }
}
