//! Utterance identity: normalization and content hashing
//!
//! The hash is fast and non-cryptographic. Collisions are possible; the timing
//! recorder tolerates them by aliasing.

use std::sync::LazyLock;

use regex::Regex;
use xxhash_rust::xxh3::xxh3_64;

use crate::domain::SoundId;

static LEADING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[.?!,\-:]*\s*").expect("leading punctuation pattern is valid"));

static TRAILING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[.?!,:]+\s*$").expect("trailing punctuation pattern is valid"));

/// Normalize text for lookup and URL resolution
///
/// Lowercases, maps a lone `.` to `dot`, and strips leading and trailing
/// punctuation runs. Single characters are kept as-is so that spoken
/// punctuation (`?`, `!`) still has something to say.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    if lowered == "." {
        return "dot".to_string();
    }
    if lowered.chars().count() <= 1 {
        return lowered;
    }
    let stripped = LEADING_PUNCT.replace(&lowered, "");
    TRAILING_PUNCT.replace(&stripped, "").into_owned()
}

/// Hash text that has already been normalized
pub fn hash_normalized(normalized: &str) -> SoundId {
    SoundId::from_raw(xxh3_64(normalized.as_bytes()))
}

/// Content-hash identifier for raw text
pub fn identify(text: &str) -> SoundId {
    hash_normalized(&normalize(text))
}
