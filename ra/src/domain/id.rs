//! Content-hash identifiers for utterances

use serde::{Deserialize, Serialize};

/// Identifier derived from an utterance's normalized text
///
/// Two fragments with the same normalized text share a `SoundId`. The value is
/// only stable within one process; nothing persists it across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundId(u64);

impl SoundId {
    /// Wrap a raw hash value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw hash value
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl std::str::FromStr for SoundId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| format!("Invalid sound id '{}': {}", s, e))
    }
}
