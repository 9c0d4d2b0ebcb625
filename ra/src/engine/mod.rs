//! Playback engines
//!
//! A [`PlaybackEngine`] turns load requests into audible sound through an
//! [`AudioDevice`], the low-level mechanics of one audio backend. Two
//! adapters exist, selected once at startup by [`EngineKind::select`]:
//!
//! - [`StreamingEngine`] - registry of sound handles, replays cached sounds
//! - [`EmbeddedEngine`] - a single audible element
//!
//! Devices report progress as [`EngineEvent`]s over a channel; the scheduler
//! task consumes them in order with its ticks.

mod device;
mod embedded;
mod error;
mod notice;
mod select;
pub mod simulated;
mod streaming;
#[cfg(test)]
pub(crate) mod testing;
pub mod url;
mod volume;

use serde::{Deserialize, Serialize};

use crate::domain::SoundId;

pub use device::AudioDevice;
pub use embedded::EmbeddedEngine;
pub use error::EngineError;
pub use notice::{EngineEvent, EngineNotice, NoticeSender};
pub use select::EngineSet;
pub use streaming::StreamingEngine;
pub use url::UrlResolver;
pub use volume::Volume;

/// The closed set of engine backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Plugin-style streaming player with a sound registry
    Streaming,
    /// Embedded single-element player
    Embedded,
}

impl EngineKind {
    /// Pick the engine from the embed-mode signal
    pub fn select(embed: bool) -> Self {
        if embed { Self::Embedded } else { Self::Streaming }
    }

    /// The fallback for this kind
    pub fn alternate(&self) -> Self {
        match self {
            Self::Streaming => Self::Embedded,
            Self::Embedded => Self::Streaming,
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Streaming => write!(f, "streaming"),
            Self::Embedded => write!(f, "embedded"),
        }
    }
}

/// A request to fetch, decode and optionally start an utterance's audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Monotonic request number, unique per session
    pub seq: u64,
    pub id: SoundId,
    /// Normalized text the URL was resolved from
    pub text: String,
    pub url: String,
    /// Start playback as soon as the audio is loaded
    pub autoplay: bool,
    /// Volume 0-100 read when the request was made
    pub volume: u8,
}

/// Playback position of a loaded sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayPosition {
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl PlayPosition {
    /// Fraction played, 1.0 when the duration is unknown
    pub fn fraction(&self) -> f64 {
        if self.duration_ms == 0 || self.position_ms >= self.duration_ms {
            1.0
        } else {
            self.position_ms as f64 / self.duration_ms as f64
        }
    }
}

/// Capability set every playback backend provides
pub trait PlaybackEngine: Send {
    fn kind(&self) -> EngineKind;

    /// Begin initialization; readiness or failure arrives as a notice
    fn start(&mut self, notices: NoticeSender);

    /// Whether the engine finished initializing
    fn is_ready(&self) -> bool;

    /// Fetch and decode audio for a request, autoplaying when asked
    fn begin_load(&mut self, request: &LoadRequest);

    /// Replay a sound this engine already holds
    fn play(&mut self, id: SoundId) -> Result<(), EngineError>;

    /// Make an in-flight load start playing once it completes
    fn set_autoplay(&mut self, id: SoundId) -> Result<(), EngineError>;

    /// Whether the sound is loading toward playback or audible. Unknown ids
    /// are not playing.
    fn is_playing(&self, id: SoundId) -> bool;

    /// Silence everything and cancel pending autoplay
    fn stop_all(&mut self);

    /// Number of the playback of `id` this engine still answers for. Playback
    /// notices carrying any other number are left over from an earlier
    /// playback and must be ignored.
    fn playback(&self, id: SoundId) -> Option<u64>;

    /// Update engine-side bookkeeping from a device notice
    fn observe(&mut self, notice: &EngineNotice);

    /// Position of a sound this engine knows about
    fn position(&self, id: SoundId) -> Option<PlayPosition>;
}
