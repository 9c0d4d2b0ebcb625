//! Speech events
//!
//! What observers outside the scheduler can see:
//! - which utterance is audible
//! - how much of an utterance was heard before it ended
//! - browse-mode changes and engine fallback

use serde::{Deserialize, Serialize};

use crate::browse::BrowseMode;
use crate::domain::SoundId;
use crate::engine::EngineKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpeechEvent {
    /// The playback slot changed; `None` when it emptied
    NowPlaying { id: Option<SoundId>, text: Option<String> },
    /// An utterance stopped, naturally (`fraction` 1.0) or interrupted
    SoundFinished { id: SoundId, fraction: f64 },
    ModeChanged { from: BrowseMode, to: BrowseMode },
    EngineFallback { from: EngineKind, to: EngineKind },
}

impl SpeechEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NowPlaying { .. } => "NowPlaying",
            Self::SoundFinished { .. } => "SoundFinished",
            Self::ModeChanged { .. } => "ModeChanged",
            Self::EngineFallback { .. } => "EngineFallback",
        }
    }

    pub fn sound_id(&self) -> Option<SoundId> {
        match self {
            Self::NowPlaying { id, .. } => *id,
            Self::SoundFinished { id, .. } => Some(*id),
            Self::ModeChanged { .. } | Self::EngineFallback { .. } => None,
        }
    }
}

impl std::fmt::Display for SpeechEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NowPlaying {
                id: Some(id),
                text: Some(text),
            } => write!(f, "now playing [{}] {}", id, text),
            Self::NowPlaying { id: Some(id), .. } => write!(f, "now playing [{}]", id),
            Self::NowPlaying { id: None, .. } => write!(f, "now playing nothing"),
            Self::SoundFinished { id, fraction } => write!(f, "finished [{}] {:.0}%", id, fraction * 100.0),
            Self::ModeChanged { from, to } => write!(f, "mode {} -> {}", from, to),
            Self::EngineFallback { from, to } => write!(f, "engine {} -> {}", from, to),
        }
    }
}
