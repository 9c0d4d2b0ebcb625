//! Speech runner messages
//!
//! Requests and replies for the actor that owns the scheduler.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use super::collaborators::KeyAction;
use crate::browse::BrowseMode;
use crate::domain::SoundId;
use crate::engine::EngineKind;
use crate::timing::TimingReport;

/// Errors from speech handle operations
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech runner has stopped")]
    ChannelError,
}

/// Response from speech handle operations
pub type SpeechResponse<T> = Result<T, SpeechError>;

/// Snapshot of the scheduler for status queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechStatus {
    pub mode: BrowseMode,
    pub engine: EngineKind,
    pub engine_ready: bool,
    pub playing: Option<SoundId>,
    pub queued: usize,
    pub actions_pending: bool,
    pub free_slots: usize,
    pub deferred: usize,
    pub sounds_played: u64,
}

impl SpeechStatus {
    /// Nothing is playing, queued or pending, and the mode will not advance
    pub fn is_idle(&self) -> bool {
        self.engine_ready
            && self.playing.is_none()
            && self.queued == 0
            && !self.actions_pending
            && self.mode.direction().is_none()
            && self.mode != BrowseMode::Looping
    }
}

/// Requests sent to the speech runner
#[derive(Debug)]
pub enum SpeechRequest {
    AddSound {
        text: String,
        reply: oneshot::Sender<usize>,
    },
    Action(KeyAction),
    SetMode(BrowseMode),
    Reset {
        reply: oneshot::Sender<usize>,
    },
    Silence,
    PrefetchKeys,
    Status {
        reply: oneshot::Sender<SpeechStatus>,
    },
    TimingReport {
        reply: oneshot::Sender<TimingReport>,
    },
    Shutdown,
}

impl SpeechRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddSound { .. } => "add_sound",
            Self::Action(_) => "action",
            Self::SetMode(_) => "set_mode",
            Self::Reset { .. } => "reset",
            Self::Silence => "silence",
            Self::PrefetchKeys => "prefetch_keys",
            Self::Status { .. } => "status",
            Self::TimingReport { .. } => "timing_report",
            Self::Shutdown => "shutdown",
        }
    }
}
