//! Engine error types

use thiserror::Error;

use super::EngineKind;
use crate::domain::SoundId;

/// Errors from engine operations
///
/// None of these are fatal; callers fall back to a fresh load or treat the
/// sound as not playing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Engine {0} is not ready")]
    NotReady(EngineKind),

    #[error("No sound handle for {0}")]
    UnknownSound(SoundId),

    #[error("Sound {0} is still loading")]
    StillLoading(SoundId),

    #[error("Sound {0} failed to load")]
    LoadFailed(SoundId),
}

impl EngineError {
    /// Whether a fresh load request could recover from this error
    pub fn needs_reload(&self) -> bool {
        matches!(self, EngineError::UnknownSound(_) | EngineError::LoadFailed(_))
    }
}
