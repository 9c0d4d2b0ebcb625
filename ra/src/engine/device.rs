//! Low-level audio backend capability

use super::NoticeSender;
use crate::domain::SoundId;

/// The mechanics of one audio backend
///
/// Implementations must not block: every call returns promptly and reports
/// progress later through the [`NoticeSender`] handed to `init`.
pub trait AudioDevice: Send {
    /// Start initialization, reporting `Ready` or `InitFailed`
    fn init(&mut self, notices: NoticeSender);

    /// Fetch and decode `url`, reporting `LoadComplete`
    fn load(&mut self, id: SoundId, url: &str, volume: u8);

    /// Start a loaded sound, reporting `PlayStart`, progress and `PlayFinish`
    /// tagged with `playback`
    fn play(&mut self, id: SoundId, playback: u64);

    /// Silence all sounds
    fn stop_all(&mut self);
}
