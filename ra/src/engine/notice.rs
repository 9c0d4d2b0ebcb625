//! Engine notifications

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

use super::EngineKind;
use crate::domain::SoundId;

/// Something a device reports about its sounds
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotice {
    /// The backend finished initializing
    Ready,
    /// The backend will never become ready
    InitFailed { reason: String },
    /// A load finished, successfully or not
    LoadComplete {
        id: SoundId,
        ok: bool,
        duration_ms: Option<u64>,
    },
    /// Playback notices carry the number the engine gave that playback, so
    /// notices from an earlier playback of the same sound can be told apart.
    PlayStart { id: SoundId, playback: u64 },
    PlayProgress {
        id: SoundId,
        playback: u64,
        position_ms: u64,
    },
    PlayFinish {
        id: SoundId,
        playback: u64,
        duration_ms: Option<u64>,
    },
}

impl EngineNotice {
    /// The sound this notice is about
    pub fn sound_id(&self) -> Option<SoundId> {
        match self {
            Self::Ready | Self::InitFailed { .. } => None,
            Self::LoadComplete { id, .. }
            | Self::PlayStart { id, .. }
            | Self::PlayProgress { id, .. }
            | Self::PlayFinish { id, .. } => Some(*id),
        }
    }

    /// The playback number of a playback notice
    pub fn playback(&self) -> Option<u64> {
        match self {
            Self::PlayStart { playback, .. } | Self::PlayProgress { playback, .. } | Self::PlayFinish { playback, .. } => {
                Some(*playback)
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InitFailed { .. } => "init_failed",
            Self::LoadComplete { .. } => "load_complete",
            Self::PlayStart { .. } => "play_start",
            Self::PlayProgress { .. } => "play_progress",
            Self::PlayFinish { .. } => "play_finish",
        }
    }
}

/// A notice stamped with its origin and arrival time
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub engine: EngineKind,
    pub at: DateTime<Utc>,
    pub notice: EngineNotice,
}

impl EngineEvent {
    pub fn new(engine: EngineKind, notice: EngineNotice) -> Self {
        Self {
            engine,
            at: Utc::now(),
            notice,
        }
    }
}

/// Channel handle a device uses to report notices for one engine
#[derive(Debug, Clone)]
pub struct NoticeSender {
    engine: EngineKind,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl NoticeSender {
    pub fn new(engine: EngineKind, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { engine, tx }
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Send a notice; a closed scheduler means nobody is listening
    pub fn send(&self, notice: EngineNotice) {
        debug!(engine = %self.engine, notice = notice.name(), "NoticeSender::send");
        let _ = self.tx.send(EngineEvent::new(self.engine, notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_stamps_engine() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = NoticeSender::new(EngineKind::Embedded, tx);
        sender.send(EngineNotice::Ready);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.engine, EngineKind::Embedded);
        assert_eq!(event.notice, EngineNotice::Ready);
    }

    #[test]
    fn test_send_after_close_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        NoticeSender::new(EngineKind::Streaming, tx).send(EngineNotice::Ready);
    }

    #[test]
    fn test_sound_id() {
        let id = SoundId::from_raw(9);
        assert_eq!(EngineNotice::PlayStart { id, playback: 3 }.sound_id(), Some(id));
        assert_eq!(EngineNotice::Ready.sound_id(), None);
    }

    #[test]
    fn test_playback_number() {
        let id = SoundId::from_raw(9);
        let finish = EngineNotice::PlayFinish {
            id,
            playback: 4,
            duration_ms: None,
        };
        assert_eq!(finish.playback(), Some(4));
        assert_eq!(EngineNotice::LoadComplete { id, ok: true, duration_ms: None }.playback(), None);
    }
}
