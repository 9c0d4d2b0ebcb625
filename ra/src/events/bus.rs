//! Speech bus - broadcast of speech events to observers

use tokio::sync::broadcast;
use tracing::debug;

use super::types::SpeechEvent;
use crate::browse::BrowseMode;
use crate::domain::SoundId;
use crate::engine::EngineKind;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Fan-out of speech events
///
/// Emitting never blocks: with no subscribers the event is dropped, and a
/// slow subscriber loses the oldest events.
pub struct SpeechBus {
    tx: broadcast::Sender<SpeechEvent>,
}

impl SpeechBus {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "SpeechBus::new: creating speech bus");
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn emit(&self, event: SpeechEvent) {
        debug!(event_type = event.event_type(), id = ?event.sound_id(), "SpeechBus::emit");
        let _ = self.tx.send(event);
    }

    /// Receive every event emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SpeechEvent> {
        debug!("SpeechBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Handle for emitting without owning the bus
    pub fn emitter(&self) -> SpeechEmitter {
        SpeechEmitter { tx: self.tx.clone() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SpeechBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Cheap-to-clone emitter with convenience methods
#[derive(Clone)]
pub struct SpeechEmitter {
    tx: broadcast::Sender<SpeechEvent>,
}

impl SpeechEmitter {
    pub fn emit(&self, event: SpeechEvent) {
        debug!(event_type = event.event_type(), "SpeechEmitter::emit");
        let _ = self.tx.send(event);
    }

    pub fn now_playing(&self, id: Option<SoundId>, text: Option<&str>) {
        self.emit(SpeechEvent::NowPlaying {
            id,
            text: text.map(str::to_string),
        });
    }

    pub fn sound_finished(&self, id: SoundId, fraction: f64) {
        self.emit(SpeechEvent::SoundFinished { id, fraction });
    }

    pub fn mode_changed(&self, from: BrowseMode, to: BrowseMode) {
        self.emit(SpeechEvent::ModeChanged { from, to });
    }

    pub fn engine_fallback(&self, from: EngineKind, to: EngineKind) {
        self.emit(SpeechEvent::EngineFallback { from, to });
    }
}
