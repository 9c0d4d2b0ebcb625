//! Scheduler test harness driven by hand-delivered notices

use tokio::sync::{broadcast, mpsc};

use super::collaborators::{ParagraphCursor, PendingActions};
use super::config::SchedulerConfig;
use super::core::{Scheduler, TickOutcome};
use super::speech::Speech;
use crate::browse::BrowseMode;
use crate::domain::SoundId;
use crate::engine::testing::RecordingDevice;
use crate::engine::{EmbeddedEngine, EngineEvent, EngineKind, EngineNotice, EngineSet, StreamingEngine, UrlResolver, Volume};
use crate::events::{SpeechBus, SpeechEvent};

pub(crate) struct Harness {
    pub scheduler: Scheduler,
    pub streaming: RecordingDevice,
    pub embedded: RecordingDevice,
    pub events: broadcast::Receiver<SpeechEvent>,
    _bus: SpeechBus,
    _notices: mpsc::UnboundedReceiver<EngineEvent>,
}

pub(crate) fn speech(config: &SchedulerConfig, bus: &SpeechBus) -> (Speech, RecordingDevice, RecordingDevice, mpsc::UnboundedReceiver<EngineEvent>) {
    let streaming = RecordingDevice::new();
    let embedded = RecordingDevice::new();
    let mut engines = EngineSet::new(
        Box::new(StreamingEngine::new(Box::new(streaming.clone()))),
        Some(Box::new(EmbeddedEngine::new(Box::new(embedded.clone())))),
    );
    let (tx, rx) = mpsc::unbounded_channel();
    engines.start(tx);
    let urls = UrlResolver::new("https://tts.test/?q=$text$", "https://tts.test/sounds", None);
    let speech = Speech::new(config, engines, urls, Volume::default(), bus.emitter());
    (speech, streaming, embedded, rx)
}

impl Harness {
    pub fn new(config: SchedulerConfig, nodes: &[&str], mode: BrowseMode) -> Self {
        let bus = SpeechBus::new(256);
        let events = bus.subscribe();
        let (mut speech, streaming, embedded, notices) = speech(&config, &bus);
        speech.set_mode(mode);
        let cursor = ParagraphCursor::new(nodes.iter().map(|n| n.to_string()).collect());
        let scheduler = Scheduler::new(speech, Box::new(cursor), Box::new(PendingActions::new()));
        let mut harness = Self {
            scheduler,
            streaming,
            embedded,
            events,
            _bus: bus,
            _notices: notices,
        };
        harness.drain();
        harness
    }

    /// Deliver a notice from the active engine
    pub fn notify(&mut self, notice: EngineNotice) -> Option<TickOutcome> {
        let kind = self.scheduler.speech().engine().kind();
        self.notify_from(kind, notice)
    }

    pub fn notify_from(&mut self, kind: EngineKind, notice: EngineNotice) -> Option<TickOutcome> {
        self.scheduler.handle_event(EngineEvent::new(kind, notice))
    }

    pub fn ready(&mut self) {
        self.notify(EngineNotice::Ready);
    }

    pub fn loaded(&mut self, id: SoundId) {
        self.notify(EngineNotice::LoadComplete {
            id,
            ok: true,
            duration_ms: Some(500),
        });
    }

    /// The active engine's current playback number for `id`
    pub fn playback(&self, id: SoundId) -> Option<u64> {
        self.scheduler.speech().engine().playback(id)
    }

    /// Report the current playback of `id` audible
    pub fn started(&mut self, id: SoundId) -> Option<TickOutcome> {
        let playback = self.playback(id).expect("sound has a playback");
        self.notify(EngineNotice::PlayStart { id, playback })
    }

    /// Report the current playback of `id` finished
    pub fn finished(&mut self, id: SoundId, duration_ms: Option<u64>) -> Option<TickOutcome> {
        let playback = self.playback(id).expect("sound has a playback");
        self.notify(EngineNotice::PlayFinish {
            id,
            playback,
            duration_ms,
        })
    }

    pub fn drain(&mut self) -> Vec<SpeechEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Ids carried by NowPlaying events, in order
    pub fn now_playing(events: &[SpeechEvent]) -> Vec<Option<SoundId>> {
        events
            .iter()
            .filter_map(|e| match e {
                SpeechEvent::NowPlaying { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }
}
