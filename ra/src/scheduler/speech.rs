//! The scheduler context
//!
//! [`Speech`] owns everything the tick and the engine notices touch: queue,
//! playback slot, prefetch budget, browse mode, timing and the engines.
//! Collaborators receive `&mut Speech` to enqueue text or change modes.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::config::SchedulerConfig;
use crate::browse::{BrowseMode, BrowseState, Direction};
use crate::domain::{SoundId, Utterance};
use crate::engine::{EngineSet, LoadRequest, PlaybackEngine, UrlResolver, Volume};
use crate::events::SpeechEmitter;
use crate::prefetch::{LoadOutcome, PrefetchManager};
use crate::queue::{PlaybackSlot, SoundQueue};
use crate::text::Segmenter;
use crate::timing::TimingRecorder;

/// Key codes whose names are prefetched at session start
pub const ECHO_KEYS: [std::ops::RangeInclusive<u32>; 2] = [32..=96, 123..=126];

const BACKSPACE: u32 = 8;

/// Spoken name of a key code
pub fn key_name(keycode: u32) -> Option<String> {
    if keycode == BACKSPACE {
        return Some("back space".to_string());
    }
    char::from_u32(keycode)
        .filter(|c| !c.is_control())
        .map(|c| c.to_string())
}

/// Every key code that gets echoed
pub fn echo_keycodes() -> impl Iterator<Item = u32> {
    std::iter::once(BACKSPACE).chain(ECHO_KEYS.into_iter().flatten())
}

pub struct Speech {
    pub(crate) queue: SoundQueue,
    pub(crate) slot: PlaybackSlot,
    pub(crate) prefetch: PrefetchManager,
    pub(crate) browse: BrowseState,
    pub(crate) timing: TimingRecorder,
    pub(crate) engines: EngineSet,
    urls: UrlResolver,
    volume: Volume,
    segmenter: Segmenter,
    prefetch_queue: bool,
    pub(crate) events: SpeechEmitter,
    seq: u64,
    keys_wanted: bool,
    keys_prefetched: bool,
}

/// Build a numbered load request for an utterance
fn build_request(seq: &mut u64, urls: &UrlResolver, volume: u8, utterance: &Utterance, autoplay: bool) -> LoadRequest {
    *seq += 1;
    LoadRequest {
        seq: *seq,
        id: utterance.id,
        text: utterance.normalized_text.clone(),
        url: urls.resolve(&utterance.normalized_text),
        autoplay,
        volume,
    }
}

impl Speech {
    pub fn new(
        config: &SchedulerConfig,
        engines: EngineSet,
        urls: UrlResolver,
        volume: Volume,
        events: SpeechEmitter,
    ) -> Self {
        debug!(engine = %engines.kind(), ?config, "Speech::new: called");
        Self {
            queue: SoundQueue::new(),
            slot: PlaybackSlot::new(),
            prefetch: PrefetchManager::new(config.prefetch_slots),
            browse: BrowseState::default(),
            timing: TimingRecorder::new(),
            engines,
            urls,
            volume,
            segmenter: Segmenter::new(config.split_by_boundaries),
            prefetch_queue: config.prefetch_queue,
            events,
            seq: 0,
            keys_wanted: false,
            keys_prefetched: false,
        }
    }

    /// Segment `text` and queue each fragment, returning how many were queued
    pub fn add_sound(&mut self, text: &str) -> usize {
        let fragments = self.segmenter.segment(text);
        debug!(fragments = fragments.len(), queued = self.queue.len(), "Speech::add_sound: called");
        for fragment in &fragments {
            self.queue.enqueue(Utterance::new(fragment.as_str()));
        }
        fragments.len()
    }

    /// Stop playback, empty the queue and drop waiting loads
    ///
    /// Returns the discarded queue contents, oldest first.
    pub fn reset_sounds(&mut self) -> Vec<Utterance> {
        debug!(playing = ?self.slot.current_id(), queued = self.queue.len(), "Speech::reset_sounds: called");
        let engine = self.engines.active_mut();
        let interrupted = self.slot.current().map(|entry| {
            let fraction = if entry.started {
                engine.position(entry.utterance.id).map(|p| p.fraction()).unwrap_or(0.0)
            } else {
                0.0
            };
            (entry.utterance.id, fraction)
        });
        engine.stop_all();
        if let Some((id, fraction)) = interrupted {
            self.events.sound_finished(id, fraction);
        }
        let had_slot = self.slot.take().is_some();
        let dropped = self.queue.reset();
        self.prefetch.clear_deferred();
        if had_slot {
            self.events.now_playing(None, None);
        }
        dropped
    }

    /// Silence everything and stop automatic reading
    pub fn silence_all(&mut self) {
        info!("Silencing all speech");
        self.set_mode(BrowseMode::KeyboardDriven);
        self.reset_sounds();
    }

    pub fn set_mode(&mut self, mode: BrowseMode) {
        if let Some(previous) = self.browse.set(mode) {
            self.events.mode_changed(previous, mode);
        }
    }

    pub fn mode(&self) -> BrowseMode {
        self.browse.mode()
    }

    pub fn is_going_backwards(&self) -> bool {
        self.browse.is_going_backwards()
    }

    pub fn advance_direction(&self) -> Option<Direction> {
        self.browse.advance_direction()
    }

    pub fn is_playing_something(&self) -> bool {
        !self.slot.is_empty()
    }

    pub fn now_playing(&self) -> Option<&Utterance> {
        self.slot.current().map(|e| &e.utterance)
    }

    /// Queued utterances, next to play first
    pub fn queued(&self) -> Vec<Utterance> {
        self.queue.peek_all()
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn timing(&self) -> &TimingRecorder {
        &self.timing
    }

    pub fn prefetch(&self) -> &PrefetchManager {
        &self.prefetch
    }

    pub fn engine(&self) -> &dyn PlaybackEngine {
        self.engines.active()
    }

    /// Warm the cache with every echoed key name, once per session
    ///
    /// Waits for the engine if it is not ready yet.
    pub fn prefetch_keys(&mut self) {
        if self.keys_prefetched {
            debug!("Speech::prefetch_keys: already done");
            return;
        }
        self.keys_wanted = true;
        self.warm_keys();
    }

    pub(crate) fn warm_keys(&mut self) {
        if !self.keys_wanted || self.keys_prefetched || !self.engines.active().is_ready() {
            return;
        }
        self.keys_prefetched = true;
        let mut count = 0;
        for name in echo_keycodes().filter_map(key_name) {
            self.load(&Utterance::new(name), false);
            count += 1;
        }
        info!(count, "Prefetching key echo sounds");
    }

    /// Request audio for an utterance through the budget, recording timing
    pub(crate) fn load(&mut self, utterance: &Utterance, autoplay: bool) -> LoadOutcome {
        let request = build_request(&mut self.seq, &self.urls, self.volume.get(), utterance, autoplay);
        let outcome = self.prefetch.request_load(self.engines.active_mut(), request);
        let record = autoplay || matches!(outcome, LoadOutcome::Started | LoadOutcome::Deferred);
        if record {
            self.timing
                .record_request(utterance.id, &utterance.normalized_text, autoplay, Utc::now());
        }
        debug!(id = %utterance.id, autoplay, ?outcome, "Speech::load: done");
        outcome
    }

    /// Start loads for queued utterances while budget remains
    pub(crate) fn prefetch_queued(&mut self) {
        if !self.prefetch_queue || self.queue.is_empty() {
            return;
        }
        let snapshot = self.queue.peek_all();
        let volume = self.volume.get();
        let seq = &mut self.seq;
        let urls = &self.urls;
        let requests = snapshot.iter().map(|u| build_request(seq, urls, volume, u, false));
        let started = self.prefetch.prefetch_snapshot(self.engines.active_mut(), requests);
        let now = Utc::now();
        for request in &started {
            self.timing.record_request(request.id, &request.text, false, now);
        }
    }

    /// Switch to the standby engine after the active one failed to start
    pub(crate) fn fall_back(&mut self, reason: &str) {
        warn!(engine = %self.engines.kind(), %reason, "Playback engine failed to initialize");
        let Some((from, to)) = self.engines.fall_back() else {
            return;
        };
        self.prefetch.abandon();
        if self.slot.take().is_some() {
            self.events.now_playing(None, None);
        }
        self.events.engine_fallback(from, to);
    }

    /// Whether the slot's utterance still counts as playing
    pub(crate) fn slot_active(&self, id: SoundId) -> bool {
        self.prefetch.is_deferred(id) || self.engines.active().is_playing(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(8).as_deref(), Some("back space"));
        assert_eq!(key_name(32).as_deref(), Some(" "));
        assert_eq!(key_name(65).as_deref(), Some("A"));
        assert_eq!(key_name(126).as_deref(), Some("~"));
        assert_eq!(key_name(7), None);
    }

    #[test]
    fn test_echo_keycodes() {
        let codes: Vec<u32> = echo_keycodes().collect();
        assert_eq!(codes.len(), 1 + 65 + 4);
        assert_eq!(codes[0], 8);
        assert!(codes.contains(&96));
        assert!(!codes.contains(&97));
        assert!(codes.contains(&123));
    }
}
