//! Scheduler tick and engine notice handling

use tracing::{debug, info};

use super::collaborators::{ActionQueue, Navigator};
use super::messages::SpeechStatus;
use super::speech::Speech;
use crate::browse::{BrowseMode, Direction};
use crate::domain::{SoundId, Utterance};
use crate::engine::{EngineEvent, EngineNotice};

/// Upper bound on actions run back-to-back within one tick
const MAX_ACTIONS_PER_TICK: usize = 64;

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The active engine is not ready
    Waiting,
    /// The next utterance moved into the slot
    Started(SoundId),
    /// Actions ran until the per-tick bound
    RanAction,
    /// The document cursor was asked to move
    Advanced(Direction),
    /// The slot's utterance stopped playing and was cleared
    Cleared(SoundId),
    StillPlaying(SoundId),
    Idle,
}

/// Tick counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub actions_run: u64,
    pub advances: u64,
    pub stale_finishes: u64,
}

pub struct Scheduler {
    speech: Speech,
    navigator: Box<dyn Navigator>,
    actions: Box<dyn ActionQueue>,
    stats: SchedulerStats,
}

impl Scheduler {
    pub fn new(speech: Speech, navigator: Box<dyn Navigator>, actions: Box<dyn ActionQueue>) -> Self {
        debug!("Scheduler::new: called");
        Self {
            speech,
            navigator,
            actions,
            stats: SchedulerStats::default(),
        }
    }

    pub fn speech(&self) -> &Speech {
        &self.speech
    }

    pub fn speech_mut(&mut self) -> &mut Speech {
        &mut self.speech
    }

    pub fn actions_mut(&mut self) -> &mut dyn ActionQueue {
        self.actions.as_mut()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Snapshot for status queries
    pub fn status(&self) -> SpeechStatus {
        let speech = &self.speech;
        SpeechStatus {
            mode: speech.mode(),
            engine: speech.engines.kind(),
            engine_ready: speech.engines.active().is_ready(),
            playing: speech.slot.current_id(),
            queued: speech.queue.len(),
            actions_pending: self.actions.has_pending(),
            free_slots: speech.prefetch.free_slots(),
            deferred: speech.prefetch.deferred(),
            sounds_played: speech.timing.stats().sounds_played,
        }
    }

    /// One scheduling decision, in strict priority order
    ///
    /// Running a keyboard action re-runs the decision immediately so its
    /// effects are picked up without waiting for the next tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;
        let mut actions_run = 0;
        loop {
            let speech = &mut self.speech;

            if !speech.engines.active().is_ready() {
                return TickOutcome::Waiting;
            }

            if speech.slot.is_empty() {
                if let Some(utterance) = speech.queue.dequeue() {
                    return self.start(utterance);
                }

                if !speech.mode().blocks_actions() && self.actions.has_pending() {
                    if actions_run == MAX_ACTIONS_PER_TICK {
                        debug!(actions_run, "Scheduler::tick: action bound reached");
                        return TickOutcome::RanAction;
                    }
                    self.actions.play_next(speech);
                    actions_run += 1;
                    self.stats.actions_run += 1;
                    continue;
                }

                if let Some(direction) = speech.advance_direction() {
                    debug!(%direction, mode = %speech.mode(), "Scheduler::tick: advancing cursor");
                    self.navigator.advance(direction, speech);
                    self.stats.advances += 1;
                    return TickOutcome::Advanced(direction);
                }

                return TickOutcome::Idle;
            }

            let Some(id) = speech.slot.current_id() else {
                return TickOutcome::Idle;
            };
            if speech.slot_active(id) {
                return TickOutcome::StillPlaying(id);
            }
            debug!(%id, "Scheduler::tick: slot no longer playing, clearing");
            speech.slot.take();
            speech.events.now_playing(None, None);
            return TickOutcome::Cleared(id);
        }
    }

    fn start(&mut self, mut utterance: Utterance) -> TickOutcome {
        let id = utterance.id;
        let speech = &mut self.speech;
        debug!(%id, text = %utterance.raw_text, remaining = speech.queue.len(), "Scheduler::start: called");
        speech.events.now_playing(Some(id), Some(&utterance.raw_text));
        speech.load(&utterance, true);
        utterance.mark_loading();
        if let Err(rejected) = speech.slot.fill(utterance) {
            debug!(id = %rejected.id, "Scheduler::start: slot unexpectedly occupied");
        }
        speech.prefetch_queued();
        TickOutcome::Started(id)
    }

    /// Apply one engine notice; returns the outcome of a tick it triggered
    ///
    /// Playback notices are checked against the engine's current playback
    /// and the slot before anything is updated, so a late notice for an
    /// interrupted playback changes nothing.
    pub fn handle_event(&mut self, event: EngineEvent) -> Option<TickOutcome> {
        let speech = &mut self.speech;
        if event.engine != speech.engines.kind() {
            debug!(from = %event.engine, active = %speech.engines.kind(), notice = event.notice.name(), "Scheduler::handle_event: dropping notice from inactive engine");
            return None;
        }
        debug!(notice = event.notice.name(), id = ?event.notice.sound_id(), "Scheduler::handle_event: called");
        if let (Some(id), Some(playback)) = (event.notice.sound_id(), event.notice.playback())
            && speech.engines.active().playback(id) != Some(playback)
        {
            debug!(%id, playback, notice = event.notice.name(), "Scheduler::handle_event: notice from an earlier playback ignored");
            if matches!(event.notice, EngineNotice::PlayFinish { .. }) {
                self.stats.stale_finishes += 1;
            }
            return None;
        }

        match event.notice {
            EngineNotice::Ready => {
                speech.engines.active_mut().observe(&event.notice);
                info!(engine = %event.engine, "Playback engine ready");
                speech.warm_keys();
                None
            }
            EngineNotice::InitFailed { ref reason } => {
                speech.engines.active_mut().observe(&event.notice);
                speech.fall_back(reason);
                None
            }
            EngineNotice::LoadComplete { id, ok, duration_ms } => {
                speech.engines.active_mut().observe(&event.notice);
                if !speech.prefetch.on_load_complete(speech.engines.active_mut(), id, ok) {
                    return None;
                }
                if ok {
                    speech.timing.record_loaded(id, event.at, duration_ms);
                    speech.slot.mark_loaded(id);
                }
                None
            }
            EngineNotice::PlayStart { id, .. } => {
                speech.engines.active_mut().observe(&event.notice);
                speech.timing.record_play_start(id, event.at);
                speech.slot.mark_started(id, event.at);
                None
            }
            EngineNotice::PlayProgress { id, .. } => {
                speech.engines.active_mut().observe(&event.notice);
                speech.timing.record_play_start(id, event.at);
                None
            }
            EngineNotice::PlayFinish { id, duration_ms, .. } => {
                let current = speech.slot.current().is_some_and(|e| e.started && e.utterance.id == id);
                if !current {
                    debug!(%id, playing = ?speech.slot.current_id(), "Scheduler::handle_event: stale finish ignored");
                    self.stats.stale_finishes += 1;
                    return None;
                }
                speech.engines.active_mut().observe(&event.notice);
                speech.timing.record_finish(id, event.at, duration_ms);
                self.finish(id, event.at, duration_ms)
            }
        }
    }

    fn finish(&mut self, id: SoundId, at: chrono::DateTime<chrono::Utc>, duration_ms: Option<u64>) -> Option<TickOutcome> {
        let speech = &mut self.speech;
        let Some(mut entry) = speech.slot.take() else {
            return None;
        };
        entry.utterance.mark_finished(at, duration_ms);
        debug!(%id, duration_ms = ?entry.utterance.measured_duration_ms, "Scheduler::finish: called");
        speech.events.sound_finished(id, 1.0);

        let mode = speech.mode();
        if mode == BrowseMode::Looping {
            debug!(%id, "Scheduler::finish: looping, re-queueing");
            speech.queue.enqueue(Utterance::new(entry.utterance.raw_text));
        }
        speech.events.now_playing(None, None);

        if mode == BrowseMode::ContinuousRead || !speech.queue.is_empty() {
            return Some(self.tick());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::DeviceCall;
    use crate::engine::EngineKind;
    use crate::events::SpeechEvent;
    use crate::scheduler::collaborators::KeyAction;
    use crate::scheduler::config::SchedulerConfig;
    use crate::domain::UtteranceStatus;
    use crate::scheduler::testing::Harness;
    use crate::text::identify;
    use crate::timing::TimingKey;

    /// NowPlaying never announces a second utterance without clearing first
    fn assert_single_flight(ids: &[Option<SoundId>]) {
        let mut playing = false;
        for id in ids {
            match id {
                Some(_) => {
                    assert!(!playing, "NowPlaying(Some) while occupied: {:?}", ids);
                    playing = true;
                }
                None => playing = false,
            }
        }
    }

    #[test]
    fn test_waits_for_engine() {
        let mut h = Harness::new(SchedulerConfig::default(), &["Hello"], BrowseMode::ContinuousRead);
        h.scheduler.speech_mut().add_sound("queued");
        assert_eq!(h.scheduler.tick(), TickOutcome::Waiting);
        assert!(h.streaming.loads().is_empty());
    }

    #[test]
    fn test_advance_then_read_in_order() {
        let mut h = Harness::new(SchedulerConfig::default(), &["Hello. world"], BrowseMode::ContinuousRead);
        h.ready();
        let hello = identify("Hello");
        let world = identify("world");

        assert_eq!(h.scheduler.tick(), TickOutcome::Advanced(Direction::Forward));
        assert_eq!(h.scheduler.tick(), TickOutcome::Started(hello));
        assert_eq!(h.streaming.loads(), vec![hello, world]);

        h.loaded(hello);
        assert_eq!(h.streaming.plays(), vec![hello]);
        h.started(hello);
        assert_eq!(h.scheduler.tick(), TickOutcome::StillPlaying(hello));

        let after = h.finished(hello, Some(500));
        assert_eq!(after, Some(TickOutcome::Started(world)));

        h.loaded(world);
        assert_eq!(h.streaming.plays(), vec![hello, world]);

        let events = h.drain();
        let ids = Harness::now_playing(&events);
        assert_eq!(ids, vec![Some(hello), None, Some(world)]);
        assert_single_flight(&ids);
        assert!(events.contains(&SpeechEvent::SoundFinished {
            id: hello,
            fraction: 1.0
        }));
        assert_eq!(h.scheduler.speech().timing().stats().sounds_played, 1);
    }

    #[test]
    fn test_action_reruns_tick_immediately() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        h.scheduler.actions_mut().push(KeyAction::Speak("hi there".to_string()));

        assert_eq!(h.scheduler.tick(), TickOutcome::Started(identify("hi there")));
        assert_eq!(h.scheduler.stats().ticks, 1);
        assert_eq!(h.scheduler.stats().actions_run, 1);
        assert!(!h.scheduler.actions_mut().has_pending());
    }

    #[test]
    fn test_actions_wait_while_looping() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::Looping);
        h.ready();
        h.scheduler.actions_mut().push(KeyAction::Speak("later".to_string()));
        assert_eq!(h.scheduler.tick(), TickOutcome::Idle);
        assert!(h.scheduler.actions_mut().has_pending());
    }

    #[test]
    fn test_init_failure_falls_back_to_embedded() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.notify(EngineNotice::InitFailed {
            reason: "plugin missing".to_string(),
        });
        assert_eq!(h.scheduler.speech().engine().kind(), EngineKind::Embedded);
        assert_eq!(h.embedded.calls(), vec![DeviceCall::Init]);
        assert!(h.drain().contains(&SpeechEvent::EngineFallback {
            from: EngineKind::Streaming,
            to: EngineKind::Embedded
        }));

        // Late notices from the failed engine change nothing
        h.notify_from(EngineKind::Streaming, EngineNotice::Ready);
        assert_eq!(h.scheduler.tick(), TickOutcome::Waiting);

        h.ready();
        h.scheduler.speech_mut().add_sound("hello");
        assert_eq!(h.scheduler.tick(), TickOutcome::Started(identify("hello")));
        assert_eq!(h.embedded.loads(), vec![identify("hello")]);
        assert!(h.streaming.loads().is_empty());
    }

    #[test]
    fn test_reset_ignores_stale_finish() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        let speech = h.scheduler.speech_mut();
        speech.add_sound("first. second. third");
        let first = identify("first");
        assert_eq!(h.scheduler.tick(), TickOutcome::Started(first));
        h.loaded(first);
        h.started(first);
        let playback = h.playback(first).unwrap();
        h.notify(EngineNotice::PlayProgress {
            id: first,
            playback,
            position_ms: 250,
        });
        h.drain();

        let dropped = h.scheduler.speech_mut().reset_sounds();
        assert_eq!(dropped.len(), 2);
        assert!(h.scheduler.speech().queued().is_empty());
        assert!(!h.scheduler.speech().is_playing_something());
        let events = h.drain();
        assert_eq!(Harness::now_playing(&events), vec![None]);
        assert!(events.contains(&SpeechEvent::SoundFinished {
            id: first,
            fraction: 0.5
        }));

        let after = h.notify(EngineNotice::PlayFinish {
            id: first,
            playback,
            duration_ms: Some(500),
        });
        assert_eq!(after, None);
        assert_eq!(h.scheduler.stats().stale_finishes, 1);
        assert!(h.drain().is_empty());
        assert_eq!(h.scheduler.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_finish_before_start_is_stale() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        h.scheduler.speech_mut().add_sound("again");
        let id = identify("again");
        h.scheduler.tick();

        assert_eq!(
            h.notify(EngineNotice::PlayFinish {
                id,
                playback: 1,
                duration_ms: None
            }),
            None
        );
        assert!(h.scheduler.speech().is_playing_something());
    }

    #[test]
    fn test_failed_load_clears_slot() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        h.scheduler.speech_mut().add_sound("broken");
        let id = identify("broken");
        h.scheduler.tick();
        h.notify(EngineNotice::LoadComplete {
            id,
            ok: false,
            duration_ms: None,
        });
        assert_eq!(h.scheduler.tick(), TickOutcome::Cleared(id));
        assert_eq!(h.scheduler.speech().prefetch().free_slots(), 5);
        assert_eq!(Harness::now_playing(&h.drain()), vec![Some(id), None]);
    }

    #[test]
    fn test_deferred_autoplay_keeps_slot() {
        let config = SchedulerConfig {
            prefetch_slots: 1,
            ..Default::default()
        };
        let mut h = Harness::new(config, &[], BrowseMode::KeyboardDriven);
        h.ready();
        h.scheduler.speech_mut().add_sound("blocker");
        let blocker = identify("blocker");
        h.scheduler.tick();
        h.scheduler.speech_mut().reset_sounds();

        h.scheduler.speech_mut().add_sound("next in line");
        let waiting = identify("next in line");
        assert_eq!(h.scheduler.tick(), TickOutcome::Started(waiting));
        assert!(h.scheduler.speech().prefetch().is_deferred(waiting));
        assert_eq!(h.scheduler.tick(), TickOutcome::StillPlaying(waiting));

        h.loaded(blocker);
        assert_eq!(h.streaming.loads(), vec![blocker, waiting]);
        h.loaded(waiting);
        assert_eq!(h.streaming.plays(), vec![waiting]);
        assert_eq!(h.scheduler.tick(), TickOutcome::StillPlaying(waiting));
    }

    #[test]
    fn test_looping_requeues_same_text() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::Looping);
        h.ready();
        h.scheduler.speech_mut().add_sound("again and again");
        let id = identify("again and again");
        h.scheduler.tick();
        h.loaded(id);
        h.started(id);

        let after = h.finished(id, Some(500));
        assert_eq!(after, Some(TickOutcome::Started(id)));
        assert_eq!(h.streaming.plays(), vec![id, id]);
        assert_eq!(h.streaming.loads().len(), 1);
    }

    #[test]
    fn test_silence_all_switches_to_keyboard() {
        let mut h = Harness::new(SchedulerConfig::default(), &["one", "two"], BrowseMode::ContinuousRead);
        h.ready();
        h.scheduler.tick();
        h.scheduler.tick();
        h.scheduler.speech_mut().silence_all();

        assert_eq!(h.scheduler.speech().mode(), BrowseMode::KeyboardDriven);
        assert!(!h.scheduler.speech().is_playing_something());
        assert_eq!(h.scheduler.tick(), TickOutcome::Idle);
        assert!(h.streaming.calls().contains(&DeviceCall::StopAll));
    }

    #[test]
    fn test_end_of_document_stops_reading() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::ContinuousRead);
        h.ready();
        assert_eq!(h.scheduler.tick(), TickOutcome::Advanced(Direction::Forward));
        assert_eq!(h.scheduler.speech().mode(), BrowseMode::KeyboardDriven);
        assert_eq!(h.scheduler.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_key_prefetch_waits_for_ready_and_runs_once() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.scheduler.speech_mut().prefetch_keys();
        assert!(h.streaming.loads().is_empty());

        h.ready();
        assert_eq!(h.streaming.loads().len(), 5);
        assert_eq!(h.scheduler.speech().prefetch().deferred(), 70 - 5);

        h.scheduler.speech_mut().prefetch_keys();
        assert_eq!(h.scheduler.speech().prefetch().deferred(), 70 - 5);
    }

    #[test]
    fn test_stale_finish_does_not_end_replay() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        let yes = identify("yes");
        h.scheduler.speech_mut().add_sound("yes");
        assert_eq!(h.scheduler.tick(), TickOutcome::Started(yes));
        h.loaded(yes);
        h.started(yes);
        let interrupted = h.playback(yes).unwrap();

        h.scheduler.speech_mut().reset_sounds();
        h.scheduler.speech_mut().add_sound("yes");
        assert_eq!(h.scheduler.tick(), TickOutcome::Started(yes));
        assert_eq!(h.streaming.plays(), vec![yes, yes]);
        assert_ne!(h.playback(yes), Some(interrupted));

        let late = EngineNotice::PlayFinish {
            id: yes,
            playback: interrupted,
            duration_ms: Some(500),
        };
        assert_eq!(h.notify(late.clone()), None);
        assert_eq!(h.scheduler.stats().stale_finishes, 1);
        assert_eq!(h.scheduler.tick(), TickOutcome::StillPlaying(yes));

        h.started(yes);
        assert_eq!(h.notify(late), None);
        assert_eq!(h.scheduler.stats().stale_finishes, 2);
        assert_eq!(h.scheduler.tick(), TickOutcome::StillPlaying(yes));

        h.scheduler.speech_mut().add_sound("no");
        assert_eq!(h.scheduler.tick(), TickOutcome::StillPlaying(yes));
        assert_eq!(h.finished(yes, Some(500)), Some(TickOutcome::Started(identify("no"))));
        assert_single_flight(&Harness::now_playing(&h.drain()));
    }

    #[test]
    fn test_duplicate_finish_leaves_record_final() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        let alpha = identify("alpha");
        h.scheduler.speech_mut().add_sound("alpha");
        h.scheduler.tick();
        h.loaded(alpha);
        h.started(alpha);
        let playback = h.playback(alpha).unwrap();
        h.finished(alpha, Some(500));

        let key = TimingKey::Primary(alpha);
        let finished = h.scheduler.speech().timing().get(&key).cloned().unwrap();
        assert_eq!(finished.length_ms, Some(500));
        assert!(finished.finished_at.is_some());

        let after = h.notify(EngineNotice::PlayFinish {
            id: alpha,
            playback,
            duration_ms: Some(9999),
        });
        assert_eq!(after, None);
        assert_eq!(h.scheduler.stats().stale_finishes, 1);
        assert_eq!(h.scheduler.speech().timing().get(&key), Some(&finished));
    }

    #[test]
    fn test_load_complete_not_in_flight_leaves_timing() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        let id = identify("once");
        h.scheduler.speech_mut().add_sound("once");
        h.scheduler.tick();
        h.loaded(id);

        let key = TimingKey::Primary(id);
        let loaded = h.scheduler.speech().timing().get(&key).cloned().unwrap();
        h.notify(EngineNotice::LoadComplete {
            id,
            ok: true,
            duration_ms: Some(777),
        });
        assert_eq!(h.scheduler.speech().timing().get(&key), Some(&loaded));
        assert_eq!(h.scheduler.speech().prefetch().free_slots(), 5);
    }

    #[test]
    fn test_slot_utterance_status_follows_load_and_play() {
        let mut h = Harness::new(SchedulerConfig::default(), &[], BrowseMode::KeyboardDriven);
        h.ready();
        let id = identify("status");
        h.scheduler.speech_mut().add_sound("status");
        h.scheduler.tick();
        let status = |h: &Harness| h.scheduler.speech().now_playing().map(|u| u.status);
        assert_eq!(status(&h), Some(UtteranceStatus::Loading));

        h.loaded(id);
        assert_eq!(status(&h), Some(UtteranceStatus::Ready));
        h.started(id);
        assert_eq!(status(&h), Some(UtteranceStatus::Playing));
    }
}
