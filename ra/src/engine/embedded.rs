//! Embedded engine: one audible element
//!
//! Only one sound can be bound to the element at a time. Starting a new
//! autoplay load stops whatever the element was playing. Loads that are not
//! meant to play are hidden fetches that only warm the cache.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::{AudioDevice, EngineError, EngineKind, EngineNotice, LoadRequest, NoticeSender, PlayPosition, PlaybackEngine};
use crate::domain::SoundId;

/// What the single element is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementState {
    /// Waiting for the bound sound's load to complete
    Pending,
    Playing,
    Stopped,
}

#[derive(Debug, Clone)]
struct Element {
    id: SoundId,
    state: ElementState,
    /// Number of the playback the element is bound to, once audible
    playback: Option<u64>,
    position_ms: u64,
    duration_ms: Option<u64>,
}

pub struct EmbeddedEngine {
    device: Box<dyn AudioDevice>,
    ready: bool,
    element: Option<Element>,
    fetched: HashSet<SoundId>,
    fetching: HashSet<SoundId>,
    failed: HashSet<SoundId>,
    next_playback: u64,
}

impl EmbeddedEngine {
    pub fn new(device: Box<dyn AudioDevice>) -> Self {
        debug!("EmbeddedEngine::new: called");
        Self {
            device,
            ready: false,
            element: None,
            fetched: HashSet::new(),
            fetching: HashSet::new(),
            failed: HashSet::new(),
            next_playback: 0,
        }
    }

    /// Whether the audio for `id` was fetched before
    pub fn has_fetched(&self, id: SoundId) -> bool {
        self.fetched.contains(&id)
    }

    /// Bind the element to `id`, silencing its previous sound
    fn bind(&mut self, id: SoundId, state: ElementState) {
        if let Some(previous) = self.element.as_ref().filter(|e| e.state != ElementState::Stopped) {
            debug!(previous = %previous.id, next = %id, "EmbeddedEngine::bind: stopping previous sound");
            self.device.stop_all();
        }
        self.element = Some(Element {
            id,
            state,
            playback: None,
            position_ms: 0,
            duration_ms: None,
        });
        if state == ElementState::Playing {
            self.play_element();
        }
    }

    /// Start the bound sound under a fresh playback number
    fn play_element(&mut self) {
        self.next_playback += 1;
        let playback = self.next_playback;
        if let Some(element) = &mut self.element {
            element.state = ElementState::Playing;
            element.playback = Some(playback);
            self.device.play(element.id, playback);
        }
    }

    fn bound_mut(&mut self, id: SoundId) -> Option<&mut Element> {
        self.element.as_mut().filter(|e| e.id == id)
    }

    /// The element if it is bound to `id` under `playback`
    fn playing_mut(&mut self, id: SoundId, playback: u64) -> Option<&mut Element> {
        let element = self.bound_mut(id)?;
        if element.playback != Some(playback) {
            debug!(%id, playback, current = ?element.playback, "EmbeddedEngine: notice from an earlier playback");
            return None;
        }
        Some(element)
    }
}

impl PlaybackEngine for EmbeddedEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Embedded
    }

    fn start(&mut self, notices: NoticeSender) {
        info!("Starting embedded engine");
        self.device.init(notices);
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn begin_load(&mut self, request: &LoadRequest) {
        debug!(id = %request.id, seq = request.seq, autoplay = request.autoplay, "EmbeddedEngine::begin_load: called");
        self.failed.remove(&request.id);
        self.fetching.insert(request.id);
        if request.autoplay {
            self.bind(request.id, ElementState::Pending);
        }
        self.device.load(request.id, &request.url, request.volume);
    }

    fn play(&mut self, id: SoundId) -> Result<(), EngineError> {
        if !self.ready {
            return Err(EngineError::NotReady(self.kind()));
        }
        if self.fetched.contains(&id) {
            debug!(%id, "EmbeddedEngine::play: replaying fetched sound");
            self.bind(id, ElementState::Playing);
            Ok(())
        } else if self.fetching.contains(&id) {
            Err(EngineError::StillLoading(id))
        } else if self.failed.contains(&id) {
            Err(EngineError::LoadFailed(id))
        } else {
            Err(EngineError::UnknownSound(id))
        }
    }

    fn set_autoplay(&mut self, id: SoundId) -> Result<(), EngineError> {
        if self.fetching.contains(&id) {
            debug!(%id, "EmbeddedEngine::set_autoplay: binding in-flight fetch");
            self.bind(id, ElementState::Pending);
            return Ok(());
        }
        self.play(id)
    }

    fn is_playing(&self, id: SoundId) -> bool {
        self.element
            .as_ref()
            .is_some_and(|e| e.id == id && e.state != ElementState::Stopped)
    }

    fn stop_all(&mut self) {
        debug!("EmbeddedEngine::stop_all: called");
        self.device.stop_all();
        if let Some(element) = &mut self.element {
            element.state = ElementState::Stopped;
            element.playback = None;
        }
    }

    fn playback(&self, id: SoundId) -> Option<u64> {
        self.element.as_ref().filter(|e| e.id == id).and_then(|e| e.playback)
    }

    fn observe(&mut self, notice: &EngineNotice) {
        match notice {
            EngineNotice::Ready => {
                info!("Embedded engine ready");
                self.ready = true;
            }
            EngineNotice::InitFailed { reason } => {
                warn!(%reason, "Embedded engine failed to initialize");
                self.ready = false;
            }
            EngineNotice::LoadComplete { id, ok, duration_ms } => {
                if !self.fetching.remove(id) {
                    debug!(%id, "EmbeddedEngine::observe: load complete for unknown sound");
                    return;
                }
                if !*ok {
                    warn!(%id, "Sound failed to load");
                    self.failed.insert(*id);
                    if let Some(element) = self.bound_mut(*id) {
                        element.state = ElementState::Stopped;
                    }
                    return;
                }
                self.fetched.insert(*id);
                let mut autoplay = false;
                if let Some(element) = self.bound_mut(*id) {
                    element.duration_ms = *duration_ms;
                    autoplay = element.state == ElementState::Pending;
                }
                if autoplay {
                    debug!(%id, "EmbeddedEngine::observe: autoplaying bound sound");
                    self.play_element();
                }
            }
            EngineNotice::PlayStart { id, playback } => {
                if let Some(element) = self.playing_mut(*id, *playback) {
                    element.state = ElementState::Playing;
                }
            }
            EngineNotice::PlayProgress {
                id,
                playback,
                position_ms,
            } => {
                if let Some(element) = self.playing_mut(*id, *playback) {
                    element.position_ms = *position_ms;
                }
            }
            EngineNotice::PlayFinish {
                id,
                playback,
                duration_ms,
            } => {
                if let Some(element) = self.playing_mut(*id, *playback) {
                    element.state = ElementState::Stopped;
                    element.playback = None;
                    if duration_ms.is_some() {
                        element.duration_ms = *duration_ms;
                    }
                    element.position_ms = element.duration_ms.unwrap_or(element.position_ms);
                }
            }
        }
    }

    fn position(&self, id: SoundId) -> Option<PlayPosition> {
        let element = self.element.as_ref().filter(|e| e.id == id)?;
        Some(PlayPosition {
            position_ms: element.position_ms,
            duration_ms: element.duration_ms.unwrap_or(0),
        })
    }
}
