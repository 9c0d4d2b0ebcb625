//! Streaming engine: a registry of sound handles
//!
//! Every loaded sound keeps its handle, so speaking the same text again
//! replays the decoded audio instead of fetching it twice.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::{AudioDevice, EngineError, EngineKind, EngineNotice, LoadRequest, NoticeSender, PlayPosition, PlaybackEngine};
use crate::domain::SoundId;

/// Load state of a registered sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadyState {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
struct SoundHandle {
    ready: ReadyState,
    playing: bool,
    autoplay: bool,
    /// Number of the current playback; cleared when stopped
    playback: Option<u64>,
    duration_ms: Option<u64>,
    position_ms: u64,
}

impl SoundHandle {
    fn loading(autoplay: bool) -> Self {
        Self {
            ready: ReadyState::Loading,
            playing: false,
            autoplay,
            playback: None,
            duration_ms: None,
            position_ms: 0,
        }
    }
}

/// Plugin-style player keyed by sound id
pub struct StreamingEngine {
    device: Box<dyn AudioDevice>,
    ready: bool,
    sounds: HashMap<SoundId, SoundHandle>,
    next_playback: u64,
}

impl StreamingEngine {
    pub fn new(device: Box<dyn AudioDevice>) -> Self {
        debug!("StreamingEngine::new: called");
        Self {
            device,
            ready: false,
            sounds: HashMap::new(),
            next_playback: 0,
        }
    }

    /// Number of registered sound handles
    pub fn registered(&self) -> usize {
        self.sounds.len()
    }

    fn start_playback(&mut self, id: SoundId) {
        self.next_playback += 1;
        let playback = self.next_playback;
        if let Some(handle) = self.sounds.get_mut(&id) {
            handle.playing = true;
            handle.autoplay = false;
            handle.playback = Some(playback);
            handle.position_ms = 0;
        }
        self.device.play(id, playback);
    }

    /// The handle of `id` if `playback` is its current playback
    fn current_mut(&mut self, id: SoundId, playback: u64) -> Option<&mut SoundHandle> {
        let handle = self.sounds.get_mut(&id)?;
        if handle.playback != Some(playback) {
            debug!(%id, playback, current = ?handle.playback, "StreamingEngine: notice from an earlier playback");
            return None;
        }
        Some(handle)
    }
}

impl PlaybackEngine for StreamingEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Streaming
    }

    fn start(&mut self, notices: NoticeSender) {
        info!("Starting streaming engine");
        self.device.init(notices);
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn begin_load(&mut self, request: &LoadRequest) {
        debug!(id = %request.id, seq = request.seq, autoplay = request.autoplay, "StreamingEngine::begin_load: called");
        self.sounds.insert(request.id, SoundHandle::loading(request.autoplay));
        self.device.load(request.id, &request.url, request.volume);
    }

    fn play(&mut self, id: SoundId) -> Result<(), EngineError> {
        if !self.ready {
            return Err(EngineError::NotReady(self.kind()));
        }
        let state = self.sounds.get(&id).map(|h| h.ready).ok_or(EngineError::UnknownSound(id))?;
        match state {
            ReadyState::Loaded => {
                debug!(%id, "StreamingEngine::play: replaying loaded sound");
                self.start_playback(id);
                Ok(())
            }
            ReadyState::Loading => Err(EngineError::StillLoading(id)),
            ReadyState::Failed => Err(EngineError::LoadFailed(id)),
        }
    }

    fn set_autoplay(&mut self, id: SoundId) -> Result<(), EngineError> {
        let handle = self.sounds.get_mut(&id).ok_or(EngineError::UnknownSound(id))?;
        match handle.ready {
            ReadyState::Loading => {
                debug!(%id, "StreamingEngine::set_autoplay: upgrading in-flight load");
                handle.autoplay = true;
                Ok(())
            }
            ReadyState::Loaded | ReadyState::Failed => self.play(id),
        }
    }

    fn is_playing(&self, id: SoundId) -> bool {
        match self.sounds.get(&id) {
            None => {
                debug!(%id, "StreamingEngine::is_playing: no handle");
                false
            }
            Some(handle) => match handle.ready {
                ReadyState::Loading => handle.autoplay,
                ReadyState::Failed => false,
                ReadyState::Loaded => handle.playing,
            },
        }
    }

    fn stop_all(&mut self) {
        debug!(registered = self.sounds.len(), "StreamingEngine::stop_all: called");
        self.device.stop_all();
        for handle in self.sounds.values_mut() {
            handle.playing = false;
            handle.autoplay = false;
            handle.playback = None;
        }
    }

    fn playback(&self, id: SoundId) -> Option<u64> {
        self.sounds.get(&id).and_then(|h| h.playback)
    }

    fn observe(&mut self, notice: &EngineNotice) {
        match notice {
            EngineNotice::Ready => {
                info!("Streaming engine ready");
                self.ready = true;
            }
            EngineNotice::InitFailed { reason } => {
                warn!(%reason, "Streaming engine failed to initialize");
                self.ready = false;
            }
            EngineNotice::LoadComplete { id, ok, duration_ms } => {
                let Some(handle) = self.sounds.get_mut(id) else {
                    debug!(%id, "StreamingEngine::observe: load complete for unknown sound");
                    return;
                };
                handle.duration_ms = *duration_ms;
                if !*ok {
                    warn!(%id, "Sound failed to load");
                    handle.ready = ReadyState::Failed;
                    handle.autoplay = false;
                    return;
                }
                handle.ready = ReadyState::Loaded;
                if handle.autoplay {
                    debug!(%id, "StreamingEngine::observe: autoplaying loaded sound");
                    self.start_playback(*id);
                }
            }
            EngineNotice::PlayStart { id, playback } => {
                if let Some(handle) = self.current_mut(*id, *playback) {
                    handle.playing = true;
                }
            }
            EngineNotice::PlayProgress {
                id,
                playback,
                position_ms,
            } => {
                if let Some(handle) = self.current_mut(*id, *playback) {
                    handle.position_ms = *position_ms;
                }
            }
            EngineNotice::PlayFinish {
                id,
                playback,
                duration_ms,
            } => {
                if let Some(handle) = self.current_mut(*id, *playback) {
                    handle.playing = false;
                    handle.playback = None;
                    if duration_ms.is_some() {
                        handle.duration_ms = *duration_ms;
                    }
                    handle.position_ms = handle.duration_ms.unwrap_or(handle.position_ms);
                }
            }
        }
    }

    fn position(&self, id: SoundId) -> Option<PlayPosition> {
        let handle = self.sounds.get(&id)?;
        Some(PlayPosition {
            position_ms: handle.position_ms,
            duration_ms: handle.duration_ms.unwrap_or(0),
        })
    }
}
