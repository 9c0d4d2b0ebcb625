//! Timer-driven audio device
//!
//! Stands in for a real audio backend: initialization, loads and playback
//! take configurable wall-clock time and report through the usual notices.
//! Must be used from inside a tokio runtime.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{AudioDevice, EmbeddedEngine, EngineKind, EngineNotice, EngineSet, NoticeSender, StreamingEngine};
use crate::domain::SoundId;

/// Timing of the simulated backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SimulatorConfig {
    /// Delay before the device reports ready
    pub init_delay_ms: u64,
    /// Time to fetch and decode one sound
    pub load_latency_ms: u64,
    /// Playback length per URL character
    pub ms_per_char: u64,
    /// Interval between progress notices
    pub progress_interval_ms: u64,
    /// Make the streaming device fail to initialize
    pub fail_streaming_init: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            init_delay_ms: 20,
            load_latency_ms: 30,
            ms_per_char: 2,
            progress_interval_ms: 25,
            fail_streaming_init: false,
        }
    }
}

/// An [`AudioDevice`] that plays silence on timers
pub struct SimulatedDevice {
    config: SimulatorConfig,
    fail_init: bool,
    notices: Option<NoticeSender>,
    durations: HashMap<SoundId, u64>,
    loads: Vec<JoinHandle<()>>,
    playback: Vec<JoinHandle<()>>,
}

impl SimulatedDevice {
    pub fn new(config: SimulatorConfig, fail_init: bool) -> Self {
        debug!(?config, fail_init, "SimulatedDevice::new: called");
        Self {
            config,
            fail_init,
            notices: None,
            durations: HashMap::new(),
            loads: Vec::new(),
            playback: Vec::new(),
        }
    }

    fn reap(&mut self) {
        self.loads.retain(|h| !h.is_finished());
        self.playback.retain(|h| !h.is_finished());
    }
}

impl AudioDevice for SimulatedDevice {
    fn init(&mut self, notices: NoticeSender) {
        debug!(engine = %notices.engine(), "SimulatedDevice::init: called");
        let delay = Duration::from_millis(self.config.init_delay_ms);
        let fail = self.fail_init;
        let tx = notices.clone();
        self.notices = Some(notices);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if fail {
                tx.send(EngineNotice::InitFailed {
                    reason: "simulated initialization failure".to_string(),
                });
            } else {
                tx.send(EngineNotice::Ready);
            }
        });
    }

    fn load(&mut self, id: SoundId, url: &str, volume: u8) {
        let Some(tx) = self.notices.clone() else {
            debug!(%id, "SimulatedDevice::load: not initialized");
            return;
        };
        self.reap();
        let duration_ms = self.config.ms_per_char * url.chars().count() as u64;
        self.durations.insert(id, duration_ms);
        debug!(%id, volume, duration_ms, "SimulatedDevice::load: called");
        let latency = Duration::from_millis(self.config.load_latency_ms);
        self.loads.push(tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            tx.send(EngineNotice::LoadComplete {
                id,
                ok: true,
                duration_ms: Some(duration_ms),
            });
        }));
    }

    fn play(&mut self, id: SoundId, playback: u64) {
        let Some(tx) = self.notices.clone() else {
            debug!(%id, "SimulatedDevice::play: not initialized");
            return;
        };
        self.reap();
        let duration_ms = self.durations.get(&id).copied().unwrap_or(0);
        let step = self.config.progress_interval_ms.max(1);
        debug!(%id, playback, duration_ms, "SimulatedDevice::play: called");
        self.playback.push(tokio::spawn(async move {
            tx.send(EngineNotice::PlayStart { id, playback });
            let mut position_ms = 0;
            while position_ms < duration_ms {
                let next = (position_ms + step).min(duration_ms);
                tokio::time::sleep(Duration::from_millis(next - position_ms)).await;
                position_ms = next;
                tx.send(EngineNotice::PlayProgress {
                    id,
                    playback,
                    position_ms,
                });
            }
            tx.send(EngineNotice::PlayFinish {
                id,
                playback,
                duration_ms: Some(duration_ms),
            });
        }));
    }

    fn stop_all(&mut self) {
        info!(playing = self.playback.len(), "Stopping all simulated sounds");
        for handle in self.playback.drain(..) {
            handle.abort();
        }
    }
}

/// Engines backed by simulated devices, chosen by the embed signal
///
/// Streaming starts active with embedded on standby; embed mode runs the
/// embedded engine alone.
pub fn simulated_engines(config: &SimulatorConfig, embed: bool) -> EngineSet {
    let embedded = Box::new(EmbeddedEngine::new(Box::new(SimulatedDevice::new(config.clone(), false))));
    match EngineKind::select(embed) {
        EngineKind::Embedded => EngineSet::new(embedded, None),
        EngineKind::Streaming => {
            let device = SimulatedDevice::new(config.clone(), config.fail_streaming_init);
            EngineSet::new(Box::new(StreamingEngine::new(Box::new(device))), Some(embedded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineEvent;
    use tokio::sync::mpsc;

    fn fast() -> SimulatorConfig {
        SimulatorConfig {
            init_delay_ms: 1,
            load_latency_ms: 1,
            ms_per_char: 1,
            progress_interval_ms: 5,
            fail_streaming_init: false,
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> EngineNotice {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("notice in time")
            .expect("channel open")
            .notice
    }

    #[tokio::test]
    async fn test_lifecycle_notices_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut device = SimulatedDevice::new(fast(), false);
        device.init(NoticeSender::new(EngineKind::Streaming, tx));
        assert_eq!(next(&mut rx).await, EngineNotice::Ready);

        let id = SoundId::from_raw(1);
        device.load(id, "0123456789", 100);
        assert_eq!(
            next(&mut rx).await,
            EngineNotice::LoadComplete {
                id,
                ok: true,
                duration_ms: Some(10)
            }
        );

        device.play(id, 1);
        assert_eq!(next(&mut rx).await, EngineNotice::PlayStart { id, playback: 1 });
        assert_eq!(
            next(&mut rx).await,
            EngineNotice::PlayProgress {
                id,
                playback: 1,
                position_ms: 5
            }
        );
        assert_eq!(
            next(&mut rx).await,
            EngineNotice::PlayProgress {
                id,
                playback: 1,
                position_ms: 10
            }
        );
        assert_eq!(
            next(&mut rx).await,
            EngineNotice::PlayFinish {
                id,
                playback: 1,
                duration_ms: Some(10)
            }
        );
    }

    #[tokio::test]
    async fn test_forced_init_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut device = SimulatedDevice::new(fast(), true);
        device.init(NoticeSender::new(EngineKind::Streaming, tx));
        assert!(matches!(next(&mut rx).await, EngineNotice::InitFailed { .. }));
    }

    #[tokio::test]
    async fn test_stop_all_aborts_playback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = fast();
        config.ms_per_char = 100;
        config.progress_interval_ms = 1000;
        let mut device = SimulatedDevice::new(config, false);
        device.init(NoticeSender::new(EngineKind::Embedded, tx));
        assert_eq!(next(&mut rx).await, EngineNotice::Ready);

        let id = SoundId::from_raw(2);
        device.load(id, "long text", 100);
        assert!(matches!(next(&mut rx).await, EngineNotice::LoadComplete { .. }));
        device.play(id, 1);
        assert_eq!(next(&mut rx).await, EngineNotice::PlayStart { id, playback: 1 });
        device.stop_all();

        let late = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(late.is_err());
    }

    #[test]
    fn test_simulated_engines_follow_embed_signal() {
        let engines = simulated_engines(&fast(), false);
        assert_eq!(engines.kind(), EngineKind::Streaming);
        assert!(engines.has_standby());

        let engines = simulated_engines(&fast(), true);
        assert_eq!(engines.kind(), EngineKind::Embedded);
        assert!(!engines.has_standby());
    }
}
