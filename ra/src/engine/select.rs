//! Active engine selection and permanent fallback

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{EngineEvent, EngineKind, NoticeSender, PlaybackEngine};

/// The active engine plus the standby it falls back to
pub struct EngineSet {
    active: Box<dyn PlaybackEngine>,
    standby: Option<Box<dyn PlaybackEngine>>,
    notices: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl EngineSet {
    /// `active` is the engine selected at startup; `standby` takes over if it
    /// fails to initialize
    pub fn new(active: Box<dyn PlaybackEngine>, standby: Option<Box<dyn PlaybackEngine>>) -> Self {
        debug!(active = %active.kind(), standby = ?standby.as_ref().map(|s| s.kind()), "EngineSet::new: called");
        Self {
            active,
            standby,
            notices: None,
        }
    }

    /// Start the active engine, reporting into `tx`
    pub fn start(&mut self, tx: mpsc::UnboundedSender<EngineEvent>) {
        let kind = self.active.kind();
        info!(engine = %kind, "Starting playback engine");
        self.active.start(NoticeSender::new(kind, tx.clone()));
        self.notices = Some(tx);
    }

    pub fn kind(&self) -> EngineKind {
        self.active.kind()
    }

    pub fn active(&self) -> &dyn PlaybackEngine {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> &mut dyn PlaybackEngine {
        self.active.as_mut()
    }

    /// Whether a fallback engine is still available
    pub fn has_standby(&self) -> bool {
        self.standby.is_some()
    }

    /// Swap in the standby engine for good and start it
    ///
    /// Returns the kinds switched from and to, or `None` when no standby is
    /// left. The failed engine is dropped; its later notices no longer match
    /// the active kind.
    pub fn fall_back(&mut self) -> Option<(EngineKind, EngineKind)> {
        let Some(standby) = self.standby.take() else {
            warn!(engine = %self.active.kind(), "No fallback engine left");
            return None;
        };
        let failed = std::mem::replace(&mut self.active, standby);
        let from = failed.kind();
        let to = self.active.kind();
        warn!(%from, %to, "Playback engine failed, falling back");
        if let Some(tx) = &self.notices {
            self.active.start(NoticeSender::new(to, tx.clone()));
        }
        Some((from, to))
    }
}
