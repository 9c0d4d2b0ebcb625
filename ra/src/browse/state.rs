//! Holder for the active browse mode

use tracing::{debug, info};

use super::mode::{BrowseMode, Direction};

/// The active browse mode and its transition count
#[derive(Debug, Default)]
pub struct BrowseState {
    mode: BrowseMode,
    transitions: u64,
}

impl BrowseState {
    pub fn new(mode: BrowseMode) -> Self {
        Self { mode, transitions: 0 }
    }

    pub fn mode(&self) -> BrowseMode {
        self.mode
    }

    /// Switch modes, returning the previous one when it changed
    pub fn set(&mut self, mode: BrowseMode) -> Option<BrowseMode> {
        if mode == self.mode {
            debug!(%mode, "BrowseState::set: unchanged");
            return None;
        }
        let previous = std::mem::replace(&mut self.mode, mode);
        self.transitions += 1;
        info!(from = %previous, to = %mode, "Browse mode changed");
        Some(previous)
    }

    /// Direction the idle scheduler should move the cursor, if any
    pub fn advance_direction(&self) -> Option<Direction> {
        self.mode.direction()
    }

    pub fn is_going_backwards(&self) -> bool {
        self.mode.is_backward()
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}
