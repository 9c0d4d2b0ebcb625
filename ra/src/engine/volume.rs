//! Shared volume control

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// External 0-100 volume control, read at every new load
#[derive(Debug, Clone)]
pub struct Volume(Arc<AtomicU8>);

impl Volume {
    pub const MAX: u8 = 100;

    pub fn new(level: u8) -> Self {
        Self(Arc::new(AtomicU8::new(level.min(Self::MAX))))
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    /// Set the level, clamped to 100
    pub fn set(&self, level: u8) {
        self.0.store(level.min(Self::MAX), Ordering::Relaxed);
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(Self::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_to_max() {
        let volume = Volume::new(250);
        assert_eq!(volume.get(), 100);
        volume.set(101);
        assert_eq!(volume.get(), 100);
    }

    #[test]
    fn test_clones_share_level() {
        let volume = Volume::default();
        let control = volume.clone();
        control.set(40);
        assert_eq!(volume.get(), 40);
    }
}
