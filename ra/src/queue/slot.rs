//! The single playback slot

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{SoundId, Utterance};

/// The utterance currently occupying the slot
#[derive(Debug, Clone)]
pub struct SlotEntry {
    pub utterance: Utterance,
    /// Set once the engine reports the utterance audible. Finish notices that
    /// arrive before this are stale.
    pub started: bool,
}

/// Single-occupancy holder for the audible utterance
#[derive(Debug, Default)]
pub struct PlaybackSlot {
    entry: Option<SlotEntry>,
}

impl PlaybackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupy the empty slot. An occupied slot hands the utterance back.
    pub fn fill(&mut self, utterance: Utterance) -> Result<(), Utterance> {
        if let Some(current) = &self.entry {
            warn!(current = %current.utterance.id, rejected = %utterance.id, "PlaybackSlot::fill: slot occupied");
            return Err(utterance);
        }
        debug!(id = %utterance.id, "PlaybackSlot::fill: called");
        self.entry = Some(SlotEntry {
            utterance,
            started: false,
        });
        Ok(())
    }

    /// Empty the slot
    pub fn take(&mut self) -> Option<SlotEntry> {
        let entry = self.entry.take();
        debug!(id = ?entry.as_ref().map(|e| e.utterance.id), "PlaybackSlot::take: called");
        entry
    }

    pub fn current(&self) -> Option<&SlotEntry> {
        self.entry.as_ref()
    }

    pub fn current_id(&self) -> Option<SoundId> {
        self.entry.as_ref().map(|e| e.utterance.id)
    }

    pub fn holds(&self, id: SoundId) -> bool {
        self.current_id() == Some(id)
    }

    /// Record that the slot's utterance has its audio
    pub fn mark_loaded(&mut self, id: SoundId) -> bool {
        match &mut self.entry {
            Some(entry) if entry.utterance.id == id => {
                entry.utterance.mark_ready();
                true
            }
            _ => false,
        }
    }

    /// Record that the slot's utterance became audible
    pub fn mark_started(&mut self, id: SoundId, at: DateTime<Utc>) -> bool {
        match &mut self.entry {
            Some(entry) if entry.utterance.id == id => {
                entry.started = true;
                entry.utterance.mark_playing(at);
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_take() {
        let mut slot = PlaybackSlot::new();
        assert!(slot.is_empty());

        let u = Utterance::new("hello");
        let id = u.id;
        slot.fill(u).unwrap();
        assert!(slot.holds(id));

        let entry = slot.take().unwrap();
        assert_eq!(entry.utterance.id, id);
        assert!(!entry.started);
        assert!(slot.is_empty());
    }

    #[test]
    fn test_fill_rejects_second_occupant() {
        let mut slot = PlaybackSlot::new();
        slot.fill(Utterance::new("one")).unwrap();
        let rejected = slot.fill(Utterance::new("two")).unwrap_err();
        assert_eq!(rejected.raw_text, "two");
        assert_eq!(slot.current().unwrap().utterance.raw_text, "one");
    }

    #[test]
    fn test_mark_started_only_for_current() {
        let mut slot = PlaybackSlot::new();
        let u = Utterance::new("one");
        let id = u.id;
        slot.fill(u).unwrap();

        assert!(!slot.mark_started(crate::text::identify("other"), Utc::now()));
        assert!(!slot.current().unwrap().started);
        assert!(slot.mark_started(id, Utc::now()));
        assert!(slot.current().unwrap().started);
    }
}
