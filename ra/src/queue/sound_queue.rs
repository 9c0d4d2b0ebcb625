//! FIFO queue of utterances waiting to play

use std::collections::VecDeque;

use tracing::debug;

use crate::domain::{SoundId, Utterance};

/// Ordered store of pending utterances
///
/// Inserts at the head and removes at the tail, so dequeue order is enqueue
/// order. `reset` swaps in a fresh queue and hands back the old contents by
/// value; snapshots already taken are unaffected.
#[derive(Debug, Default)]
pub struct SoundQueue {
    entries: VecDeque<Utterance>,
}

impl SoundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the head
    pub fn enqueue(&mut self, utterance: Utterance) {
        debug!(id = %utterance.id, depth = self.entries.len() + 1, "SoundQueue::enqueue: called");
        self.entries.push_front(utterance);
    }

    /// Remove from the tail, the oldest entry
    pub fn dequeue(&mut self) -> Option<Utterance> {
        let next = self.entries.pop_back();
        debug!(id = ?next.as_ref().map(|u| u.id), remaining = self.entries.len(), "SoundQueue::dequeue: called");
        next
    }

    /// Snapshot of pending utterances in playback order, next to play first
    pub fn peek_all(&self) -> Vec<Utterance> {
        self.entries.iter().rev().cloned().collect()
    }

    /// Ids in playback order
    pub fn ids(&self) -> Vec<SoundId> {
        self.entries.iter().rev().map(|u| u.id).collect()
    }

    /// Replace the queue with an empty one, returning what was pending
    pub fn reset(&mut self) -> Vec<Utterance> {
        debug!(dropped = self.entries.len(), "SoundQueue::reset: called");
        let old = std::mem::take(&mut self.entries);
        old.into_iter().rev().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
