//! Pending-utterance storage and the single playback slot
//!
//! The [`SoundQueue`] is strict FIFO. The [`PlaybackSlot`] holds at most one
//! audible utterance; moving utterances into and out of it is the only way
//! audible concurrency is bounded.

mod slot;
mod sound_queue;

pub use slot::{PlaybackSlot, SlotEntry};
pub use sound_queue::SoundQueue;
