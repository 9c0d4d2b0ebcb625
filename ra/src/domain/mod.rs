//! Domain types shared across the speech core
//!
//! - [`SoundId`] - content hash of an utterance's normalized text
//! - [`Utterance`] - one segmented unit of text awaiting or undergoing playback

mod id;
mod utterance;

pub use id::SoundId;
pub use utterance::{Utterance, UtteranceStatus};
