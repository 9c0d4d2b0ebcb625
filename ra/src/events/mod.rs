//! Speech events for observers outside the scheduler
//!
//! The scheduler emits on a [`SpeechBus`] (tokio broadcast); status
//! displays, the CLI and tests subscribe.

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, SpeechBus, SpeechEmitter};
pub use types::SpeechEvent;
