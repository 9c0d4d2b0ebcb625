//! Speech scheduling
//!
//! - [`Speech`] - the scheduler context: queue, slot, budget, mode, timing
//! - [`Scheduler`] - the priority tick and engine notice handling
//! - [`SpeechRunner`] / [`SpeechHandle`] - the actor that drives it

mod collaborators;
mod config;
mod core;
mod handle;
mod messages;
mod runner;
mod speech;
#[cfg(test)]
mod testing;

pub use collaborators::{ActionQueue, KeyAction, Navigator, ParagraphCursor, PendingActions};
pub use config::SchedulerConfig;
pub use core::{Scheduler, SchedulerStats, TickOutcome};
pub use handle::SpeechHandle;
pub use messages::{SpeechError, SpeechRequest, SpeechResponse, SpeechStatus};
pub use runner::SpeechRunner;
pub use speech::{ECHO_KEYS, Speech, echo_keycodes, key_name};
