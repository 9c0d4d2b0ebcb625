//! Latency instrumentation
//!
//! Tracks, per utterance id:
//! - when a load or replay was requested
//! - when audio first became available or audible
//! - play start, finish and measured length
//!
//! Records are only read by aggregate reporting.

mod recorder;

pub use recorder::{SessionStats, TimingKey, TimingRecord, TimingRecorder, TimingReport};
