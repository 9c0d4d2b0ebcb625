//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between scheduler ticks
    #[serde(rename = "tick-interval-ms", default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Max concurrent audio loads
    #[serde(rename = "prefetch-slots", default = "default_prefetch_slots")]
    pub prefetch_slots: usize,

    /// Prefetch the rest of the queue whenever an utterance starts
    #[serde(rename = "prefetch-queue", default = "default_true")]
    pub prefetch_queue: bool,

    /// Split added text at sentence and clause boundaries
    #[serde(rename = "split-by-boundaries", default = "default_true")]
    pub split_by_boundaries: bool,

    /// Spoken once at startup
    #[serde(default)]
    pub greeting: Option<String>,

    /// Request channel capacity
    #[serde(rename = "channel-buffer", default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_prefetch_slots() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_channel_buffer() -> usize {
    256
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            prefetch_slots: 5,
            prefetch_queue: true,
            split_by_boundaries: true,
            greeting: None,
            channel_buffer: 256,
        }
    }
}

impl SchedulerConfig {
    /// Get the tick interval as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
