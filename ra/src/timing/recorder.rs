//! Timing records and the session report

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::SoundId;

/// Latencies at or above this are left out of the standard deviation
const SD_CUTOFF_MS: i64 = 60_000;

/// Where a record lives
///
/// A new record for an id moves the previous one under a random alias, so
/// repeated utterances never overwrite statistics that were not yet read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingKey {
    Primary(SoundId),
    Alias(SoundId, u64),
}

impl TimingKey {
    pub fn id(&self) -> SoundId {
        match self {
            Self::Primary(id) | Self::Alias(id, _) => *id,
        }
    }
}

impl std::fmt::Display for TimingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary(id) => write!(f, "{}", id),
            Self::Alias(id, n) => write!(f, "{}#{:x}", id, n),
        }
    }
}

/// Timing of one request for an utterance's audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub text: String,
    /// Whether the request was meant to play
    pub autoplay: bool,
    pub requested_at: DateTime<Utc>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub play_started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub length_ms: Option<u64>,
}

impl TimingRecord {
    fn new(text: &str, autoplay: bool, at: DateTime<Utc>) -> Self {
        Self {
            text: text.to_string(),
            autoplay,
            requested_at: at,
            loaded_at: None,
            play_started_at: None,
            finished_at: None,
            length_ms: None,
        }
    }

    /// First moment audio was available after the request
    pub fn first_audio_at(&self) -> Option<DateTime<Utc>> {
        match (self.loaded_at, self.play_started_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Request-to-audio latency, for requests meant to play
    pub fn latency_ms(&self) -> Option<i64> {
        if !self.autoplay {
            return None;
        }
        self.first_audio_at()
            .map(|end| (end - self.requested_at).num_milliseconds())
    }
}

/// Session counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub sounds_played: u64,
    pub total_latency_ms: u64,
}

/// Aggregate over all records meant to play
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingReport {
    pub mean_latency_ms: f64,
    pub sd_latency_ms: f64,
    pub total_latency_ms: i64,
    pub count: usize,
    pub total_length_ms: u64,
}

impl std::fmt::Display for TimingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {}||",
            self.mean_latency_ms, self.sd_latency_ms, self.total_latency_ms, self.count, self.total_length_ms
        )
    }
}

#[derive(Debug, Serialize)]
struct ExportEntry<'a> {
    key: String,
    #[serde(flatten)]
    record: &'a TimingRecord,
}

#[derive(Debug, Default)]
pub struct TimingRecorder {
    records: HashMap<TimingKey, TimingRecord>,
    stats: SessionStats,
}

impl TimingRecorder {
    pub fn new() -> Self {
        debug!("TimingRecorder::new: called");
        Self::default()
    }

    /// Open a record for a load or replay request
    pub fn record_request(&mut self, id: SoundId, text: &str, autoplay: bool, at: DateTime<Utc>) {
        debug!(%id, autoplay, "TimingRecorder::record_request: called");
        let mut record = TimingRecord::new(text, autoplay, at);
        if let Some(previous) = self.records.remove(&TimingKey::Primary(id)) {
            if previous.play_started_at.is_none() {
                record.length_ms = previous.length_ms;
            }
            let alias = self.free_alias(id);
            debug!(%id, %alias, "record_request: aliasing previous record");
            self.records.insert(alias, previous);
        }
        self.records.insert(TimingKey::Primary(id), record);
    }

    fn free_alias(&self, id: SoundId) -> TimingKey {
        loop {
            let key = TimingKey::Alias(id, rand::random());
            if !self.records.contains_key(&key) {
                return key;
            }
        }
    }

    pub fn record_loaded(&mut self, id: SoundId, at: DateTime<Utc>, duration_ms: Option<u64>) {
        let Some(record) = self.records.get_mut(&TimingKey::Primary(id)) else {
            debug!(%id, "record_loaded: no record");
            return;
        };
        if record.loaded_at.is_none() {
            record.loaded_at = Some(at);
        }
        if duration_ms.is_some() {
            record.length_ms = duration_ms;
        }
    }

    pub fn record_play_start(&mut self, id: SoundId, at: DateTime<Utc>) {
        let Some(record) = self.records.get_mut(&TimingKey::Primary(id)) else {
            debug!(%id, "record_play_start: no record");
            return;
        };
        if record.play_started_at.is_some() {
            return;
        }
        record.play_started_at = Some(at);
        self.stats.sounds_played += 1;
        if let Some(latency) = record.latency_ms() {
            self.stats.total_latency_ms += latency.max(0) as u64;
        }
        debug!(%id, sounds_played = self.stats.sounds_played, "TimingRecorder::record_play_start: called");
    }

    /// Finalize the current record; a finalized record is left alone
    pub fn record_finish(&mut self, id: SoundId, at: DateTime<Utc>, duration_ms: Option<u64>) {
        debug!(%id, ?duration_ms, "TimingRecorder::record_finish: called");
        let Some(record) = self.records.get_mut(&TimingKey::Primary(id)) else {
            debug!(%id, "record_finish: no record");
            return;
        };
        if record.finished_at.is_some() {
            debug!(%id, "record_finish: already finalized");
            return;
        }
        record.finished_at = Some(at);
        if duration_ms.is_some() {
            record.length_ms = duration_ms;
        }
    }

    pub fn get(&self, key: &TimingKey) -> Option<&TimingRecord> {
        self.records.get(key)
    }

    /// Number of records, aliases included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Mean and standard deviation of request-to-audio latency
    pub fn report(&self) -> TimingReport {
        let latencies: Vec<(i64, u64)> = self
            .records
            .values()
            .filter_map(|r| r.latency_ms().map(|l| (l, r.length_ms.unwrap_or(0))))
            .collect();
        let count = latencies.len();
        if count == 0 {
            return TimingReport::default();
        }

        let total_latency_ms: i64 = latencies.iter().map(|(l, _)| *l).filter(|l| *l > 0).sum();
        let total_length_ms = latencies.iter().map(|(_, len)| *len).sum();
        let mean = total_latency_ms as f64 / count as f64;
        let variance = latencies
            .iter()
            .map(|(l, _)| *l)
            .filter(|l| *l < SD_CUTOFF_MS)
            .map(|l| (l as f64 - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        let report = TimingReport {
            mean_latency_ms: mean,
            sd_latency_ms: variance.sqrt(),
            total_latency_ms,
            count,
            total_length_ms,
        };
        debug!(%report, "TimingRecorder::report: done");
        report
    }

    /// All records, oldest request first
    pub fn export_json(&self) -> serde_json::Value {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(key, record)| ExportEntry {
                key: key.to_string(),
                record,
            })
            .collect();
        entries.sort_by_key(|e| e.record.requested_at);
        serde_json::json!({
            "report": self.report(),
            "stats": self.stats,
            "records": entries,
        })
    }
}
