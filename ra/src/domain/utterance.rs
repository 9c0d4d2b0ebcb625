//! Utterance records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SoundId;
use crate::text::identity;

/// Lifecycle of an utterance from enqueue to discard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UtteranceStatus {
    #[default]
    Queued,
    Loading,
    Ready,
    Playing,
    Finished,
}

impl std::fmt::Display for UtteranceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// One segmented unit of text to be rendered as speech
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub id: SoundId,
    pub raw_text: String,
    pub normalized_text: String,
    pub status: UtteranceStatus,
    pub enqueued_at: DateTime<Utc>,
    pub play_started_at: Option<DateTime<Utc>>,
    pub play_ended_at: Option<DateTime<Utc>>,
    pub measured_duration_ms: Option<u64>,
}

impl Utterance {
    /// Create a queued utterance, deriving its normalized text and id
    pub fn new(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let normalized_text = identity::normalize(&raw_text);
        let id = identity::hash_normalized(&normalized_text);
        debug!(%id, %raw_text, "Utterance::new: called");
        Self {
            id,
            raw_text,
            normalized_text,
            status: UtteranceStatus::Queued,
            enqueued_at: Utc::now(),
            play_started_at: None,
            play_ended_at: None,
            measured_duration_ms: None,
        }
    }

    /// Mark the utterance's audio requested
    pub fn mark_loading(&mut self) {
        if self.status == UtteranceStatus::Queued {
            self.status = UtteranceStatus::Loading;
        }
    }

    /// Mark the utterance's audio loaded; later states are kept
    pub fn mark_ready(&mut self) {
        if self.status == UtteranceStatus::Loading {
            self.status = UtteranceStatus::Ready;
        }
    }

    /// Mark the utterance audible
    pub fn mark_playing(&mut self, at: DateTime<Utc>) {
        self.status = UtteranceStatus::Playing;
        if self.play_started_at.is_none() {
            self.play_started_at = Some(at);
        }
    }

    /// Mark the utterance finished, keeping the engine-measured duration if any
    pub fn mark_finished(&mut self, at: DateTime<Utc>, duration_ms: Option<u64>) {
        self.status = UtteranceStatus::Finished;
        self.play_ended_at = Some(at);
        self.measured_duration_ms = duration_ms.or_else(|| {
            self.play_started_at
                .map(|started| (at - started).num_milliseconds().max(0) as u64)
        });
    }
}
