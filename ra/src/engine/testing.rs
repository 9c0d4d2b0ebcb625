//! Test doubles for engine code

use std::sync::{Arc, Mutex};

use super::{AudioDevice, NoticeSender};
use crate::domain::SoundId;

/// A call made on a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Init,
    Load { id: SoundId, url: String, volume: u8 },
    Play(SoundId, u64),
    StopAll,
}

/// Device that only records what it was asked to do
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    pub calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<SoundId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::Load { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn plays(&self) -> Vec<SoundId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::Play(id, _) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Playback number of the most recent play of `id`
    pub fn last_playback(&self, id: SoundId) -> Option<u64> {
        self.calls().into_iter().rev().find_map(|c| match c {
            DeviceCall::Play(played, playback) if played == id => Some(playback),
            _ => None,
        })
    }
}

impl AudioDevice for RecordingDevice {
    fn init(&mut self, _notices: NoticeSender) {
        self.calls.lock().unwrap().push(DeviceCall::Init);
    }

    fn load(&mut self, id: SoundId, url: &str, volume: u8) {
        self.calls.lock().unwrap().push(DeviceCall::Load {
            id,
            url: url.to_string(),
            volume,
        });
    }

    fn play(&mut self, id: SoundId, playback: u64) {
        self.calls.lock().unwrap().push(DeviceCall::Play(id, playback));
    }

    fn stop_all(&mut self) {
        self.calls.lock().unwrap().push(DeviceCall::StopAll);
    }
}
