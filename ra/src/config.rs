//! readaloud configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::simulated::SimulatorConfig;
use crate::engine::url::{TEXT_PLACEHOLDER, URL_PLACEHOLDER};
use crate::engine::{UrlResolver, Volume};
use crate::scheduler::SchedulerConfig;

/// Main readaloud configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tick, budget and segmentation settings
    pub scheduler: SchedulerConfig,

    /// Engine selection
    pub engine: EngineConfig,

    /// Sound URLs and volume
    pub audio: AudioConfig,

    /// Timing of the simulated audio device
    pub simulator: SimulatorConfig,

    /// Log level used when none is given on the command line
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.tick_interval_ms == 0 {
            return Err(eyre::eyre!("scheduler.tick-interval-ms must be greater than zero"));
        }
        if self.scheduler.prefetch_slots == 0 {
            return Err(eyre::eyre!("scheduler.prefetch-slots must be greater than zero"));
        }
        if self.scheduler.channel_buffer == 0 {
            return Err(eyre::eyre!("scheduler.channel-buffer must be greater than zero"));
        }
        if !self.audio.sound_url_base.contains(TEXT_PLACEHOLDER) {
            return Err(eyre::eyre!(
                "audio.sound-url-base must contain {}: {}",
                TEXT_PLACEHOLDER,
                self.audio.sound_url_base
            ));
        }
        if let Some(proxy) = &self.audio.proxy
            && !proxy.contains(URL_PLACEHOLDER)
        {
            return Err(eyre::eyre!("audio.proxy must contain {}: {}", URL_PLACEHOLDER, proxy));
        }
        if self.audio.volume > 100 {
            return Err(eyre::eyre!("audio.volume must be at most 100, got {}", self.audio.volume));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .readaloud.yml
        let local_config = PathBuf::from(".readaloud.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/readaloud/readaloud.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("readaloud").join("readaloud.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Engine selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Use the embedded single-element player instead of the streaming one
    pub embed: bool,
}

/// Sound URL templates and volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Speech URL template; `$text$` is replaced by the escaped text
    #[serde(rename = "sound-url-base")]
    pub sound_url_base: String,

    /// Base location of prerecorded sounds
    #[serde(rename = "sounds-path")]
    pub sounds_path: String,

    /// Optional proxy template; `$url$` is replaced by the escaped URL
    pub proxy: Option<String>,

    /// Playback volume, 0-100
    pub volume: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sound_url_base: "http://localhost:8080/speak?text=$text$".to_string(),
            sounds_path: "http://localhost:8080/sounds".to_string(),
            proxy: None,
            volume: 100,
        }
    }
}

impl AudioConfig {
    pub fn url_resolver(&self) -> UrlResolver {
        UrlResolver::new(self.sound_url_base.clone(), self.sounds_path.clone(), self.proxy.clone())
    }

    pub fn volume(&self) -> Volume {
        Volume::new(self.volume)
    }
}
