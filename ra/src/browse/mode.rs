//! Browse mode values

use serde::{Deserialize, Serialize};

/// Cursor movement direction for the document-advance collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}

/// Active reading policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BrowseMode {
    /// Keep reading forward through the document
    #[default]
    ContinuousRead,
    PlayOneForward,
    PlayOneBackward,
    PlayTwoBackward,
    CharacterStepForward,
    CharacterStepBackward,
    /// Only keyboard actions produce speech
    KeyboardDriven,
    /// Content is loading; keyboard actions wait
    Loading,
    /// The current utterance repeats; keyboard actions wait
    Looping,
    Silent,
}

impl BrowseMode {
    pub const ALL: [BrowseMode; 10] = [
        Self::ContinuousRead,
        Self::PlayOneForward,
        Self::PlayOneBackward,
        Self::PlayTwoBackward,
        Self::CharacterStepForward,
        Self::CharacterStepBackward,
        Self::KeyboardDriven,
        Self::Loading,
        Self::Looping,
        Self::Silent,
    ];

    /// Whether an idle scheduler advances the document cursor in this mode
    pub fn is_auto_advance(&self) -> bool {
        self.direction().is_some()
    }

    /// Cursor direction for auto-advance modes
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::ContinuousRead | Self::PlayOneForward | Self::CharacterStepForward => Some(Direction::Forward),
            Self::PlayOneBackward | Self::PlayTwoBackward | Self::CharacterStepBackward => Some(Direction::Backward),
            Self::KeyboardDriven | Self::Loading | Self::Looping | Self::Silent => None,
        }
    }

    /// Whether pending keyboard actions must wait in this mode
    pub fn blocks_actions(&self) -> bool {
        matches!(self, Self::Loading | Self::Looping)
    }

    pub fn is_backward(&self) -> bool {
        self.direction() == Some(Direction::Backward)
    }
}

impl std::fmt::Display for BrowseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ContinuousRead => "continuous-read",
            Self::PlayOneForward => "play-one-forward",
            Self::PlayOneBackward => "play-one-backward",
            Self::PlayTwoBackward => "play-two-backward",
            Self::CharacterStepForward => "character-step-forward",
            Self::CharacterStepBackward => "character-step-backward",
            Self::KeyboardDriven => "keyboard-driven",
            Self::Loading => "loading",
            Self::Looping => "looping",
            Self::Silent => "silent",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for BrowseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continuous-read" | "read" => Ok(Self::ContinuousRead),
            "play-one-forward" => Ok(Self::PlayOneForward),
            "play-one-backward" => Ok(Self::PlayOneBackward),
            "play-two-backward" => Ok(Self::PlayTwoBackward),
            "character-step-forward" => Ok(Self::CharacterStepForward),
            "character-step-backward" => Ok(Self::CharacterStepBackward),
            "keyboard-driven" | "keyboard" => Ok(Self::KeyboardDriven),
            "loading" => Ok(Self::Loading),
            "looping" => Ok(Self::Looping),
            "silent" | "stopped" => Ok(Self::Silent),
            _ => Err(format!("Unknown browse mode: {}", s)),
        }
    }
}
