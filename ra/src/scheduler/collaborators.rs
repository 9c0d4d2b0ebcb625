//! Navigation and keyboard collaborators
//!
//! The scheduler only knows the two traits. [`ParagraphCursor`] and
//! [`PendingActions`] are the implementations the runner and CLI use.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::speech::{Speech, key_name};
use crate::browse::{BrowseMode, Direction};

/// Moves the document cursor, enqueueing what it lands on
pub trait Navigator: Send {
    fn advance(&mut self, direction: Direction, speech: &mut Speech);
}

/// Keyboard-triggered actions waiting to run
pub trait ActionQueue: Send {
    fn has_pending(&self) -> bool;

    /// Run the oldest pending action
    fn play_next(&mut self, speech: &mut Speech);

    fn push(&mut self, action: KeyAction);
}

/// One keyboard-triggered action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAction {
    Speak(String),
    SetMode(BrowseMode),
    Silence,
    /// Speak the name of a key code
    EchoKey(u32),
}

/// FIFO of keyboard actions
#[derive(Debug, Default)]
pub struct PendingActions {
    actions: VecDeque<KeyAction>,
}

impl PendingActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ActionQueue for PendingActions {
    fn has_pending(&self) -> bool {
        !self.actions.is_empty()
    }

    fn play_next(&mut self, speech: &mut Speech) {
        let Some(action) = self.actions.pop_front() else {
            return;
        };
        debug!(?action, remaining = self.actions.len(), "PendingActions::play_next: called");
        match action {
            KeyAction::Speak(text) => {
                speech.add_sound(&text);
            }
            KeyAction::SetMode(mode) => speech.set_mode(mode),
            KeyAction::Silence => speech.silence_all(),
            KeyAction::EchoKey(code) => match key_name(code) {
                Some(name) => {
                    speech.add_sound(&name);
                }
                None => debug!(code, "PendingActions::play_next: key has no name"),
            },
        }
    }

    fn push(&mut self, action: KeyAction) {
        self.actions.push_back(action);
    }
}

/// A document as ordered text nodes with a reading cursor
///
/// The cursor sits before the first node. Reading forward speaks the next
/// node; reading backward speaks the previous one. Single-step modes drop to
/// keyboard-driven after one node, and play-two-backward steps back twice,
/// one node per call. Running off either end stops automatic reading.
#[derive(Debug, Default)]
pub struct ParagraphCursor {
    nodes: Vec<String>,
    /// Index of the node read last
    position: Option<usize>,
}

impl ParagraphCursor {
    pub fn new(nodes: Vec<String>) -> Self {
        Self { nodes, position: None }
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    fn next_index(&self, direction: Direction) -> Option<usize> {
        match (direction, self.position) {
            (Direction::Forward, None) => (!self.nodes.is_empty()).then_some(0),
            (Direction::Forward, Some(i)) => (i + 1 < self.nodes.len()).then_some(i + 1),
            (Direction::Backward, None) => None,
            (Direction::Backward, Some(i)) => i.checked_sub(1),
        }
    }
}

impl Navigator for ParagraphCursor {
    fn advance(&mut self, direction: Direction, speech: &mut Speech) {
        let Some(index) = self.next_index(direction) else {
            info!(%direction, "Reached the end of the document");
            speech.set_mode(BrowseMode::KeyboardDriven);
            return;
        };
        self.position = Some(index);
        debug!(index, %direction, "ParagraphCursor::advance: called");
        speech.add_sound(&self.nodes[index]);

        match speech.mode() {
            BrowseMode::PlayTwoBackward => speech.set_mode(BrowseMode::PlayOneBackward),
            BrowseMode::PlayOneForward
            | BrowseMode::PlayOneBackward
            | BrowseMode::CharacterStepForward
            | BrowseMode::CharacterStepBackward => speech.set_mode(BrowseMode::KeyboardDriven),
            _ => {}
        }
    }
}
