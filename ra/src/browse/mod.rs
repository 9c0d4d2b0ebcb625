//! Browse mode: the policy for automatic document reading
//!
//! Exactly one [`BrowseMode`] is active. Navigation and keyboard
//! collaborators write it; the scheduler reads it each tick and writes it
//! itself when silencing playback.

mod mode;
mod state;

pub use mode::{BrowseMode, Direction};
pub use state::BrowseState;
