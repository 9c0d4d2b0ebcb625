//! Text preparation for speech
//!
//! - [`segment`] - splitting raw text into utterance-sized fragments
//! - [`identity`] - normalization and content hashing of fragments

pub mod identity;
pub mod segment;

pub use identity::{identify, normalize};
pub use segment::{Segmenter, split_boundaries};
