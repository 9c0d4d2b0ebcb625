//! readaloud - speech scheduling core for a web-delivered screen reader
//!
//! Text is segmented into utterances, queued, prefetched as audio under a
//! bounded budget and played one at a time through an interchangeable
//! playback engine. A periodic tick decides what happens next according to
//! the current browse mode.
//!
//! # Modules
//!
//! - [`text`] - segmentation and content identity
//! - [`queue`] - sound queue and playback slot
//! - [`engine`] - playback engine trait, adapters and URL resolution
//! - [`prefetch`] - the concurrent load budget
//! - [`browse`] - browse modes
//! - [`timing`] - latency records and session statistics
//! - [`scheduler`] - the tick, the scheduler context and its actor
//! - [`events`] - speech events for observers
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod browse;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod events;
pub mod prefetch;
pub mod queue;
pub mod scheduler;
pub mod text;
pub mod timing;
