//! Concurrency-limited audio prefetching

mod manager;

pub use manager::{LoadOutcome, PrefetchManager, PrefetchStats};
