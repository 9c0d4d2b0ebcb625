//! Prefetch budget and deferred load queue
//!
//! At most `total` loads are in flight at once. Requests beyond the budget
//! wait in a FIFO and are served as completions free slots. Invariant:
//! `free_slots + in_flight == total`.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::domain::SoundId;
use crate::engine::{LoadRequest, PlaybackEngine};

/// What `request_load` did with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A loaded sound was replayed without fetching
    Replayed,
    /// A loaded sound needs nothing more
    AlreadyReady,
    /// An in-flight load will now autoplay
    Upgraded,
    /// The load is already in flight
    AlreadyLoading,
    /// A slot was taken and the load started
    Started,
    /// No slot was free; the request waits its turn
    Deferred,
    /// The engine refused the request
    Rejected,
}

/// Counters over the manager's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    pub started: u64,
    pub deferred: u64,
    pub replayed: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug)]
pub struct PrefetchManager {
    total: usize,
    free_slots: usize,
    in_flight: HashSet<SoundId>,
    ready: HashSet<SoundId>,
    overflow: VecDeque<LoadRequest>,
    stats: PrefetchStats,
}

impl PrefetchManager {
    /// A budget of zero is raised to one so loads can always progress
    pub fn new(total: usize) -> Self {
        let total = total.max(1);
        debug!(total, "PrefetchManager::new: called");
        Self {
            total,
            free_slots: total,
            in_flight: HashSet::new(),
            ready: HashSet::new(),
            overflow: VecDeque::new(),
            stats: PrefetchStats::default(),
        }
    }

    /// Route one load request through the budget
    pub fn request_load(&mut self, engine: &mut dyn PlaybackEngine, request: LoadRequest) -> LoadOutcome {
        let id = request.id;
        debug!(%id, seq = request.seq, autoplay = request.autoplay, free = self.free_slots, "PrefetchManager::request_load: called");

        if self.ready.contains(&id) {
            if !request.autoplay {
                return LoadOutcome::AlreadyReady;
            }
            match engine.play(id) {
                Ok(()) => {
                    self.stats.replayed += 1;
                    return LoadOutcome::Replayed;
                }
                Err(e) if e.needs_reload() => {
                    debug!(%id, error = %e, "PrefetchManager::request_load: reloading");
                    self.ready.remove(&id);
                }
                Err(e) => {
                    warn!(%id, error = %e, "Replay refused");
                    return LoadOutcome::Rejected;
                }
            }
        }

        if self.in_flight.contains(&id) {
            if !request.autoplay {
                return LoadOutcome::AlreadyLoading;
            }
            return match engine.set_autoplay(id) {
                Ok(()) => LoadOutcome::Upgraded,
                Err(e) => {
                    warn!(%id, error = %e, "Autoplay upgrade refused");
                    LoadOutcome::Rejected
                }
            };
        }

        if let Some(waiting) = self.overflow.iter_mut().find(|r| r.id == id) {
            if request.autoplay && !waiting.autoplay {
                debug!(%id, "PrefetchManager::request_load: upgrading deferred request");
                waiting.autoplay = true;
            }
            return LoadOutcome::Deferred;
        }

        if self.free_slots == 0 {
            debug!(%id, backlog = self.overflow.len() + 1, "PrefetchManager::request_load: budget exhausted, deferring");
            self.overflow.push_back(request);
            self.stats.deferred += 1;
            return LoadOutcome::Deferred;
        }

        self.start(engine, request);
        LoadOutcome::Started
    }

    fn start(&mut self, engine: &mut dyn PlaybackEngine, request: LoadRequest) {
        self.free_slots -= 1;
        self.in_flight.insert(request.id);
        self.stats.started += 1;
        engine.begin_load(&request);
    }

    /// Free the slot held by `id` and serve the oldest deferred request
    ///
    /// Returns false for ids that were not in flight.
    pub fn on_load_complete(&mut self, engine: &mut dyn PlaybackEngine, id: SoundId, ok: bool) -> bool {
        if !self.in_flight.remove(&id) {
            debug!(%id, "PrefetchManager::on_load_complete: not in flight, ignoring");
            return false;
        }
        self.free_slots += 1;
        if ok {
            self.stats.completed += 1;
            self.ready.insert(id);
        } else {
            self.stats.failed += 1;
        }
        debug!(%id, ok, free = self.free_slots, backlog = self.overflow.len(), "PrefetchManager::on_load_complete: called");

        while self.free_slots > 0 {
            let Some(next) = self.overflow.pop_front() else {
                break;
            };
            debug!(id = %next.id, "PrefetchManager::on_load_complete: serving deferred request");
            self.request_load(engine, next);
        }
        true
    }

    /// Warm the cache from a queue snapshot without exceeding the free budget
    ///
    /// `requests` is consumed lazily in playback order and never deferred.
    /// Returns the requests that started loading.
    pub fn prefetch_snapshot<I>(&mut self, engine: &mut dyn PlaybackEngine, requests: I) -> Vec<LoadRequest>
    where
        I: IntoIterator<Item = LoadRequest>,
    {
        let mut started = Vec::new();
        for request in requests {
            if self.free_slots == 0 {
                break;
            }
            let pending = request.clone();
            if self.request_load(engine, request) == LoadOutcome::Started {
                started.push(pending);
            }
        }
        debug!(started = started.len(), free = self.free_slots, "PrefetchManager::prefetch_snapshot: done");
        started
    }

    /// Forget everything tied to the current engine and restore the budget
    pub fn abandon(&mut self) {
        warn!(
            in_flight = self.in_flight.len(),
            deferred = self.overflow.len(),
            "Abandoning prefetch state"
        );
        self.in_flight.clear();
        self.ready.clear();
        self.overflow.clear();
        self.free_slots = self.total;
    }

    /// Drop requests still waiting for a slot
    pub fn clear_deferred(&mut self) {
        debug!(deferred = self.overflow.len(), "PrefetchManager::clear_deferred: called");
        self.overflow.clear();
    }

    pub fn is_deferred(&self, id: SoundId) -> bool {
        self.overflow.iter().any(|r| r.id == id)
    }

    pub fn is_in_flight(&self, id: SoundId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn is_ready(&self, id: SoundId) -> bool {
        self.ready.contains(&id)
    }

    pub fn free_slots(&self) -> usize {
        self.free_slots
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn deferred(&self) -> usize {
        self.overflow.len()
    }

    pub fn stats(&self) -> &PrefetchStats {
        &self.stats
    }
}
