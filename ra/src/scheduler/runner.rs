//! Speech runner actor
//!
//! One tokio task owns the [`Scheduler`] and multiplexes the tick interval,
//! engine notices and handle requests. Nothing else touches the queue, the
//! slot or the budget, so none of it is locked.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::config::SchedulerConfig;
use super::core::Scheduler;
use super::handle::SpeechHandle;
use super::messages::SpeechRequest;

/// Drives a scheduler until shutdown
pub struct SpeechRunner {
    scheduler: Scheduler,
    requests: mpsc::Receiver<SpeechRequest>,
    tick_interval: Duration,
    greeting: Option<String>,
}

impl SpeechRunner {
    pub fn new(scheduler: Scheduler, config: &SchedulerConfig) -> (Self, SpeechHandle) {
        debug!(tick_interval_ms = config.tick_interval_ms, buffer = config.channel_buffer, "SpeechRunner::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer.max(1));
        let runner = Self {
            scheduler,
            requests: rx,
            tick_interval: config.tick_interval(),
            greeting: config.greeting.clone(),
        };
        (runner, SpeechHandle::new(tx))
    }

    /// Spawn the runner, returning its task and a handle
    ///
    /// The task resolves to the scheduler once the runner stops.
    pub fn spawn(scheduler: Scheduler, config: &SchedulerConfig) -> (JoinHandle<Scheduler>, SpeechHandle) {
        let (runner, handle) = Self::new(scheduler, config);
        let task = tokio::spawn(runner.run());
        info!("Speech runner spawned");
        (task, handle)
    }

    /// Run until a shutdown request or until every handle is dropped
    pub async fn run(mut self) -> Scheduler {
        let (notice_tx, mut notices) = mpsc::unbounded_channel();
        self.scheduler.speech_mut().engines.start(notice_tx);

        if let Some(greeting) = self.greeting.take() {
            debug!(%greeting, "SpeechRunner::run: queueing greeting");
            self.scheduler.speech_mut().add_sound(&greeting);
        }

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.scheduler.tick();
                }

                Some(event) = notices.recv() => {
                    self.scheduler.handle_event(event);
                }

                request = self.requests.recv() => {
                    match request {
                        Some(SpeechRequest::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(request) => self.handle_request(request),
                        None => {
                            info!("All speech handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        self.scheduler.speech_mut().reset_sounds();
        let stats = self.scheduler.stats();
        info!(ticks = stats.ticks, actions = stats.actions_run, "Speech runner stopped");
        self.scheduler
    }

    fn handle_request(&mut self, request: SpeechRequest) {
        debug!(request = request.name(), "SpeechRunner::handle_request: called");
        match request {
            SpeechRequest::AddSound { text, reply } => {
                let queued = self.scheduler.speech_mut().add_sound(&text);
                let _ = reply.send(queued);
            }
            SpeechRequest::Action(action) => self.scheduler.actions_mut().push(action),
            SpeechRequest::SetMode(mode) => self.scheduler.speech_mut().set_mode(mode),
            SpeechRequest::Reset { reply } => {
                let dropped = self.scheduler.speech_mut().reset_sounds();
                let _ = reply.send(dropped.len());
            }
            SpeechRequest::Silence => self.scheduler.speech_mut().silence_all(),
            SpeechRequest::PrefetchKeys => self.scheduler.speech_mut().prefetch_keys(),
            SpeechRequest::Status { reply } => {
                let _ = reply.send(self.scheduler.status());
            }
            SpeechRequest::TimingReport { reply } => {
                let _ = reply.send(self.scheduler.speech().timing().report());
            }
            SpeechRequest::Shutdown => {}
        }
    }
}
