//! Cloneable handle to the speech runner

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::collaborators::KeyAction;
use super::messages::{SpeechError, SpeechRequest, SpeechResponse, SpeechStatus};
use crate::browse::BrowseMode;
use crate::timing::TimingReport;

/// Handle to send requests to the speech runner
#[derive(Debug, Clone)]
pub struct SpeechHandle {
    tx: mpsc::Sender<SpeechRequest>,
}

impl SpeechHandle {
    pub(crate) fn new(tx: mpsc::Sender<SpeechRequest>) -> Self {
        Self { tx }
    }

    async fn send(&self, request: SpeechRequest) -> SpeechResponse<()> {
        self.tx.send(request).await.map_err(|_| SpeechError::ChannelError)
    }

    /// Queue text for speech, returning how many fragments were queued
    pub async fn add_sound(&self, text: impl Into<String>) -> SpeechResponse<usize> {
        let text = text.into();
        debug!(len = text.len(), "SpeechHandle::add_sound: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SpeechRequest::AddSound { text, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SpeechError::ChannelError)
    }

    /// Queue a keyboard action; it runs on a later tick
    pub async fn action(&self, action: KeyAction) -> SpeechResponse<()> {
        debug!(?action, "SpeechHandle::action: called");
        self.send(SpeechRequest::Action(action)).await
    }

    pub async fn set_mode(&self, mode: BrowseMode) -> SpeechResponse<()> {
        debug!(%mode, "SpeechHandle::set_mode: called");
        self.send(SpeechRequest::SetMode(mode)).await
    }

    /// Stop playback and empty the queue, returning how many were dropped
    pub async fn reset(&self) -> SpeechResponse<usize> {
        debug!("SpeechHandle::reset: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SpeechRequest::Reset { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SpeechError::ChannelError)
    }

    pub async fn silence(&self) -> SpeechResponse<()> {
        debug!("SpeechHandle::silence: called");
        self.send(SpeechRequest::Silence).await
    }

    pub async fn prefetch_keys(&self) -> SpeechResponse<()> {
        debug!("SpeechHandle::prefetch_keys: called");
        self.send(SpeechRequest::PrefetchKeys).await
    }

    pub async fn status(&self) -> SpeechResponse<SpeechStatus> {
        debug!("SpeechHandle::status: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SpeechRequest::Status { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SpeechError::ChannelError)
    }

    pub async fn timing_report(&self) -> SpeechResponse<TimingReport> {
        debug!("SpeechHandle::timing_report: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SpeechRequest::TimingReport { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SpeechError::ChannelError)
    }

    /// Ask the runner to stop after the current request
    pub async fn shutdown(&self) -> SpeechResponse<()> {
        debug!("SpeechHandle::shutdown: called");
        self.send(SpeechRequest::Shutdown).await
    }
}
