use std::sync::Arc;

use ivideo_core::model::{SUBMISSION_CONTENT_TYPE, SubmissionRecord};
use storage::{StorageError, UploadGateway, UploadProgress, UploadReceipt, UploadRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::SessionError;

/// Result of one background upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub key: String,
    pub result: Result<UploadReceipt, StorageError>,
}

impl UploadOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Receiving ends for upload notifications, drained by the session loop.
pub struct UploadFeed {
    pub progress: mpsc::UnboundedReceiver<UploadProgress>,
    pub finished: mpsc::UnboundedReceiver<UploadOutcome>,
}

/// Starts uploads without waiting for them.
///
/// Each upload runs as its own task. Progress and completion are sent back
/// over channels so the interactive flow only observes them, and
/// [`UploadDispatcher::drain`] collects the outcomes at teardown.
pub struct UploadDispatcher {
    gateway: Arc<dyn UploadGateway>,
    progress: mpsc::UnboundedSender<UploadProgress>,
    finished: mpsc::UnboundedSender<UploadOutcome>,
    in_flight: Vec<JoinHandle<UploadOutcome>>,
}

impl UploadDispatcher {
    #[must_use]
    pub fn new(gateway: Arc<dyn UploadGateway>) -> (Self, UploadFeed) {
        let (progress, progress_rx) = mpsc::unbounded_channel();
        let (finished, finished_rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            gateway,
            progress,
            finished,
            in_flight: Vec::new(),
        };
        let feed = UploadFeed {
            progress: progress_rx,
            finished: finished_rx,
        };
        (dispatcher, feed)
    }

    /// Authenticate the gateway once for the session.
    ///
    /// # Errors
    ///
    /// Returns the gateway's `StorageError`.
    pub async fn authenticate(&self) -> Result<(), StorageError> {
        self.gateway.authenticate().await
    }

    /// Serialize `record` and upload it under `key` in the background.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Encode` if the record cannot be serialized;
    /// nothing is uploaded in that case.
    pub fn dispatch(&mut self, key: String, record: &SubmissionRecord) -> Result<(), SessionError> {
        let body = record.to_json_bytes()?;
        let request = UploadRequest::new(key.clone(), body, SUBMISSION_CONTENT_TYPE);
        let gateway = Arc::clone(&self.gateway);
        let progress = self.progress.clone();
        let finished = self.finished.clone();

        let handle = tokio::spawn(async move {
            let result = gateway.upload(request, progress).await;
            match &result {
                Ok(receipt) => info!(key = %receipt.key, bytes = receipt.bytes, "answers uploaded"),
                Err(err) => warn!(%key, error = %err, "answer upload failed"),
            }
            let outcome = UploadOutcome { key, result };
            let _ = finished.send(outcome.clone());
            outcome
        });
        self.in_flight.push(handle);
        Ok(())
    }

    /// Number of uploads dispatched and not yet drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Wait for every dispatched upload and return the outcomes in dispatch order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UploadTask` if an upload task panicked.
    pub async fn drain(&mut self) -> Result<Vec<UploadOutcome>, SessionError> {
        let mut outcomes = Vec::with_capacity(self.in_flight.len());
        for handle in self.in_flight.drain(..) {
            let outcome = handle
                .await
                .map_err(|e| SessionError::UploadTask(e.to_string()))?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
