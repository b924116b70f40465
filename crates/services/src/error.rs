//! Shared error types for the services crate.

use thiserror::Error;

use ivideo_core::overlay::OverlayError;

/// Errors emitted by the overlay session and its loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    #[error("failed to encode answers: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("upload task failed: {0}")]
    UploadTask(String),
}

impl SessionError {
    /// Programming-error conditions that must end the session.
    ///
    /// Everything else is reported to the viewer and the loop keeps going.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Overlay(OverlayError::Ledger(_) | OverlayError::UnknownQuestion { .. })
        )
    }
}
