use ivideo_core::overlay::OverlayError;
use tracing::{info, warn};

use crate::error::SessionError;

use super::service::OverlaySession;

impl OverlaySession {
    /// Confirm the selected option for the question on screen.
    ///
    /// Records it in the ledger, starts a background upload of the whole
    /// ledger under the session's storage key, then resumes playback. The
    /// upload is not awaited; a failure to start it is reported and playback
    /// resumes anyway.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Overlay` if no question is up or nothing is
    /// selected; the overlay stays up in that case.
    pub fn on_submit(&mut self) -> Result<(), SessionError> {
        let (index, record) = self.context.record_answer()?;
        let key = self.context.storage_key();
        info!(index, %key, "answer recorded; uploading ledger");

        if let Err(err) = self.uploads.dispatch(key, &record) {
            warn!(error = %err, "could not start answer upload");
            self.presenter
                .show_warning(&format!("Your answers could not be saved: {err}"));
        }
        self.on_resolve()
    }

    /// Close the question on screen without answering it.
    ///
    /// The ledger slot stays empty and nothing is uploaded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Overlay` if no question is up.
    pub fn on_dismiss(&mut self) -> Result<(), SessionError> {
        let index = self
            .context
            .overlay()
            .pending()
            .ok_or(OverlayError::NotAwaiting)?
            .index();
        info!(index, "question dismissed");
        self.on_resolve()
    }
}
