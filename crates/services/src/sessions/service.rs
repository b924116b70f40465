use ivideo_core::scheduler::TriggerDecision;
use ivideo_core::session::SessionContext;
use storage::UploadProgress;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::player::{PlaybackEngine, PlayerEvent};
use crate::presenter::Presenter;
use crate::upload::{UploadDispatcher, UploadOutcome};

/// One viewer's pass through one interactive video.
///
/// Owns the pure `SessionContext` and performs its side effects on the
/// player, the presentation layer and the upload dispatcher. Every method
/// runs on the session's single flow of control.
///
/// The overlay controller lives in `overlay.rs`, the submission handler in
/// `submission.rs`.
pub struct OverlaySession {
    pub(super) context: SessionContext,
    pub(super) player: Box<dyn PlaybackEngine>,
    pub(super) presenter: Box<dyn Presenter>,
    pub(super) uploads: UploadDispatcher,
}

impl OverlaySession {
    #[must_use]
    pub fn new(
        context: SessionContext,
        player: Box<dyn PlaybackEngine>,
        presenter: Box<dyn Presenter>,
        uploads: UploadDispatcher,
    ) -> Self {
        Self {
            context,
            player,
            presenter,
            uploads,
        }
    }

    /// One polling step: sample the position and show a question if one is due.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if a due question cannot be shown.
    pub fn tick(&mut self) -> Result<TriggerDecision, SessionError> {
        let position = self.player.position();
        let decision = self.context.poll(position);
        if let TriggerDecision::Show(index) = decision {
            self.on_show(index)?;
        }
        Ok(decision)
    }

    /// React to an event emitted by the player.
    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Play => {
                if !self.context.overlay().is_hidden() {
                    debug!("playback started while a question is up; pausing again");
                    self.player.pause();
                }
            }
            PlayerEvent::EnterFullscreen | PlayerEvent::ExitFullscreen => {
                self.player.lock_landscape();
            }
        }
    }

    pub fn report_upload_progress(&mut self, progress: &UploadProgress) {
        self.presenter.show_upload_progress(progress.percent());
    }

    pub fn report_upload_outcome(&mut self, outcome: &UploadOutcome) {
        if let Err(err) = &outcome.result {
            warn!(key = %outcome.key, error = %err, "reporting failed upload to viewer");
            self.presenter
                .show_warning(&format!("Your answers could not be saved: {err}"));
        }
    }

    /// Surface a rejected viewer action without stopping the session.
    pub fn report_rejected(&mut self, err: &SessionError) {
        warn!(error = %err, "viewer action rejected");
        self.presenter.show_warning(&err.to_string());
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Number of uploads started and not yet collected.
    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.uploads.pending()
    }

    /// Wait for outstanding uploads and hand back the final state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UploadTask` if an upload task panicked.
    pub async fn finish(mut self) -> Result<(SessionContext, Vec<UploadOutcome>), SessionError> {
        let outcomes = self.uploads.drain().await?;
        Ok((self.context, outcomes))
    }
}
