//! Per-session state for one viewer watching one interactive video.
//!
//! `SessionContext` owns the ledger, the trigger cursor and the overlay state.
//! It performs no I/O: callers feed it playback positions and viewer input and
//! carry out the side effects (pausing, rendering, uploading) themselves.

use crate::model::{
    AnswerLedger, IVideoId, OverlaySettings, QuestionSchedule, QuestionSpec, SessionId,
    SubmissionRecord, ViewerId, storage_key,
};
use crate::overlay::{OverlayError, OverlayState, PendingQuestion};
use crate::scheduler::{SettleGuard, TriggerCursor, TriggerDecision, TriggerScheduler};
use crate::time::PlaybackPosition;

#[derive(Debug, Clone)]
pub struct SessionContext {
    id: SessionId,
    ivideo: IVideoId,
    viewer: ViewerId,
    settings: OverlaySettings,
    schedule: QuestionSchedule,
    ledger: AnswerLedger,
    scheduler: TriggerScheduler,
    overlay: OverlayState,
    settle: Option<SettleGuard>,
    shown: Vec<usize>,
}

impl SessionContext {
    #[must_use]
    pub fn new(
        ivideo: IVideoId,
        viewer: ViewerId,
        schedule: QuestionSchedule,
        settings: OverlaySettings,
    ) -> Self {
        let scheduler = TriggerScheduler::new(&schedule, settings.trigger_threshold());
        Self {
            id: SessionId::new(),
            ivideo,
            viewer,
            ledger: AnswerLedger::new(schedule.len()),
            schedule,
            settings,
            scheduler,
            overlay: OverlayState::Hidden,
            settle: None,
            shown: Vec::new(),
        }
    }

    /// Evaluate one playback sample.
    ///
    /// Nothing fires while the settle window after a resume is still open.
    pub fn poll(&mut self, position: PlaybackPosition) -> TriggerDecision {
        if let Some(guard) = self.settle {
            if guard.holds(position) {
                return TriggerDecision::None;
            }
            self.settle = None;
        }
        self.scheduler.poll(position, &self.overlay)
    }

    /// Put question `index` up and return it for rendering.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::UnknownQuestion` for an index outside the schedule,
    /// or `OverlayError::AlreadyAwaiting` if another question is up.
    pub fn show(&mut self, index: usize) -> Result<&QuestionSpec, OverlayError> {
        let question = self
            .schedule
            .get(index)
            .ok_or(OverlayError::UnknownQuestion { index })?;
        self.overlay.show(index)?;
        self.scheduler.mark_fired(index);
        self.shown.push(index);
        Ok(question)
    }

    /// Record the viewer's pick for the pending question.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::NotAwaiting` or `OverlayError::UnknownOption`.
    pub fn select(&mut self, option: &str) -> Result<(), OverlayError> {
        let index = self
            .overlay
            .pending()
            .ok_or(OverlayError::NotAwaiting)?
            .index();
        let question = self
            .schedule
            .get(index)
            .ok_or(OverlayError::UnknownQuestion { index })?;
        self.overlay.select(question, option)
    }

    /// Write the pending selection into the ledger and snapshot it for upload.
    ///
    /// The overlay stays up; call [`SessionContext::resolve`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::NotAwaiting`, `OverlayError::NoSelection`, or
    /// `OverlayError::Ledger` if the pending index is outside the ledger.
    pub fn record_answer(&mut self) -> Result<(usize, SubmissionRecord), OverlayError> {
        let pending = self.overlay.pending().ok_or(OverlayError::NotAwaiting)?;
        let index = pending.index();
        let value = pending
            .selection()
            .ok_or(OverlayError::NoSelection)?
            .to_string();
        self.ledger.set(index, value)?;
        Ok((index, SubmissionRecord::build(&self.ledger, &self.schedule)))
    }

    /// Take the overlay down and open the settle window at `position`.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::NotAwaiting` if no question is up.
    pub fn resolve(&mut self, position: PlaybackPosition) -> Result<PendingQuestion, OverlayError> {
        let pending = self.overlay.resolve()?;
        let threshold = self.settings.settle_threshold();
        self.settle = position
            .secs()
            .map(|resumed_at| SettleGuard::new(resumed_at, threshold));
        Ok(pending)
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn ivideo(&self) -> &IVideoId {
        &self.ivideo
    }

    #[must_use]
    pub fn viewer(&self) -> &ViewerId {
        &self.viewer
    }

    #[must_use]
    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    #[must_use]
    pub fn schedule(&self) -> &QuestionSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    #[must_use]
    pub fn cursor(&self) -> TriggerCursor {
        self.scheduler.cursor()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.scheduler.is_exhausted()
    }

    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    /// Indices of the questions shown so far, in order.
    #[must_use]
    pub fn shown(&self) -> &[usize] {
        &self.shown
    }

    /// Where this viewer's answers are uploaded.
    #[must_use]
    pub fn storage_key(&self) -> String {
        storage_key(self.settings.save_dir(), &self.ivideo, &self.viewer)
    }
}
