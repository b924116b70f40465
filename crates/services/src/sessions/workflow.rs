use std::time::Duration;

use chrono::{DateTime, Utc};
use ivideo_core::model::{IVideoId, OverlaySettings, QuestionSchedule, SessionId, ViewerId};
use ivideo_core::session::SessionContext;
use storage::Storage;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{Instrument, error, info, info_span, warn};

use crate::Clock;
use crate::error::SessionError;
use crate::player::{PlaybackEngine, PlayerEvent};
use crate::presenter::Presenter;
use crate::upload::{UploadDispatcher, UploadFeed, UploadOutcome};

use super::service::OverlaySession;

/// Viewer input delivered to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerAction {
    /// An option was picked on the rendered question.
    Select(String),
    Submit,
    Dismiss,
    /// The viewer left the page; ends the session.
    Leave,
}

/// Sending side of a running session: viewer input and player events.
///
/// Dropping every handle ends the session like `leave`.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    actions: mpsc::UnboundedSender<ViewerAction>,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl SessionHandle {
    /// Returns `false` once the session has ended.
    pub fn send(&self, action: ViewerAction) -> bool {
        self.actions.send(action).is_ok()
    }

    pub fn select(&self, option: impl Into<String>) -> bool {
        self.send(ViewerAction::Select(option.into()))
    }

    pub fn submit(&self) -> bool {
        self.send(ViewerAction::Submit)
    }

    pub fn dismiss(&self) -> bool {
        self.send(ViewerAction::Dismiss)
    }

    pub fn leave(&self) -> bool {
        self.send(ViewerAction::Leave)
    }

    /// Forward an event emitted by the video player.
    pub fn player_event(&self, event: PlayerEvent) -> bool {
        self.events.send(event).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.actions.is_closed()
    }
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub ivideo: IVideoId,
    pub viewer: ViewerId,
    /// Final ledger snapshot, index-aligned with the schedule.
    pub answers: Vec<Option<String>>,
    /// Question indices in the order they were shown.
    pub shown: Vec<usize>,
    /// Trigger cursor at teardown; equals the question count once exhausted.
    pub cursor: usize,
    pub uploads: Vec<UploadOutcome>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionReport {
    #[must_use]
    pub fn answered(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter_map(|(index, answer)| answer.as_ref().map(|_| index))
            .collect()
    }

    #[must_use]
    pub fn failed_uploads(&self) -> usize {
        self.uploads.iter().filter(|o| !o.is_success()).count()
    }
}

/// Starts overlay sessions against one storage backend.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    storage: Storage,
    settings: OverlaySettings,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage, settings: OverlaySettings) -> Self {
        Self {
            clock,
            storage,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    /// Set up a session for `viewer` watching `ivideo`.
    ///
    /// Authenticates the upload gateway once. A failure is shown to the viewer
    /// as a warning and the session starts anyway; its uploads will then fail
    /// and be reported one by one.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(
        &self,
        ivideo: IVideoId,
        viewer: ViewerId,
        schedule: QuestionSchedule,
        player: Box<dyn PlaybackEngine>,
        mut presenter: Box<dyn Presenter>,
    ) -> (SessionRunner, SessionHandle) {
        let context = SessionContext::new(ivideo, viewer, schedule, self.settings.clone());
        let (uploads, feed) = UploadDispatcher::new(self.storage.uploads.clone());

        if let Err(err) = uploads.authenticate().await {
            warn!(error = %err, "upload gateway authentication failed");
            presenter.show_warning(&format!(
                "Could not connect to answer storage: {err}. Your answers may not be saved."
            ));
        }

        let (actions_tx, actions) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let runner = SessionRunner {
            session: OverlaySession::new(context, player, presenter, uploads),
            feed,
            actions,
            events,
            poll_interval: self.settings.poll_interval(),
            clock: self.clock,
        };
        let handle = SessionHandle {
            actions: actions_tx,
            events: events_tx,
        };
        (runner, handle)
    }
}

/// Drives one session: the polling timer, viewer input, player events and
/// upload notifications, all on a single task.
pub struct SessionRunner {
    session: OverlaySession,
    feed: UploadFeed,
    actions: mpsc::UnboundedReceiver<ViewerAction>,
    events: mpsc::UnboundedReceiver<PlayerEvent>,
    poll_interval: Duration,
    clock: Clock,
}

impl SessionRunner {
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        self.session.context()
    }

    /// Run until the viewer leaves, then wait for outstanding uploads.
    ///
    /// Viewer-facing failures are reported through the presenter and the
    /// loop keeps polling.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for programming-error conditions (a ledger index
    /// out of bounds, a question outside the schedule) or if an upload task
    /// panicked.
    pub async fn run(self) -> Result<SessionReport, SessionError> {
        let context = self.session.context();
        let span = info_span!(
            "overlay_session",
            session = %context.id(),
            ivideo = %context.ivideo(),
            viewer = %context.viewer(),
        );
        self.drive().instrument(span).await
    }

    async fn drive(self) -> Result<SessionReport, SessionError> {
        let Self {
            mut session,
            mut feed,
            mut actions,
            mut events,
            poll_interval,
            clock,
        } = self;

        let started_at = clock.now();
        info!(questions = session.context().schedule().len(), "session started");

        let sleep = time::sleep(poll_interval);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => {
                    if let Err(err) = session.tick() {
                        escalate(&mut session, err)?;
                    }
                    // Fixed delay: the next tick is scheduled after this one completes.
                    sleep.as_mut().reset(Instant::now() + poll_interval);
                }
                action = actions.recv() => match action {
                    None | Some(ViewerAction::Leave) => break,
                    Some(action) => {
                        if let Err(err) = apply(&mut session, action) {
                            escalate(&mut session, err)?;
                        }
                    }
                },
                Some(event) = events.recv() => session.handle_player_event(event),
                Some(progress) = feed.progress.recv() => session.report_upload_progress(&progress),
                Some(outcome) = feed.finished.recv() => session.report_upload_outcome(&outcome),
            }
        }

        info!(pending = session.pending_uploads(), "viewer left; waiting for uploads");
        let (context, uploads) = session.finish().await?;
        let report = SessionReport {
            session_id: context.id(),
            ivideo: context.ivideo().clone(),
            viewer: context.viewer().clone(),
            answers: context.ledger().snapshot(),
            shown: context.shown().to_vec(),
            cursor: context.cursor().value(),
            uploads,
            started_at,
            ended_at: clock.now(),
        };
        info!(
            answered = report.answered().len(),
            shown = report.shown.len(),
            failed_uploads = report.failed_uploads(),
            "session finished"
        );
        Ok(report)
    }
}

fn apply(session: &mut OverlaySession, action: ViewerAction) -> Result<(), SessionError> {
    match action {
        ViewerAction::Select(option) => session.select(&option),
        ViewerAction::Submit => session.on_submit(),
        ViewerAction::Dismiss => session.on_dismiss(),
        ViewerAction::Leave => Ok(()),
    }
}

/// Fatal errors end the loop; everything else is shown to the viewer.
fn escalate(session: &mut OverlaySession, err: SessionError) -> Result<(), SessionError> {
    if err.is_fatal() {
        error!(error = %err, "session aborted");
        return Err(err);
    }
    session.report_rejected(&err);
    Ok(())
}
