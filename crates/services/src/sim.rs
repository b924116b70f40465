//! Simulated collaborators for local runs and tests.
//!
//! `SimulatedPlayer` advances its position with `tokio::time`, so a paused
//! test clock drives playback deterministically. `RecordingPresenter` keeps
//! every instruction it receives and can stream them to a subscriber.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ivideo_core::PlaybackPosition;
use ivideo_core::model::ViewerIdError;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::player::PlaybackEngine;
use crate::presenter::Presenter;

//
// ─── PLAYER ────────────────────────────────────────────────────────────────────
//

/// A command the overlay issued to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
    ToggleControls,
    EnterFullscreen,
    ExitFullscreen,
    LockLandscape,
}

#[derive(Debug)]
struct PlayerState {
    ready: bool,
    playing: bool,
    /// Position at `anchored_at`.
    anchor: f64,
    anchored_at: Instant,
    speed: f64,
    duration: f64,
    controls_visible: bool,
    fullscreen: bool,
    commands: Vec<PlayerCommand>,
}

impl PlayerState {
    fn position_secs(&self) -> f64 {
        let elapsed = if self.playing {
            self.anchored_at.elapsed().as_secs_f64() * self.speed
        } else {
            0.0
        };
        (self.anchor + elapsed).min(self.duration)
    }

    fn reanchor(&mut self) {
        self.anchor = self.position_secs();
        self.anchored_at = Instant::now();
    }
}

/// A video that plays in `tokio` time.
///
/// Clones share the same playback state, so a test can keep one clone to
/// seek and inspect while the session owns another.
#[derive(Clone, Debug)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl SimulatedPlayer {
    /// A player for a video of `duration` seconds, ready and paused at 0.
    #[must_use]
    pub fn new(duration: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState {
                ready: true,
                playing: false,
                anchor: 0.0,
                anchored_at: Instant::now(),
                speed: 1.0,
                duration: duration.max(0.0),
                controls_visible: true,
                fullscreen: false,
                commands: Vec::new(),
            })),
        }
    }

    /// Playback rate; `2.0` plays twice as fast as the clock.
    #[must_use]
    pub fn with_speed(self, speed: f64) -> Self {
        {
            let mut state = self.lock();
            state.reanchor();
            state.speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// While not ready the player reports no position, like media still loading.
    pub fn set_ready(&self, ready: bool) {
        let mut state = self.lock();
        state.reanchor();
        state.ready = ready;
    }

    /// Start playback without recording a command (the viewer pressed play).
    pub fn start(&self) {
        let mut state = self.lock();
        state.reanchor();
        state.playing = true;
    }

    /// Jump to `secs`, keeping the play/pause state.
    pub fn seek(&self, secs: f64) {
        let mut state = self.lock();
        state.anchor = secs.clamp(0.0, state.duration);
        state.anchored_at = Instant::now();
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.lock().fullscreen
    }

    #[must_use]
    pub fn controls_visible(&self) -> bool {
        self.lock().controls_visible
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        let state = self.lock();
        state.position_secs() >= state.duration
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.lock().duration
    }

    #[must_use]
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.lock().commands.clone()
    }

    fn record(&self, command: PlayerCommand, apply: impl FnOnce(&mut PlayerState)) {
        let mut state = self.lock();
        apply(&mut state);
        state.commands.push(command);
    }
}

impl PlaybackEngine for SimulatedPlayer {
    fn position(&self) -> PlaybackPosition {
        let state = self.lock();
        if !state.ready {
            return PlaybackPosition::NotReady;
        }
        PlaybackPosition::from_secs(state.position_secs())
    }

    fn play(&mut self) {
        self.record(PlayerCommand::Play, |state| {
            state.reanchor();
            state.playing = true;
        });
    }

    fn pause(&mut self) {
        self.record(PlayerCommand::Pause, |state| {
            state.reanchor();
            state.playing = false;
        });
    }

    fn toggle_controls(&mut self) {
        self.record(PlayerCommand::ToggleControls, |state| {
            state.controls_visible = !state.controls_visible;
        });
    }

    fn enter_fullscreen(&mut self) {
        self.record(PlayerCommand::EnterFullscreen, |state| state.fullscreen = true);
    }

    fn exit_fullscreen(&mut self) {
        self.record(PlayerCommand::ExitFullscreen, |state| state.fullscreen = false);
    }

    fn lock_landscape(&mut self) {
        self.record(PlayerCommand::LockLandscape, |_| {});
    }
}

//
// ─── PRESENTER ─────────────────────────────────────────────────────────────────
//

/// An instruction the overlay gave the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Question { prompt: String, options: Vec<String> },
    Cleared,
    SubmitEnabled(bool),
    UploadProgress(u8),
    Warning(String),
    IdentifierError(ViewerIdError),
}

#[derive(Debug, Default)]
struct PresenterLog {
    events: Vec<PresenterEvent>,
    subscriber: Option<mpsc::UnboundedSender<PresenterEvent>>,
}

/// Presenter that records instead of drawing.
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    log: Arc<Mutex<PresenterLog>>,
}

impl RecordingPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream every following event to the returned receiver.
    ///
    /// Replaces any earlier subscriber.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PresenterEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscriber = Some(tx);
        rx
    }

    #[must_use]
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.lock().events.clone()
    }

    /// Prompts rendered so far, in order.
    #[must_use]
    pub fn rendered_prompts(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Question { prompt, .. } => Some(prompt.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Warning(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, PresenterLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: PresenterEvent) {
        let mut log = self.lock();
        let delivered = log
            .subscriber
            .as_ref()
            .map(|subscriber| subscriber.send(event.clone()).is_ok());
        if delivered == Some(false) {
            log.subscriber = None;
        }
        log.events.push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn render_question(&mut self, prompt: &str, options: &[String]) {
        self.push(PresenterEvent::Question {
            prompt: prompt.to_string(),
            options: options.to_vec(),
        });
    }

    fn clear_question(&mut self) {
        self.push(PresenterEvent::Cleared);
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.push(PresenterEvent::SubmitEnabled(enabled));
    }

    fn show_upload_progress(&mut self, percent: u8) {
        self.push(PresenterEvent::UploadProgress(percent));
    }

    fn show_warning(&mut self, message: &str) {
        self.push(PresenterEvent::Warning(message.to_string()));
    }

    fn show_identifier_error(&mut self, error: &ViewerIdError) {
        self.push(PresenterEvent::IdentifierError(error.clone()));
    }
}
