use ivideo_core::PlaybackPosition;

/// Events the video player emits that the overlay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Play,
    EnterFullscreen,
    ExitFullscreen,
}

/// The video playback engine the overlay drives.
pub trait PlaybackEngine: Send {
    /// Current playback position; `NotReady` until the media has loaded.
    fn position(&self) -> PlaybackPosition;
    fn play(&mut self);
    fn pause(&mut self);
    /// Flip visibility of the transport controls.
    fn toggle_controls(&mut self);
    fn enter_fullscreen(&mut self);
    fn exit_fullscreen(&mut self);
    fn lock_landscape(&mut self);
}
