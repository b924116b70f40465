#![forbid(unsafe_code)]

pub mod error;
pub mod player;
pub mod presenter;
pub mod sessions;
pub mod sim;
pub mod upload;

pub use ivideo_core::Clock;
pub use sessions as session;

pub use error::SessionError;
pub use player::{PlaybackEngine, PlayerEvent};
pub use presenter::Presenter;
pub use upload::{UploadDispatcher, UploadFeed, UploadOutcome};

pub use sessions::{
    OverlaySession, SessionHandle, SessionLoopService, SessionReport, SessionRunner,
    ViewerAction, capture_viewer,
};
