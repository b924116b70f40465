mod identity;
mod overlay;
mod service;
mod submission;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use identity::capture_viewer;
pub use service::OverlaySession;
pub use workflow::{SessionHandle, SessionLoopService, SessionReport, SessionRunner, ViewerAction};
