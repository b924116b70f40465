use thiserror::Error;

use crate::model::{IdError, ManifestError, QuestionError, SettingsError, ViewerIdError};
use crate::overlay::OverlayError;

/// Any error raised while setting up or driving a session's domain state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Viewer(#[from] ViewerIdError),
    #[error(transparent)]
    Overlay(#[from] OverlayError),
}
