mod ids;
mod ledger;
pub mod manifest;
mod question;
mod settings;
mod submission;
mod viewer;

pub use ids::{IVideoId, IdError, SessionId};
pub use ledger::{AnswerLedger, LedgerError};
pub use manifest::{IVideoManifest, ManifestError};
pub use question::{QuestionError, QuestionSchedule, QuestionSpec};
pub use settings::{
    DEFAULT_POLL_INTERVAL, DEFAULT_SAVE_DIR, DEFAULT_SETTLE_THRESHOLD_SECS,
    DEFAULT_TRIGGER_THRESHOLD_SECS, OverlaySettings, SettingsError,
};
pub use submission::{SUBMISSION_CONTENT_TYPE, SubmissionRecord, storage_key};
pub use viewer::{PHONE_DIGITS, ViewerId, ViewerIdError, ViewerIdKind};
