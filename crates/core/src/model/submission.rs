use serde::{Deserialize, Serialize};

use crate::model::{AnswerLedger, IVideoId, QuestionSchedule, ViewerId};

/// Content type of the uploaded answer document.
pub const SUBMISSION_CONTENT_TYPE: &str = "application/json";

/// Snapshot of a session's answers, handed to the upload gateway.
///
/// Serializes to `{ "answers": [...], "questions": [...], "options": [[...]] }`
/// with all three arrays aligned by question order. Unanswered slots are `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    answers: Vec<Option<String>>,
    questions: Vec<String>,
    options: Vec<Vec<String>>,
}

impl SubmissionRecord {
    #[must_use]
    pub fn build(ledger: &AnswerLedger, schedule: &QuestionSchedule) -> Self {
        Self {
            answers: ledger.snapshot(),
            questions: schedule.prompts(),
            options: schedule.option_sets(),
        }
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    #[must_use]
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    #[must_use]
    pub fn options(&self) -> &[Vec<String>] {
        &self.options
    }

    /// Serialize to the persisted UTF-8 JSON body.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse a persisted JSON body.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the body is not a valid record.
    pub fn from_json_bytes(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Storage key for a viewer's answers: `<save_dir>/<ivideo>_<viewer>.json`.
///
/// The key is stable for the session, so every submission overwrites the
/// previous upload with the full ledger.
#[must_use]
pub fn storage_key(save_dir: &str, ivideo: &IVideoId, viewer: &ViewerId) -> String {
    format!("{save_dir}/{ivideo}_{viewer}.json")
}
