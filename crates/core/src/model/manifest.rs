use serde::Deserialize;
use thiserror::Error;

use crate::model::{QuestionError, QuestionSchedule, QuestionSpec};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("manifest video id cannot be empty")]
    MissingVideoId,

    #[error(transparent)]
    Schedule(#[from] QuestionError),
}

/// An interactive video document: the embedded video plus its question schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct IVideoManifest {
    video_id: String,
    schedule: QuestionSchedule,
}

impl IVideoManifest {
    /// Parse a manifest document.
    ///
    /// Expected shape:
    ///
    /// ```json
    /// { "video_id": "bTqVqk7FSmY",
    ///   "questions": { "questions": [
    ///     { "time": 2, "question": { "text": "q1", "options": ["o1", "o2"] } } ] } }
    /// ```
    ///
    /// Blank option strings are dropped since they are never rendered.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` if the JSON is malformed, the video id is blank,
    /// or the questions do not form a valid schedule.
    pub fn from_json(raw: &str) -> Result<Self, ManifestError> {
        let doc: ManifestDoc = serde_json::from_str(raw)?;
        let video_id = doc.video_id.trim().to_string();
        if video_id.is_empty() {
            return Err(ManifestError::MissingVideoId);
        }

        let questions = doc
            .questions
            .questions
            .into_iter()
            .map(|entry| {
                let options = entry
                    .question
                    .options
                    .into_iter()
                    .filter(|o| !o.trim().is_empty())
                    .collect();
                QuestionSpec::new(entry.time, entry.question.text, options)
            })
            .collect();

        Ok(Self {
            video_id,
            schedule: QuestionSchedule::new(questions)?,
        })
    }

    #[must_use]
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    #[must_use]
    pub fn schedule(&self) -> &QuestionSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn into_schedule(self) -> QuestionSchedule {
        self.schedule
    }
}

#[derive(Debug, Deserialize)]
struct ManifestDoc {
    video_id: String,
    questions: QuestionList,
}

#[derive(Debug, Deserialize)]
struct QuestionList {
    questions: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    time: f64,
    question: QuestionBody,
}

#[derive(Debug, Deserialize)]
struct QuestionBody {
    text: String,
    #[serde(default)]
    options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "video_id": "bTqVqk7FSmY",
        "questions": { "questions": [
            { "time": 2, "question": { "text": "q1", "options": ["o1", "o2"] } },
            { "time": 4, "question": { "text": "q2", "options": ["op1", "op2", "op3", "op4"] } },
            { "time": 6.0, "question": { "text": "q3", "options": ["opt1", "", "opt2", "opt3"] } }
        ] }
    }"#;

    #[test]
    fn parses_sample_manifest() {
        let manifest = IVideoManifest::from_json(SAMPLE).unwrap();
        assert_eq!(manifest.video_id(), "bTqVqk7FSmY");

        let schedule = manifest.schedule();
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.get(1).unwrap().trigger_time(), 4.0);
        assert_eq!(
            schedule.get(2).unwrap().options(),
            ["opt1", "opt2", "opt3"]
        );
    }

    #[test]
    fn rejects_out_of_order_questions() {
        let raw = r#"{ "video_id": "v", "questions": { "questions": [
            { "time": 4, "question": { "text": "q1", "options": ["a"] } },
            { "time": 2, "question": { "text": "q2", "options": ["b"] } }
        ] } }"#;
        assert!(matches!(
            IVideoManifest::from_json(raw),
            Err(ManifestError::Schedule(QuestionError::NotAscending { .. }))
        ));
    }

    #[test]
    fn rejects_question_with_only_blank_options() {
        let raw = r#"{ "video_id": "v", "questions": { "questions": [
            { "time": 1, "question": { "text": "q1", "options": ["", " "] } }
        ] } }"#;
        assert!(matches!(
            IVideoManifest::from_json(raw),
            Err(ManifestError::Schedule(QuestionError::NoOptions { index: 0 }))
        ));
    }

    #[test]
    fn rejects_blank_video_id() {
        let raw = r#"{ "video_id": " ", "questions": { "questions": [] } }"#;
        assert!(matches!(
            IVideoManifest::from_json(raw),
            Err(ManifestError::MissingVideoId)
        ));
    }
}
