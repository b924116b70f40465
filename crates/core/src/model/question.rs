use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question schedule cannot be empty")]
    EmptySchedule,

    #[error("question {index} has no options")]
    NoOptions { index: usize },

    #[error("question {index} has an empty prompt")]
    EmptyPrompt { index: usize },

    #[error("question {index} has an invalid trigger time: {time}")]
    InvalidTriggerTime { index: usize, time: f64 },

    #[error("trigger times must be strictly increasing: question {index} at {time}s follows {previous}s")]
    NotAscending {
        index: usize,
        time: f64,
        previous: f64,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question overlaid on the video at `trigger_time` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    trigger_time: f64,
    prompt: String,
    options: Vec<String>,
}

impl QuestionSpec {
    #[must_use]
    pub fn new(trigger_time: f64, prompt: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            trigger_time,
            prompt: prompt.into(),
            options,
        }
    }

    #[must_use]
    pub fn trigger_time(&self) -> f64 {
        self.trigger_time
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

//
// ─── SCHEDULE ──────────────────────────────────────────────────────────────────
//

/// The ordered, validated set of questions for one video.
///
/// A question's index is its position in the schedule. Trigger times are
/// strictly increasing and the schedule never changes after a session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSchedule {
    questions: Vec<QuestionSpec>,
}

impl QuestionSchedule {
    /// Validate questions into a schedule.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the list is empty, a trigger time is negative
    /// or not finite, times are not strictly increasing, a prompt is blank, or
    /// a question has no options.
    pub fn new(questions: Vec<QuestionSpec>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptySchedule);
        }

        let mut previous: Option<f64> = None;
        for (index, question) in questions.iter().enumerate() {
            let time = question.trigger_time;
            if !time.is_finite() || time < 0.0 {
                return Err(QuestionError::InvalidTriggerTime { index, time });
            }
            if let Some(previous) = previous {
                if time <= previous {
                    return Err(QuestionError::NotAscending {
                        index,
                        time,
                        previous,
                    });
                }
            }
            if question.prompt.trim().is_empty() {
                return Err(QuestionError::EmptyPrompt { index });
            }
            if question.options.is_empty() {
                return Err(QuestionError::NoOptions { index });
            }
            previous = Some(time);
        }

        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QuestionSpec> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionSpec] {
        &self.questions
    }

    /// Trigger time of the last question.
    #[must_use]
    pub fn last_trigger_time(&self) -> f64 {
        self.questions.last().map_or(0.0, QuestionSpec::trigger_time)
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.prompt.clone()).collect()
    }

    #[must_use]
    pub fn option_sets(&self) -> Vec<Vec<String>> {
        self.questions.iter().map(|q| q.options.clone()).collect()
    }
}
