use thiserror::Error;

use crate::model::{LedgerError, QuestionSpec};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OverlayError {
    #[error("no question is awaiting an answer")]
    NotAwaiting,

    #[error("question {index} is already awaiting an answer")]
    AlreadyAwaiting { index: usize },

    #[error("question {index} is not in the schedule")]
    UnknownQuestion { index: usize },

    #[error("no option selected")]
    NoSelection,

    #[error("{option:?} is not an option of question {index}")]
    UnknownOption { index: usize, option: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// The question currently blocking playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    index: usize,
    selection: Option<String>,
}

impl PendingQuestion {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The option the viewer has picked so far, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }
}

/// Whether a question overlay is up.
///
/// There is exactly one per session, so at most one question can await an
/// answer at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverlayState {
    #[default]
    Hidden,
    AwaitingAnswer(PendingQuestion),
}

impl OverlayState {
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingQuestion> {
        match self {
            Self::Hidden => None,
            Self::AwaitingAnswer(pending) => Some(pending),
        }
    }

    /// Hidden → AwaitingAnswer for question `index`.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::AlreadyAwaiting` if another question is up.
    pub fn show(&mut self, index: usize) -> Result<(), OverlayError> {
        if let Self::AwaitingAnswer(pending) = self {
            return Err(OverlayError::AlreadyAwaiting {
                index: pending.index,
            });
        }
        *self = Self::AwaitingAnswer(PendingQuestion {
            index,
            selection: None,
        });
        Ok(())
    }

    /// Record the viewer's current pick for the pending question.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::NotAwaiting` when hidden, or
    /// `OverlayError::UnknownOption` if `option` was not rendered for `question`.
    pub fn select(&mut self, question: &QuestionSpec, option: &str) -> Result<(), OverlayError> {
        let Self::AwaitingAnswer(pending) = self else {
            return Err(OverlayError::NotAwaiting);
        };
        if !question.has_option(option) {
            return Err(OverlayError::UnknownOption {
                index: pending.index,
                option: option.to_string(),
            });
        }
        pending.selection = Some(option.to_string());
        Ok(())
    }

    /// AwaitingAnswer → Hidden, returning the question that was up.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::NotAwaiting` if nothing was shown.
    pub fn resolve(&mut self) -> Result<PendingQuestion, OverlayError> {
        match std::mem::take(self) {
            Self::Hidden => Err(OverlayError::NotAwaiting),
            Self::AwaitingAnswer(pending) => Ok(pending),
        }
    }
}
