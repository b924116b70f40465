use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("answer index {index} is outside the schedule of {len} questions")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Index-aligned answers for one session.
///
/// Always holds exactly one slot per scheduled question; a slot stays `None`
/// until the viewer submits an answer for that question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerLedger {
    answers: Vec<Option<String>>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            answers: vec![None; len],
        }
    }

    /// Record the answer for question `index`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::IndexOutOfBounds` if `index` is not a scheduled question.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> Result<(), LedgerError> {
        let len = self.answers.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(LedgerError::IndexOutOfBounds { index, len })?;
        *slot = Some(value.into());
        Ok(())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    /// Copy of every slot, in question order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Option<String>> {
        self.answers.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_schedule_length() {
        let mut ledger = AnswerLedger::new(3);
        assert_eq!(ledger.snapshot(), vec![None, None, None]);

        ledger.set(0, "o2").unwrap();
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].as_deref(), Some("o2"));
        assert_eq!(ledger.answered_count(), 1);
    }

    #[test]
    fn out_of_bounds_set_is_rejected() {
        let mut ledger = AnswerLedger::new(2);
        assert_eq!(
            ledger.set(2, "x"),
            Err(LedgerError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(ledger.snapshot(), vec![None, None]);
    }
}
