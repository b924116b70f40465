use crate::model::QuestionSchedule;
use crate::overlay::OverlayState;
use crate::time::PlaybackPosition;

/// Slack for float noise when comparing a sampled position against a window edge.
const WINDOW_EPSILON: f64 = 1e-9;

//
// ─── DECISION ──────────────────────────────────────────────────────────────────
//

/// What a single poll of the playback position asks the overlay to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    None,
    Show(usize),
}

//
// ─── CURSOR ────────────────────────────────────────────────────────────────────
//

/// Index of the next question that has not fired yet.
///
/// Equal to the schedule length once every question has fired or been
/// skipped. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TriggerCursor(usize);

impl TriggerCursor {
    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }

    fn advance_to(&mut self, next: usize) {
        self.0 = self.0.max(next);
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Maps sampled playback positions to "show question `i` now".
///
/// Question `i` is due when `trigger_time[i] - position` is in `(0, threshold]`:
/// playback is approaching the mark and is close enough that the next sample
/// might already be past it. A sample at or beyond a mark skips that question
/// for good, and every question fires at most once regardless of later seeks.
///
/// # Examples
///
/// ```
/// # use ivideo_core::model::{QuestionSchedule, QuestionSpec};
/// # use ivideo_core::overlay::OverlayState;
/// # use ivideo_core::scheduler::{TriggerDecision, TriggerScheduler};
/// # use ivideo_core::PlaybackPosition;
/// let schedule = QuestionSchedule::new(vec![
///     QuestionSpec::new(2.0, "q1", vec!["a".into()]),
/// ])?;
/// let mut scheduler = TriggerScheduler::new(&schedule, 0.8);
/// let hidden = OverlayState::Hidden;
///
/// assert_eq!(scheduler.poll(PlaybackPosition::At(1.0), &hidden), TriggerDecision::None);
/// assert_eq!(scheduler.poll(PlaybackPosition::At(1.5), &hidden), TriggerDecision::Show(0));
/// assert!(scheduler.is_exhausted());
/// # Ok::<(), ivideo_core::model::QuestionError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerScheduler {
    trigger_times: Vec<f64>,
    threshold: f64,
    cursor: TriggerCursor,
}

impl TriggerScheduler {
    #[must_use]
    pub fn new(schedule: &QuestionSchedule, threshold: f64) -> Self {
        Self {
            trigger_times: schedule
                .questions()
                .iter()
                .map(|q| q.trigger_time())
                .collect(),
            threshold,
            cursor: TriggerCursor::default(),
        }
    }

    /// Decide whether a question should appear at `position`.
    ///
    /// Returns `TriggerDecision::None` without looking at the position while
    /// a question is already up, or when the player is not ready yet.
    pub fn poll(&mut self, position: PlaybackPosition, overlay: &OverlayState) -> TriggerDecision {
        if !overlay.is_hidden() {
            return TriggerDecision::None;
        }
        let Some(position) = position.secs() else {
            return TriggerDecision::None;
        };

        // Marks already reached are skipped, never shown late. Past the last
        // mark this leaves the cursor exhausted.
        let passed = self
            .trigger_times
            .iter()
            .skip(self.cursor.value())
            .take_while(|time| **time <= position)
            .count();
        self.cursor.advance_to(self.cursor.value() + passed);

        let index = self.cursor.value();
        let Some(time) = self.trigger_times.get(index) else {
            return TriggerDecision::None;
        };
        let lead = time - position;
        if lead > 0.0 && lead <= self.threshold + WINDOW_EPSILON {
            self.cursor.advance_to(index + 1);
            return TriggerDecision::Show(index);
        }
        TriggerDecision::None
    }

    /// Record that question `index` was shown, so it can never fire again.
    pub fn mark_fired(&mut self, index: usize) {
        self.cursor.advance_to(index + 1);
    }

    #[must_use]
    pub fn cursor(&self) -> TriggerCursor {
        self.cursor
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor.value() >= self.trigger_times.len()
    }
}

//
// ─── SETTLE GUARD ──────────────────────────────────────────────────────────────
//

/// Holds triggering off right after playback resumes from a question.
///
/// Released once playback has moved more than `threshold` seconds past the
/// resume point, or has been sought back before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleGuard {
    resumed_at: f64,
    threshold: f64,
}

impl SettleGuard {
    #[must_use]
    pub fn new(resumed_at: f64, threshold: f64) -> Self {
        Self {
            resumed_at,
            threshold,
        }
    }

    /// Returns true while triggering should stay off.
    #[must_use]
    pub fn holds(&self, position: PlaybackPosition) -> bool {
        match position.secs() {
            None => true,
            Some(position) => {
                let moved = position - self.resumed_at;
                (0.0..=self.threshold).contains(&moved)
            }
        }
    }
}
