use std::time::Duration;

use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("trigger threshold must be in (0, 5] seconds, got {0}")]
    InvalidTriggerThreshold(f64),

    #[error("settle threshold must be in (0, 5] seconds, got {0}")]
    InvalidSettleThreshold(f64),

    #[error("poll interval must be between 10ms and 5s, got {0:?}")]
    InvalidPollInterval(Duration),

    #[error("trigger threshold {threshold}s must be wider than the poll interval {poll_interval:?}")]
    ThresholdWithinPollInterval {
        threshold: f64,
        poll_interval: Duration,
    },

    #[error("save directory cannot be empty or start/end with '/'")]
    InvalidSaveDir,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

pub const MAX_THRESHOLD_SECS: f64 = 5.0;
pub const DEFAULT_TRIGGER_THRESHOLD_SECS: f64 = 0.8;
/// The settle window uses the trigger threshold unless configured separately.
pub const DEFAULT_SETTLE_THRESHOLD_SECS: f64 = DEFAULT_TRIGGER_THRESHOLD_SECS;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_SAVE_DIR: &str = "answers";

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Tunables for the overlay timing loop and the upload location.
///
/// - `trigger_threshold`: how far ahead of a question's timestamp it counts as due.
/// - `settle_threshold`: how far playback must move after a resume before
///   triggering is evaluated again.
/// - `poll_interval`: delay between position polls (fixed delay, re-armed after each poll).
/// - `save_dir`: storage prefix for uploaded answers.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySettings {
    trigger_threshold: f64,
    settle_threshold: f64,
    poll_interval: Duration,
    save_dir: String,
}

impl OverlaySettings {
    /// Creates custom overlay settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a threshold is outside `(0, 5]`, the poll
    /// interval is outside `10ms..=5s`, or the save directory is malformed.
    pub fn new(
        trigger_threshold: f64,
        settle_threshold: f64,
        poll_interval: Duration,
        save_dir: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        if !valid_threshold(trigger_threshold) {
            return Err(SettingsError::InvalidTriggerThreshold(trigger_threshold));
        }
        if !valid_threshold(settle_threshold) {
            return Err(SettingsError::InvalidSettleThreshold(settle_threshold));
        }
        if !(MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL).contains(&poll_interval) {
            return Err(SettingsError::InvalidPollInterval(poll_interval));
        }
        // A window no wider than one poll step can be jumped over between samples.
        if trigger_threshold <= poll_interval.as_secs_f64() {
            return Err(SettingsError::ThresholdWithinPollInterval {
                threshold: trigger_threshold,
                poll_interval,
            });
        }
        let save_dir = save_dir.into().trim().to_string();
        if save_dir.is_empty() || save_dir.starts_with('/') || save_dir.ends_with('/') {
            return Err(SettingsError::InvalidSaveDir);
        }

        Ok(Self {
            trigger_threshold,
            settle_threshold,
            poll_interval,
            save_dir,
        })
    }

    #[must_use]
    pub fn trigger_threshold(&self) -> f64 {
        self.trigger_threshold
    }

    #[must_use]
    pub fn settle_threshold(&self) -> f64 {
        self.settle_threshold
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn save_dir(&self) -> &str {
        &self.save_dir
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            trigger_threshold: DEFAULT_TRIGGER_THRESHOLD_SECS,
            settle_threshold: DEFAULT_SETTLE_THRESHOLD_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            save_dir: DEFAULT_SAVE_DIR.to_string(),
        }
    }
}

fn valid_threshold(value: f64) -> bool {
    value.is_finite() && value > 0.0 && value <= MAX_THRESHOLD_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let defaults = OverlaySettings::default();
        let rebuilt = OverlaySettings::new(
            defaults.trigger_threshold(),
            defaults.settle_threshold(),
            defaults.poll_interval(),
            defaults.save_dir(),
        )
        .unwrap();
        assert_eq!(rebuilt, defaults);
    }

    #[test]
    fn rejects_zero_threshold() {
        assert_eq!(
            OverlaySettings::new(0.0, 0.8, DEFAULT_POLL_INTERVAL, "answers"),
            Err(SettingsError::InvalidTriggerThreshold(0.0))
        );
    }

    #[test]
    fn rejects_tiny_poll_interval() {
        assert!(matches!(
            OverlaySettings::new(0.1, 0.8, Duration::from_millis(1), "answers"),
            Err(SettingsError::InvalidPollInterval(_))
        ));
    }

    #[test]
    fn rejects_slash_wrapped_save_dir() {
        assert_eq!(
            OverlaySettings::new(0.8, 0.8, DEFAULT_POLL_INTERVAL, "/answers"),
            Err(SettingsError::InvalidSaveDir)
        );
    }

    #[test]
    fn defaults_share_one_threshold_wider_than_a_poll_step() {
        let defaults = OverlaySettings::default();
        assert_eq!(defaults.trigger_threshold(), defaults.settle_threshold());
        assert!(defaults.trigger_threshold() > defaults.poll_interval().as_secs_f64());
    }

    #[test]
    fn rejects_threshold_not_wider_than_poll_interval() {
        assert_eq!(
            OverlaySettings::new(0.1, 0.8, DEFAULT_POLL_INTERVAL, "answers"),
            Err(SettingsError::ThresholdWithinPollInterval {
                threshold: 0.1,
                poll_interval: DEFAULT_POLL_INTERVAL,
            })
        );
        assert!(OverlaySettings::new(0.1, 0.8, Duration::from_millis(50), "answers").is_ok());
    }
}
