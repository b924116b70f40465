use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic wall time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

/// A sampled playback position, in seconds from the start of the video.
///
/// Players report a position before the media is ready (usually NaN).
/// Such samples are kept as `NotReady` so callers re-poll instead of
/// treating them as a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackPosition {
    NotReady,
    At(f64),
}

impl PlaybackPosition {
    /// Classify a raw player sample.
    #[must_use]
    pub fn from_secs(raw: f64) -> Self {
        if raw.is_finite() && raw >= 0.0 {
            Self::At(raw)
        } else {
            Self::NotReady
        }
    }

    /// Returns the position in seconds, if the sample was usable.
    #[must_use]
    pub fn secs(self) -> Option<f64> {
        match self {
            Self::NotReady => None,
            Self::At(secs) => Some(secs),
        }
    }
}

impl From<f64> for PlaybackPosition {
    fn from(raw: f64) -> Self {
        Self::from_secs(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_and_negative_samples_are_not_ready() {
        assert_eq!(PlaybackPosition::from_secs(f64::NAN), PlaybackPosition::NotReady);
        assert_eq!(PlaybackPosition::from_secs(-1.0), PlaybackPosition::NotReady);
        assert_eq!(
            PlaybackPosition::from_secs(f64::INFINITY),
            PlaybackPosition::NotReady
        );
        assert_eq!(PlaybackPosition::from_secs(2.5).secs(), Some(2.5));
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(5));
    }
}
