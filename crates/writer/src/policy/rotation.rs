use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime};
use std::fmt;
use std::time::Duration;

/// What a rotation policy gets to look at
#[derive(Debug, Clone, Copy)]
pub struct ActiveFileState {
    /// Bytes in the active file, including anything still buffered
    pub size: u64,
    /// When the active file was opened or last rotated
    pub opened_at: DateTime<Local>,
    pub now: DateTime<Local>,
}

/// Decides when the active file is rolled over
pub trait RotationPolicy: Send + Sync + fmt::Debug {
    fn should_rotate(&self, state: &ActiveFileState) -> bool;
}

/// Rotate once the file reaches `max_bytes`
#[derive(Debug, Clone, Copy)]
pub struct SizeLimitRotation {
    pub max_bytes: u64,
}

impl RotationPolicy for SizeLimitRotation {
    fn should_rotate(&self, state: &ActiveFileState) -> bool {
        state.size >= self.max_bytes
    }
}

/// Rotate once the file has been open for `max_age`
#[derive(Debug, Clone, Copy)]
pub struct TimeLimitRotation {
    pub max_age: Duration,
}

impl RotationPolicy for TimeLimitRotation {
    fn should_rotate(&self, state: &ActiveFileState) -> bool {
        let age = state.now.signed_duration_since(state.opened_at);
        age.to_std().is_ok_and(|age| age >= self.max_age)
    }
}

/// Rotate at fixed local times of day, e.g. midnight
#[derive(Debug, Clone)]
pub struct FixedTimeRotation {
    times: Vec<NaiveTime>,
}

impl FixedTimeRotation {
    pub fn new(times: impl IntoIterator<Item = NaiveTime>) -> Self {
        Self {
            times: times.into_iter().collect(),
        }
    }

    pub fn midnight() -> Self {
        Self::new([NaiveTime::MIN])
    }
}

impl RotationPolicy for FixedTimeRotation {
    fn should_rotate(&self, state: &ActiveFileState) -> bool {
        let now = state.now.naive_local();
        let opened = state.opened_at.naive_local();
        self.times.iter().any(|time| {
            let today = now.date().and_time(*time);
            let last = if today <= now {
                today
            } else {
                today - ChronoDuration::days(1)
            };
            last > opened
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, h, m, 0).unwrap()
    }

    fn state(size: u64, opened_at: DateTime<Local>, now: DateTime<Local>) -> ActiveFileState {
        ActiveFileState {
            size,
            opened_at,
            now,
        }
    }

    #[test]
    fn test_size_limit() {
        let policy = SizeLimitRotation { max_bytes: 100 };
        assert!(!policy.should_rotate(&state(99, at(1, 0), at(1, 0))));
        assert!(policy.should_rotate(&state(100, at(1, 0), at(1, 0))));
    }

    #[test]
    fn test_time_limit() {
        let policy = TimeLimitRotation {
            max_age: Duration::from_secs(3600),
        };
        assert!(!policy.should_rotate(&state(0, at(1, 0), at(1, 59))));
        assert!(policy.should_rotate(&state(0, at(1, 0), at(2, 0))));
        // clock moved backwards
        assert!(!policy.should_rotate(&state(0, at(2, 0), at(1, 0))));
    }

    #[test]
    fn test_fixed_time_crossed_since_open() {
        let policy = FixedTimeRotation::new([NaiveTime::from_hms_opt(12, 0, 0).unwrap()]);
        assert!(!policy.should_rotate(&state(0, at(9, 0), at(11, 59))));
        assert!(policy.should_rotate(&state(0, at(9, 0), at(12, 0))));
        assert!(!policy.should_rotate(&state(0, at(12, 30), at(13, 0))));
    }

    #[test]
    fn test_fixed_time_midnight_uses_previous_day() {
        let policy = FixedTimeRotation::midnight();
        let yesterday = Local.with_ymd_and_hms(2026, 6, 14, 23, 0, 0).unwrap();
        assert!(policy.should_rotate(&state(0, yesterday, at(0, 5))));
        assert!(!policy.should_rotate(&state(0, at(0, 1), at(0, 5))));
    }
}
