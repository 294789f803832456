//! Evaluation clock — the single source of "now" for expiry and streaks.
//!
//! Derived state (reward status, challenge status, streaks) is always a
//! pure function of stored fields plus the instant supplied here. Nothing
//! in the core caches a derived status.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `now()` in UTC. Streak arithmetic is calendar-day
    /// based, not 24-hour-interval based.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time. The production default.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an explicit instant, stepped manually.
/// Used by tests and the demo runner.
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn advance_days(&self, days: i64) {
        let mut instant = self.instant.lock().unwrap();
        *instant += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap()
    }
}
