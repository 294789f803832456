//! Streak computation over completed-task calendar days.
//!
//! A streak is the run of consecutive calendar days with at least one
//! completed task, counted backwards from today. A day with no activity
//! does not break the streak until a full calendar day has passed: if
//! today has nothing yet but yesterday does, yesterday still anchors the
//! run. Activity today after a gap restarts the streak at 1, whatever
//! value was stored before.
//!
//! Recomputation is a pure function of the day set and the evaluation
//! date, so calling it any number of times within a day is idempotent.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

pub struct StreakTracker;

impl StreakTracker {
    pub fn recompute(&self, completed_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
        let yesterday = today - Duration::days(1);
        let anchor = if completed_days.contains(&today) {
            today
        } else if completed_days.contains(&yesterday) {
            yesterday
        } else {
            return 0;
        };

        let mut streak = 0u32;
        let mut day = anchor;
        while completed_days.contains(&day) {
            streak += 1;
            day = day - Duration::days(1);
        }
        streak
    }
}
