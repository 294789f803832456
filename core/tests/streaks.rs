use chrono::NaiveDate;
use roomies_core::clock::FixedClock;
use roomies_core::engine::GameEngine;
use roomies_core::streak::StreakTracker;
use std::collections::BTreeSet;
use std::sync::Arc;

// ── Test helpers ────────────────────────────────────────────────────────────

fn setup() -> (GameEngine, Arc<FixedClock>, String, String) {
    let (engine, clock) = GameEngine::build_test().unwrap();
    let household = engine.create_household("Test House").unwrap();
    let user = engine.create_user("Avery").unwrap();
    engine
        .join_household(&household.household_id, &user.user_id, "member")
        .unwrap();
    (engine, clock, household.household_id, user.user_id)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Engine-level scenarios ──────────────────────────────────────────────────

#[test]
fn first_completion_starts_a_streak() {
    let (engine, _clock, household, user) = setup();

    let outcome = engine.complete_task(&household, &user, "Sweep", 10).unwrap();

    assert_eq!(outcome.streak_days, 1);
}

#[test]
fn consecutive_days_increment_the_streak() {
    let (engine, clock, household, user) = setup();

    assert_eq!(
        engine.complete_task(&household, &user, "Sweep", 10).unwrap().streak_days,
        1
    );
    clock.advance_days(1);
    assert_eq!(
        engine.complete_task(&household, &user, "Dishes", 10).unwrap().streak_days,
        2
    );
    clock.advance_days(1);
    assert_eq!(
        engine.complete_task(&household, &user, "Trash", 5).unwrap().streak_days,
        3
    );
}

#[test]
fn multiple_completions_on_one_day_count_once() {
    let (engine, _clock, household, user) = setup();

    engine.complete_task(&household, &user, "Sweep", 10).unwrap();
    let outcome = engine.complete_task(&household, &user, "Dishes", 10).unwrap();

    assert_eq!(outcome.streak_days, 1);
}

/// Activity today after a gap restarts the streak at 1 — the stored
/// value from before the gap never carries over.
#[test]
fn gap_resets_the_streak_to_one() {
    let (engine, clock, household, user) = setup();

    engine.complete_task(&household, &user, "Sweep", 10).unwrap();
    clock.advance_days(1);
    let outcome = engine.complete_task(&household, &user, "Dishes", 10).unwrap();
    assert_eq!(outcome.streak_days, 2);

    clock.advance_days(3);
    let outcome = engine.complete_task(&household, &user, "Trash", 5).unwrap();
    assert_eq!(outcome.streak_days, 1);
}

// ── Pure recomputation ──────────────────────────────────────────────────────

#[test]
fn empty_history_is_zero() {
    let tracker = StreakTracker;
    assert_eq!(tracker.recompute(&BTreeSet::new(), day(2025, 6, 10)), 0);
}

/// Yesterday's activity still anchors the run when today has nothing
/// yet: the streak is not broken until a full day passes.
#[test]
fn yesterday_anchors_until_a_full_day_passes() {
    let tracker = StreakTracker;
    let days: BTreeSet<_> = [day(2025, 6, 8), day(2025, 6, 9)].into_iter().collect();

    assert_eq!(tracker.recompute(&days, day(2025, 6, 10)), 2);
}

#[test]
fn two_day_old_activity_reads_zero() {
    let tracker = StreakTracker;
    let days: BTreeSet<_> = [day(2025, 6, 7), day(2025, 6, 8)].into_iter().collect();

    assert_eq!(tracker.recompute(&days, day(2025, 6, 10)), 0);
}

#[test]
fn run_is_counted_from_today_backwards() {
    let tracker = StreakTracker;
    let days: BTreeSet<_> = [
        day(2025, 6, 2),
        day(2025, 6, 3),
        // gap on the 4th
        day(2025, 6, 5),
        day(2025, 6, 6),
        day(2025, 6, 7),
    ]
    .into_iter()
    .collect();

    assert_eq!(tracker.recompute(&days, day(2025, 6, 7)), 3);
}
