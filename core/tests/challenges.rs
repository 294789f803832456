use chrono::Duration;
use roomies_core::challenge::{ChallengeSpec, ChallengeStatus, CompletionCriteria, JoinBlock};
use roomies_core::clock::{Clock, FixedClock};
use roomies_core::engine::GameEngine;
use roomies_core::error::GameError;
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

fn spec(criteria: CompletionCriteria, point_reward: i64) -> ChallengeSpec {
    ChallengeSpec {
        title: "Sprint".to_string(),
        description: String::new(),
        point_reward,
        due_date: None,
        max_participants: None,
        criteria,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

/// Boundary of the points criterion: 49 is not 50.
#[test]
fn points_criterion_completes_exactly_at_threshold() {
    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Points { amount: 50 }, 75))
        .unwrap();

    engine.adjust_points(&user, 49, "seed").unwrap();
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();
    assert!(!engine
        .store()
        .challenge_completed_by(&challenge.challenge_id, &user)
        .unwrap());

    engine.adjust_points(&user, 1, "one more").unwrap();

    assert!(engine
        .store()
        .challenge_completed_by(&challenge.challenge_id, &user)
        .unwrap());
    // 49 + 1 + the 75-point completion reward
    assert_eq!(engine.user(&user).unwrap().stats.points, 125);
}

#[test]
fn tasks_criterion_counts_the_week() {
    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Tasks { count: 3 }, 30))
        .unwrap();
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();

    engine.complete_task(&household, &user, "Sweep", 5).unwrap();
    engine.complete_task(&household, &user, "Dishes", 5).unwrap();
    assert!(!engine
        .store()
        .challenge_completed_by(&challenge.challenge_id, &user)
        .unwrap());

    let outcome = engine.complete_task(&household, &user, "Trash", 5).unwrap();

    assert!(outcome
        .challenges_completed
        .contains(&challenge.challenge_id));
    assert_eq!(engine.user(&user).unwrap().stats.points, 45);
}

#[test]
fn streak_criterion_needs_consecutive_days() {
    let (engine, clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Streak { days: 2 }, 20))
        .unwrap();
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();

    engine.complete_task(&household, &user, "Sweep", 5).unwrap();
    assert!(!engine
        .store()
        .challenge_completed_by(&challenge.challenge_id, &user)
        .unwrap());

    clock.advance_days(1);
    let outcome = engine.complete_task(&household, &user, "Dishes", 5).unwrap();

    assert!(outcome
        .challenges_completed
        .contains(&challenge.challenge_id));
}

#[test]
fn full_challenge_rejects_joiners() {
    let (engine, _clock, household, user) = setup();
    let other = engine.create_user("Blake").unwrap();
    engine.join_household(&household, &other.user_id, "member").unwrap();
    let challenge = engine
        .create_challenge(
            &household,
            ChallengeSpec {
                max_participants: Some(1),
                ..spec(CompletionCriteria::Points { amount: 500 }, 10)
            },
        )
        .unwrap();

    engine.join_challenge(&user, &challenge.challenge_id).unwrap();
    let err = engine
        .join_challenge(&other.user_id, &challenge.challenge_id)
        .unwrap_err();

    assert!(matches!(
        err,
        GameError::CannotJoin {
            reason: JoinBlock::Full,
            ..
        }
    ));
    assert_eq!(
        engine.challenge_status(&challenge.challenge_id).unwrap(),
        ChallengeStatus::Full
    );
}

#[test]
fn expired_challenge_rejects_joiners() {
    let (engine, clock, household, user) = setup();
    let challenge = engine
        .create_challenge(
            &household,
            ChallengeSpec {
                due_date: Some(clock.now() + Duration::days(1)),
                ..spec(CompletionCriteria::Points { amount: 10 }, 10)
            },
        )
        .unwrap();

    clock.advance_days(2);
    let err = engine.join_challenge(&user, &challenge.challenge_id).unwrap_err();

    assert!(matches!(
        err,
        GameError::CannotJoin {
            reason: JoinBlock::Expired,
            ..
        }
    ));
}

#[test]
fn double_join_is_rejected() {
    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Points { amount: 500 }, 10))
        .unwrap();

    engine.join_challenge(&user, &challenge.challenge_id).unwrap();
    let err = engine.join_challenge(&user, &challenge.challenge_id).unwrap_err();

    assert!(matches!(
        err,
        GameError::CannotJoin {
            reason: JoinBlock::AlreadyJoined,
            ..
        }
    ));
}

#[test]
fn deactivated_challenge_rejects_joiners() {
    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Points { amount: 10 }, 10))
        .unwrap();
    engine
        .store()
        .set_challenge_active(&challenge.challenge_id, false)
        .unwrap();

    let err = engine.join_challenge(&user, &challenge.challenge_id).unwrap_err();

    assert!(matches!(
        err,
        GameError::CannotJoin {
            reason: JoinBlock::Inactive,
            ..
        }
    ));
}

/// The completion reward is paid exactly once, however much the user
/// keeps doing afterwards.
#[test]
fn completion_pays_exactly_once() {
    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Points { amount: 10 }, 100))
        .unwrap();
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();

    engine.adjust_points(&user, 10, "seed").unwrap();
    assert_eq!(engine.user(&user).unwrap().stats.points, 110);

    engine.complete_task(&household, &user, "Sweep", 5).unwrap();

    // Only the task points; no second payout.
    assert_eq!(engine.user(&user).unwrap().stats.points, 115);
}

#[test]
fn leaving_before_completion_works_once() {
    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Points { amount: 500 }, 10))
        .unwrap();
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();

    engine.leave_challenge(&user, &challenge.challenge_id).unwrap();
    assert!(!engine
        .store()
        .is_participant(&challenge.challenge_id, &user)
        .unwrap());

    let err = engine.leave_challenge(&user, &challenge.challenge_id).unwrap_err();
    assert!(matches!(err, GameError::NotFound { .. }));

    // Rejoining after a voluntary leave is allowed.
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();
}

/// Expiry is checked lazily at evaluation time: a participant who only
/// reaches the threshold after the due date gets nothing.
#[test]
fn expired_challenge_never_completes() {
    let (engine, clock, household, user) = setup();
    let challenge = engine
        .create_challenge(
            &household,
            ChallengeSpec {
                due_date: Some(clock.now() + Duration::days(1)),
                ..spec(CompletionCriteria::Points { amount: 50 }, 100)
            },
        )
        .unwrap();
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();

    clock.advance_days(2);
    engine.adjust_points(&user, 60, "too late").unwrap();

    assert!(!engine
        .store()
        .challenge_completed_by(&challenge.challenge_id, &user)
        .unwrap());
    assert_eq!(engine.user(&user).unwrap().stats.points, 60);
}

#[test]
fn progress_mirrors_the_criterion() {
    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Points { amount: 200 }, 10))
        .unwrap();
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();

    engine.adjust_points(&user, 50, "seed").unwrap();

    let progress = engine
        .challenge_progress(&user, &challenge.challenge_id)
        .unwrap();
    assert_eq!(progress.current, 50);
    assert_eq!(progress.target, 200);
    assert_eq!(progress.percentage, 25);
}

// ── Criteria decoding ───────────────────────────────────────────────────────

#[test]
fn criteria_defaults_apply_when_fields_are_omitted() {
    let tasks: CompletionCriteria = serde_json::from_str(r#"{"type":"tasks"}"#).unwrap();
    assert_eq!(tasks, CompletionCriteria::Tasks { count: 1 });

    let points: CompletionCriteria = serde_json::from_str(r#"{"type":"points"}"#).unwrap();
    assert_eq!(points, CompletionCriteria::Points { amount: 100 });

    let streak: CompletionCriteria = serde_json::from_str(r#"{"type":"streak"}"#).unwrap();
    assert_eq!(streak, CompletionCriteria::Streak { days: 7 });
}

#[test]
fn unrecognized_criteria_decode_to_unknown_and_never_complete() {
    let unknown: CompletionCriteria = serde_json::from_str(r#"{"type":"bingo"}"#).unwrap();
    assert_eq!(unknown, CompletionCriteria::Unknown);

    let (engine, _clock, household, user) = setup();
    let challenge = engine
        .create_challenge(&household, spec(CompletionCriteria::Unknown, 10))
        .unwrap();
    assert_eq!(
        engine.challenge(&challenge.challenge_id).unwrap().criteria,
        CompletionCriteria::Unknown
    );
    engine.join_challenge(&user, &challenge.challenge_id).unwrap();

    engine.adjust_points(&user, 1000, "seed").unwrap();

    assert!(!engine
        .store()
        .challenge_completed_by(&challenge.challenge_id, &user)
        .unwrap());
    let progress = engine
        .challenge_progress(&user, &challenge.challenge_id)
        .unwrap();
    assert_eq!(progress.percentage, 0);
}
