use roomies_core::clock::FixedClock;
use roomies_core::engine::GameEngine;
use roomies_core::reward::RewardSpec;
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

// ── Tests ───────────────────────────────────────────────────────────────────

#[test]
fn feed_is_newest_first_with_strictly_increasing_ids() {
    let (engine, _clock, household, user) = setup();

    engine.complete_task(&household, &user, "Sweep", 10).unwrap();
    engine.complete_task(&household, &user, "Dishes", 10).unwrap();

    let feed = engine.store().activity_feed(&household, 100).unwrap();
    assert!(feed.len() >= 4);
    let ids: Vec<i64> = feed.iter().map(|e| e.id.unwrap()).collect();
    for pair in ids.windows(2) {
        assert!(pair[0] > pair[1], "feed not newest-first: {ids:?}");
    }
}

/// A task completion writes the full entry set in one transaction:
/// the completion itself, the credit, and the streak update.
#[test]
fn compound_operation_logs_every_entry() {
    let (engine, _clock, household, user) = setup();

    engine.complete_task(&household, &user, "Sweep", 10).unwrap();

    let feed = engine.store().activity_feed(&household, 100).unwrap();
    let types: Vec<&str> = feed.iter().map(|e| e.event_type.as_str()).collect();
    assert!(types.contains(&"task_completed"));
    assert!(types.contains(&"points_credited"));
    assert!(types.contains(&"streak_updated"));
}

#[test]
fn redemption_logs_debit_and_redemption_entries() {
    let (engine, _clock, household, user) = setup();
    engine.adjust_points(&user, 100, "seed").unwrap();
    let reward = engine
        .create_reward(
            &household,
            RewardSpec {
                name: "Movie night pick".to_string(),
                description: String::new(),
                cost: 60,
                quantity_available: None,
                max_per_user: None,
                expires_at: None,
            },
        )
        .unwrap();

    engine.redeem_reward(&user, &reward.reward_id).unwrap();

    let feed = engine.store().activity_feed(&household, 100).unwrap();
    let debit = feed
        .iter()
        .find(|e| e.event_type == "points_debited")
        .expect("missing points_debited entry");
    assert_eq!(debit.points_delta, -60);
    let redeemed = feed
        .iter()
        .find(|e| e.event_type == "reward_redeemed")
        .expect("missing reward_redeemed entry");
    assert_eq!(redeemed.points_delta, 0);
    assert_eq!(redeemed.entity_kind, "reward");
    assert_eq!(redeemed.entity_id, reward.reward_id);
}

/// Only ledger entries carry a delta, so the sum over a user's entries
/// reproduces their balance exactly.
#[test]
fn deltas_sum_to_the_balance() {
    let (engine, clock, household, user) = setup();

    engine.complete_task(&household, &user, "Sweep", 40).unwrap();
    clock.advance_days(1);
    engine.complete_task(&household, &user, "Dishes", 40).unwrap();
    engine.adjust_points(&user, 25, "bonus").unwrap();
    let reward = engine
        .create_reward(
            &household,
            RewardSpec {
                name: "Skip the dishes".to_string(),
                description: String::new(),
                cost: 50,
                quantity_available: None,
                max_per_user: None,
                expires_at: None,
            },
        )
        .unwrap();
    engine.redeem_reward(&user, &reward.reward_id).unwrap();

    let entries = engine.store().user_activity(&user, 1000).unwrap();
    let sum: i64 = entries.iter().map(|e| e.points_delta).sum();
    assert_eq!(sum, engine.user(&user).unwrap().stats.points);
}

#[test]
fn failed_operations_log_nothing() {
    let (engine, _clock, household, user) = setup();
    let reward = engine
        .create_reward(
            &household,
            RewardSpec {
                name: "Breakfast in bed".to_string(),
                description: String::new(),
                cost: 500,
                quantity_available: None,
                max_per_user: None,
                expires_at: None,
            },
        )
        .unwrap();
    let before = engine.store().activity_count(&household).unwrap();

    assert!(engine.redeem_reward(&user, &reward.reward_id).is_err());
    assert!(engine.adjust_points(&user, -10, "overdraw").is_err());

    assert_eq!(engine.store().activity_count(&household).unwrap(), before);
}

#[test]
fn entries_carry_a_human_readable_action() {
    let (engine, _clock, household, user) = setup();

    engine.complete_task(&household, &user, "Mow the lawn", 30).unwrap();

    let feed = engine.store().activity_feed(&household, 10).unwrap();
    let task = feed
        .iter()
        .find(|e| e.event_type == "task_completed")
        .expect("missing task_completed entry");
    assert!(task.action.contains("Mow the lawn"));
    assert_eq!(task.actor.as_deref(), Some(user.as_str()));
}
