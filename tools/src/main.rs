//! roomies-runner: headless demo runner for the Roomies gamification
//! core. Seeds a household and replays simulated days of chore activity
//! through the engine, then prints an end-of-run summary.
//!
//! Usage:
//!   roomies-runner --seed 42 --days 30 --db :memory: --data-dir ./data

mod seed;

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use roomies_core::{
    challenge::{ChallengeSpec, CompletionCriteria},
    clock::{Clock, FixedClock},
    config::GameConfig,
    engine::GameEngine,
    reward::RewardSpec,
    store::GameStore,
    user::UserRecord,
};
use seed::{SeedRng, CHORES, FIRST_NAMES};
use std::env;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 30i64);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    println!("Roomies — demo runner");
    println!("  seed:      {seed}");
    println!("  days:      {days}");
    println!("  db:        {db}");
    println!("  data_dir:  {data_dir}");
    println!();

    let store = if db == ":memory:" {
        GameStore::in_memory()?
    } else {
        GameStore::open(db)?
    };
    store.migrate()?;

    let config = match GameConfig::load(data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("badge catalog unavailable ({e:#}); using built-in defaults");
            GameConfig::default_test()
        }
    };

    let clock = Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
    ));
    let engine = GameEngine::new(store, clock.clone());
    engine.seed_badges(&config)?;

    let mut rng = SeedRng::new(seed);

    // Household and roster.
    let household = engine.create_household("Maple Street")?;
    let mut members: Vec<UserRecord> = Vec::new();
    for i in 0..4 {
        let name = *rng.pick(FIRST_NAMES);
        let user = engine.create_user(name)?;
        if i == 0 {
            engine.join_household(&household.household_id, &user.user_id, "admin")?;
        } else {
            // Later members come in through the invite code.
            engine.join_by_invite(&household.invite_code, &user.user_id)?;
        }
        members.push(user);
    }

    // Reward catalog.
    let rewards = vec![
        engine.create_reward(
            &household.household_id,
            RewardSpec {
                name: "Movie night pick".to_string(),
                description: "Choose the Friday movie".to_string(),
                cost: 100,
                quantity_available: None,
                max_per_user: None,
                expires_at: None,
            },
        )?,
        engine.create_reward(
            &household.household_id,
            RewardSpec {
                name: "Skip the dishes".to_string(),
                description: "Someone else takes your dish night".to_string(),
                cost: 50,
                quantity_available: Some(5),
                max_per_user: Some(2),
                expires_at: None,
            },
        )?,
        engine.create_reward(
            &household.household_id,
            RewardSpec {
                name: "Breakfast in bed".to_string(),
                description: "Weekend breakfast, delivered".to_string(),
                cost: 150,
                quantity_available: Some(3),
                max_per_user: Some(1),
                expires_at: Some(clock.now() + Duration::days(days / 2)),
            },
        )?,
    ];

    // Challenges: everyone joins both on day one.
    let sprint = engine.create_challenge(
        &household.household_id,
        ChallengeSpec {
            title: "Spring Cleaning Sprint".to_string(),
            description: "Five chores inside the first week".to_string(),
            point_reward: 50,
            due_date: Some(clock.now() + Duration::days(7)),
            max_participants: None,
            criteria: CompletionCriteria::Tasks { count: 5 },
        },
    )?;
    let chase = engine.create_challenge(
        &household.household_id,
        ChallengeSpec {
            title: "Point Chase".to_string(),
            description: "First to a 300-point balance".to_string(),
            point_reward: 75,
            due_date: None,
            max_participants: None,
            criteria: CompletionCriteria::Points { amount: 300 },
        },
    )?;
    for user in &members {
        engine.join_challenge(&user.user_id, &sprint.challenge_id)?;
        engine.join_challenge(&user.user_id, &chase.challenge_id)?;
    }

    // Replay the days. Members complete 0-2 chores a day, so streaks
    // break and restart naturally; redemptions are occasional.
    for day in 1..=days {
        for user in &members {
            let chores_today = rng.next_u64_below(3);
            for _ in 0..chores_today {
                let (title, points) = *rng.pick(CHORES);
                engine.complete_task(&household.household_id, &user.user_id, title, points)?;
            }
            if rng.chance(0.15) {
                for reward in &rewards {
                    if engine.can_user_redeem(&user.user_id, &reward.reward_id)? {
                        engine.redeem_reward(&user.user_id, &reward.reward_id)?;
                        break;
                    }
                }
            }
        }
        log::debug!("day {day}/{days} complete");
        clock.advance_days(1);
    }

    print_summary(&engine, &household.household_id)?;
    Ok(())
}

fn print_summary(engine: &GameEngine, household_id: &str) -> Result<()> {
    println!("── End of run ──────────────────────────────────────────");
    for user in engine.leaderboard(household_id)? {
        let badges = engine.store().earned_badge_count(&user.user_id)?;
        let challenges = engine.store().completed_challenge_count(&user.user_id)?;
        println!(
            "  {:<10} {:>5} pts  streak {:>2}  tasks {:>3}  badges {badges}  challenges {challenges}",
            user.display_name,
            user.stats.points,
            user.stats.streak_days,
            user.stats.total_tasks_completed,
        );
    }
    println!();
    for reward in engine.store().list_rewards(household_id)? {
        let count = engine.store().redemption_count_for_reward(&reward.reward_id)?;
        let status = engine.reward_status(&reward.reward_id)?;
        println!("  '{}': {count} redemption(s), {status:?}", reward.name);
    }
    for challenge in engine.store().list_challenges(household_id)? {
        let status = engine.challenge_status(&challenge.challenge_id)?;
        println!("  '{}': {status:?}", challenge.title);
    }
    println!();
    println!(
        "  activity entries: {}",
        engine.store().activity_count(household_id)?
    );
    println!();
    println!("Recent activity:");
    for entry in engine.store().activity_feed(household_id, 10)? {
        println!("  [{}] {}", entry.event_type, entry.action);
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
