//! The gamification engine — ledger, streaks, badges, rewards, and
//! challenges orchestrated over one store transaction per operation.
//!
//! OPERATION ORDER (fixed, documented, never reordered):
//!   validate → mutate statistics → record → update counters →
//!   challenge sweep → badge sweep → activity log
//!
//! RULES:
//!   - Every compound operation commits all-or-nothing; a failure at any
//!     step rolls the whole transaction back.
//!   - Rejections (insufficient points, cap reached, expired, full) are
//!     terminal per-call outcomes with no side effects. Nothing retries.
//!   - Evaluators are pure; only the engine touches the store.
//!   - Challenge payouts land before the badge sweep, so they count
//!     toward points badges in the same operation.

use crate::{
    badge::{Badge, BadgeEvaluator},
    challenge::{Challenge, ChallengeEvaluator, ChallengeFacts, ChallengeSpec, ChallengeStatus},
    clock::{Clock, FixedClock},
    config::GameConfig,
    error::{GameError, GameResult},
    event::ActivityEvent,
    ledger::PointsLedger,
    reward::{Reward, RewardCatalog, RewardRedemption, RewardSpec, RewardStatus},
    store::GameStore,
    streak::StreakTracker,
    types::{BadgeId, ChallengeId, Points, Progress},
    user::{HouseholdRecord, UserRecord},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub struct GameEngine {
    store: GameStore,
    clock: Arc<dyn Clock>,
    ledger: PointsLedger,
    streaks: StreakTracker,
    badges: BadgeEvaluator,
    rewards: RewardCatalog,
    challenges: ChallengeEvaluator,
}

/// What a task completion changed, after all sweeps.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub balance: Points,
    pub streak_days: u32,
    pub badges_awarded: Vec<BadgeId>,
    pub challenges_completed: Vec<ChallengeId>,
}

impl GameEngine {
    pub fn new(store: GameStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ledger: PointsLedger,
            streaks: StreakTracker,
            badges: BadgeEvaluator,
            rewards: RewardCatalog,
            challenges: ChallengeEvaluator,
        }
    }

    /// In-memory engine with the built-in badge catalog and a fixed
    /// clock. Used by tests and the demo runner.
    pub fn build_test() -> GameResult<(Self, Arc<FixedClock>)> {
        let store = GameStore::in_memory()?;
        store.migrate()?;
        let clock = Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        ));
        let engine = Self::new(store, clock.clone());
        engine.seed_badges(&GameConfig::default_test())?;
        Ok((engine, clock))
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    // ── Accounts and households ────────────────────────────────

    pub fn create_user(&self, display_name: &str) -> GameResult<UserRecord> {
        let user = UserRecord {
            user_id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            stats: Default::default(),
            joined_at: self.clock.now(),
        };
        self.store.insert_user(&user)?;
        Ok(user)
    }

    pub fn create_household(&self, name: &str) -> GameResult<HouseholdRecord> {
        let household_id = Uuid::new_v4().to_string();
        let invite_code: String = household_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(6)
            .collect::<String>()
            .to_uppercase();
        let household = HouseholdRecord {
            household_id,
            name: name.to_string(),
            invite_code,
            created_at: self.clock.now(),
        };
        self.store.insert_household(&household)?;
        Ok(household)
    }

    pub fn join_household(&self, household_id: &str, user_id: &str, role: &str) -> GameResult<()> {
        self.store.with_transaction(|store| {
            self.require_household(store, household_id)?;
            self.require_user(store, user_id)?;
            store.add_membership(household_id, user_id, role, self.clock.now())?;
            self.log_event(
                store,
                Some(household_id),
                ActivityEvent::MemberJoined {
                    user_id: user_id.to_string(),
                    household_id: household_id.to_string(),
                },
            )?;
            self.sweep_badges(store, user_id, Some(household_id))?;
            log::info!("household: {user_id} joined {household_id} as {role}");
            Ok(())
        })
    }

    /// Join via invite code; resolves the household and delegates.
    pub fn join_by_invite(&self, code: &str, user_id: &str) -> GameResult<HouseholdRecord> {
        let household = self
            .store
            .find_household_by_invite(code)?
            .ok_or_else(|| GameError::NotFound {
                entity: "household",
                id: code.to_string(),
            })?;
        self.join_household(&household.household_id, user_id, "member")?;
        Ok(household)
    }

    // ── Badge administration ───────────────────────────────────

    pub fn seed_badges(&self, config: &GameConfig) -> GameResult<()> {
        self.store.with_transaction(|store| {
            for badge in &config.badges {
                badge.validate()?;
                store.insert_badge(badge)?;
            }
            Ok(())
        })
    }

    pub fn add_badge(&self, badge: Badge) -> GameResult<()> {
        badge.validate()?;
        self.store.insert_badge(&badge)
    }

    pub fn set_badge_active(&self, badge_id: &str, active: bool) -> GameResult<()> {
        self.require_badge(&self.store, badge_id)?;
        self.store.set_badge_active(badge_id, active)
    }

    // ── Task completion ────────────────────────────────────────

    pub fn complete_task(
        &self,
        household_id: &str,
        user_id: &str,
        title: &str,
        points: Points,
    ) -> GameResult<TaskOutcome> {
        self.store.with_transaction(|store| {
            self.require_household(store, household_id)?;
            let mut user = self.require_user(store, user_id)?;
            self.require_membership(store, household_id, user_id)?;

            let now = self.clock.now();
            let today = self.clock.today();

            store.record_task_completion(household_id, user_id, today, title, points, now)?;
            user.stats.total_tasks_completed += 1;
            let credit = self.ledger.credit(user_id, &mut user.stats, points, title)?;

            self.log_event(
                store,
                Some(household_id),
                ActivityEvent::TaskCompleted {
                    user_id: user_id.to_string(),
                    task_title: title.to_string(),
                    points_awarded: points,
                },
            )?;
            self.log_event(store, Some(household_id), credit.event)?;

            let previous = user.stats.streak_days;
            let days = store.completed_days(user_id)?;
            user.stats.streak_days = self.streaks.recompute(&days, today);
            if user.stats.streak_days != previous {
                self.log_event(
                    store,
                    Some(household_id),
                    ActivityEvent::StreakUpdated {
                        user_id: user_id.to_string(),
                        previous_days: previous,
                        streak_days: user.stats.streak_days,
                    },
                )?;
            }
            store.update_user_stats(user_id, &user.stats)?;

            let challenges_completed = self.sweep_challenges(store, &mut user)?;
            let badges_awarded = self.sweep_badges(store, user_id, Some(household_id))?;

            log::info!(
                "task: {user_id} completed '{title}' (+{points} pts), balance {}",
                user.stats.points
            );
            Ok(TaskOutcome {
                balance: user.stats.points,
                streak_days: user.stats.streak_days,
                badges_awarded,
                challenges_completed,
            })
        })
    }

    /// Manual balance adjustment. Positive credits, negative debits;
    /// a debit below zero is rejected with no side effects.
    pub fn adjust_points(&self, user_id: &str, delta: Points, reason: &str) -> GameResult<Points> {
        self.store.with_transaction(|store| {
            let mut user = self.require_user(store, user_id)?;
            let outcome = self.ledger.adjust(user_id, &mut user.stats, delta, reason)?;
            store.update_user_stats(user_id, &user.stats)?;
            self.log_event(store, None, outcome.event)?;
            self.sweep_challenges(store, &mut user)?;
            self.sweep_badges(store, user_id, None)?;
            Ok(user.stats.points)
        })
    }

    // ── Rewards ────────────────────────────────────────────────

    pub fn create_reward(&self, household_id: &str, spec: RewardSpec) -> GameResult<Reward> {
        self.require_household(&self.store, household_id)?;
        let reward = Reward {
            reward_id: Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            name: spec.name,
            description: spec.description,
            cost: spec.cost,
            quantity_available: spec.quantity_available,
            times_redeemed: 0,
            max_per_user: spec.max_per_user,
            expires_at: spec.expires_at,
            is_available: true,
            created_at: self.clock.now(),
        };
        reward.validate()?;
        self.store.insert_reward(&reward)?;
        Ok(reward)
    }

    pub fn can_user_redeem(&self, user_id: &str, reward_id: &str) -> GameResult<bool> {
        let reward = self.require_reward(&self.store, reward_id)?;
        let user = self.require_user(&self.store, user_id)?;
        let user_count = self.store.redemption_count_for_user(reward_id, user_id)?;
        Ok(self
            .rewards
            .can_user_redeem(&reward, &user.stats, user_count, self.clock.now()))
    }

    /// Redeem a reward for the user. Order inside the transaction is
    /// validate → debit → record → update counters; any failure leaves
    /// no partial record.
    pub fn redeem_reward(&self, user_id: &str, reward_id: &str) -> GameResult<RewardRedemption> {
        self.store.with_transaction(|store| {
            let mut reward = self.require_reward(store, reward_id)?;
            let mut user = self.require_user(store, user_id)?;
            self.require_membership(store, &reward.household_id, user_id)?;
            let now = self.clock.now();

            let user_count = store.redemption_count_for_user(reward_id, user_id)?;
            self.rewards
                .availability(&reward, user_count, now)
                .map_err(|reason| GameError::CannotRedeem {
                    reward_id: reward_id.to_string(),
                    reason,
                })?;

            let debit = self.ledger.debit(
                user_id,
                &mut user.stats,
                reward.cost,
                &format!("redeemed '{}'", reward.name),
            )?;

            let redemption = RewardRedemption {
                redemption_id: Uuid::new_v4().to_string(),
                reward_id: reward_id.to_string(),
                redeemed_by: user_id.to_string(),
                points_spent: reward.cost,
                redeemed_at: now,
            };
            store.insert_redemption(&redemption)?;

            let exhausted = self.rewards.apply_redemption(&mut reward);
            store.update_reward(&reward)?;
            store.update_user_stats(user_id, &user.stats)?;

            let household_id = reward.household_id.clone();
            self.log_event(store, Some(&household_id), debit.event)?;
            self.log_event(
                store,
                Some(&household_id),
                ActivityEvent::RewardRedeemed {
                    user_id: user_id.to_string(),
                    reward_id: reward_id.to_string(),
                    redemption_id: redemption.redemption_id.clone(),
                    points_spent: redemption.points_spent,
                },
            )?;
            if exhausted {
                self.log_event(
                    store,
                    Some(&household_id),
                    ActivityEvent::RewardStockExhausted {
                        reward_id: reward_id.to_string(),
                    },
                )?;
                log::info!("reward: '{}' stock exhausted", reward.name);
            }
            self.sweep_badges(store, user_id, Some(&household_id))?;

            log::info!(
                "reward: {user_id} redeemed '{}' for {} pts",
                reward.name,
                reward.cost
            );
            Ok(redemption)
        })
    }

    pub fn update_reward_quantity(
        &self,
        reward_id: &str,
        new_quantity: Option<u32>,
    ) -> GameResult<Reward> {
        self.store.with_transaction(|store| {
            let mut reward = self.require_reward(store, reward_id)?;
            self.rewards
                .update_quantity(&mut reward, new_quantity, self.clock.now());
            store.update_reward(&reward)?;
            self.log_event(
                store,
                Some(reward.household_id.as_str()),
                ActivityEvent::RewardUpdated {
                    reward_id: reward_id.to_string(),
                },
            )?;
            Ok(reward)
        })
    }

    pub fn update_reward_expiration(
        &self,
        reward_id: &str,
        new_expiry: Option<DateTime<Utc>>,
    ) -> GameResult<Reward> {
        self.store.with_transaction(|store| {
            let mut reward = self.require_reward(store, reward_id)?;
            self.rewards
                .update_expiration(&mut reward, new_expiry, self.clock.now());
            store.update_reward(&reward)?;
            self.log_event(
                store,
                Some(reward.household_id.as_str()),
                ActivityEvent::RewardUpdated {
                    reward_id: reward_id.to_string(),
                },
            )?;
            Ok(reward)
        })
    }

    pub fn reward_status(&self, reward_id: &str) -> GameResult<RewardStatus> {
        let reward = self.require_reward(&self.store, reward_id)?;
        Ok(reward.status(self.clock.now()))
    }

    // ── Badges ─────────────────────────────────────────────────

    /// Evaluate and award in one step. Returns false — without side
    /// effects — when the badge is already earned or the predicate is
    /// unmet; awarding twice in a row yields (true, false).
    pub fn award_if_eligible(&self, user_id: &str, badge_id: &str) -> GameResult<bool> {
        self.store.with_transaction(|store| {
            self.require_user(store, user_id)?;
            let badge = self.require_badge(store, badge_id)?;
            let facts = store.badge_facts(user_id)?;
            if !self.badges.evaluate(&facts, &badge) {
                return Ok(false);
            }
            store.insert_badge_earned(user_id, badge_id, self.clock.now())?;
            self.log_event(
                store,
                None,
                ActivityEvent::BadgeAwarded {
                    user_id: user_id.to_string(),
                    badge_id: badge_id.to_string(),
                    rarity: badge.rarity,
                },
            )?;
            log::info!("badge: {user_id} earned '{badge_id}'");
            Ok(true)
        })
    }

    /// Manual grant, bypassing the unlock predicate. This is the award
    /// path for kinds without an implemented predicate (social, special).
    /// Granting an already-earned badge is an error here, not a no-op.
    pub fn grant_badge(&self, user_id: &str, badge_id: &str) -> GameResult<()> {
        self.store.with_transaction(|store| {
            self.require_user(store, user_id)?;
            let badge = self.require_badge(store, badge_id)?;
            if store.badge_earned(user_id, badge_id)? {
                return Err(GameError::AlreadyEarned {
                    badge_id: badge_id.to_string(),
                });
            }
            store.insert_badge_earned(user_id, badge_id, self.clock.now())?;
            self.log_event(
                store,
                None,
                ActivityEvent::BadgeAwarded {
                    user_id: user_id.to_string(),
                    badge_id: badge_id.to_string(),
                    rarity: badge.rarity,
                },
            )?;
            log::info!("badge: {user_id} granted '{badge_id}'");
            Ok(())
        })
    }

    pub fn badge_progress(&self, user_id: &str, badge_id: &str) -> GameResult<Progress> {
        self.require_user(&self.store, user_id)?;
        let badge = self.require_badge(&self.store, badge_id)?;
        let facts = self.store.badge_facts(user_id)?;
        Ok(self.badges.progress(&facts, &badge))
    }

    // ── Challenges ─────────────────────────────────────────────

    pub fn create_challenge(
        &self,
        household_id: &str,
        spec: ChallengeSpec,
    ) -> GameResult<Challenge> {
        self.require_household(&self.store, household_id)?;
        let challenge = Challenge {
            challenge_id: Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            title: spec.title,
            description: spec.description,
            point_reward: spec.point_reward,
            due_date: spec.due_date,
            max_participants: spec.max_participants,
            criteria: spec.criteria,
            is_active: true,
            created_at: self.clock.now(),
        };
        challenge.validate()?;
        self.store.insert_challenge(&challenge)?;
        Ok(challenge)
    }

    pub fn join_challenge(&self, user_id: &str, challenge_id: &str) -> GameResult<()> {
        self.store.with_transaction(|store| {
            let challenge = self.require_challenge(store, challenge_id)?;
            let mut user = self.require_user(store, user_id)?;
            self.require_membership(store, &challenge.household_id, user_id)?;

            let now = self.clock.now();
            let count = store.participant_count(challenge_id)?;
            let joined = store.is_participant(challenge_id, user_id)?;
            self.challenges
                .can_user_join(&challenge, count, joined, now)
                .map_err(|reason| GameError::CannotJoin {
                    challenge_id: challenge_id.to_string(),
                    reason,
                })?;

            store.add_participant(challenge_id, user_id, now)?;
            self.log_event(
                store,
                Some(&challenge.household_id),
                ActivityEvent::ChallengeJoined {
                    user_id: user_id.to_string(),
                    challenge_id: challenge_id.to_string(),
                },
            )?;
            log::info!("challenge: {user_id} joined '{}'", challenge.title);

            // A joiner may already satisfy the criteria.
            self.sweep_challenges(store, &mut user)?;
            self.sweep_badges(store, user_id, Some(&challenge.household_id))?;
            Ok(())
        })
    }

    pub fn leave_challenge(&self, user_id: &str, challenge_id: &str) -> GameResult<()> {
        self.store.with_transaction(|store| {
            let challenge = self.require_challenge(store, challenge_id)?;
            let removed = store.remove_participant(challenge_id, user_id)?;
            if !removed {
                return Err(GameError::NotFound {
                    entity: "participation",
                    id: format!("{user_id}@{challenge_id}"),
                });
            }
            self.log_event(
                store,
                Some(&challenge.household_id),
                ActivityEvent::ChallengeLeft {
                    user_id: user_id.to_string(),
                    challenge_id: challenge_id.to_string(),
                },
            )?;
            Ok(())
        })
    }

    pub fn challenge_progress(&self, user_id: &str, challenge_id: &str) -> GameResult<Progress> {
        let challenge = self.require_challenge(&self.store, challenge_id)?;
        let user = self.require_user(&self.store, user_id)?;
        let facts = self.challenge_facts(&self.store, &user)?;
        Ok(self.challenges.progress(&challenge, &facts))
    }

    pub fn challenge_status(&self, challenge_id: &str) -> GameResult<ChallengeStatus> {
        let challenge = self.require_challenge(&self.store, challenge_id)?;
        let count = self.store.participant_count(challenge_id)?;
        Ok(challenge.status(count, self.clock.now()))
    }

    // ── Reads ──────────────────────────────────────────────────

    pub fn user(&self, user_id: &str) -> GameResult<UserRecord> {
        self.require_user(&self.store, user_id)
    }

    pub fn reward(&self, reward_id: &str) -> GameResult<Reward> {
        self.require_reward(&self.store, reward_id)
    }

    pub fn challenge(&self, challenge_id: &str) -> GameResult<Challenge> {
        self.require_challenge(&self.store, challenge_id)
    }

    pub fn leaderboard(&self, household_id: &str) -> GameResult<Vec<UserRecord>> {
        self.store.leaderboard(household_id)
    }

    // ── Internals ──────────────────────────────────────────────

    fn log_event(
        &self,
        store: &GameStore,
        household_id: Option<&str>,
        event: ActivityEvent,
    ) -> GameResult<()> {
        let record =
            crate::event::ActivityRecord::from_event(&event, household_id, self.clock.now())?;
        store.append_activity(&record)
    }

    /// Award every active badge whose predicate the user now satisfies.
    fn sweep_badges(
        &self,
        store: &GameStore,
        user_id: &str,
        household_id: Option<&str>,
    ) -> GameResult<Vec<BadgeId>> {
        let facts = store.badge_facts(user_id)?;
        let mut awarded = Vec::new();
        for badge in store.list_active_badges()? {
            if self.badges.evaluate(&facts, &badge) {
                store.insert_badge_earned(user_id, &badge.badge_id, self.clock.now())?;
                self.log_event(
                    store,
                    household_id,
                    ActivityEvent::BadgeAwarded {
                        user_id: user_id.to_string(),
                        badge_id: badge.badge_id.clone(),
                        rarity: badge.rarity,
                    },
                )?;
                log::info!(
                    "badge: {user_id} earned '{}' ({})",
                    badge.badge_id,
                    badge.rarity.as_str()
                );
                awarded.push(badge.badge_id);
            }
        }
        Ok(awarded)
    }

    /// Re-check every open participation for the user and pay out newly
    /// completed challenges. Expired and deactivated challenges never
    /// complete.
    fn sweep_challenges(
        &self,
        store: &GameStore,
        user: &mut UserRecord,
    ) -> GameResult<Vec<ChallengeId>> {
        let now = self.clock.now();
        let mut completed = Vec::new();
        for challenge_id in store.open_participations(&user.user_id)? {
            let challenge = match store.get_challenge(&challenge_id)? {
                Some(c) => c,
                None => continue,
            };
            if !challenge.is_active || challenge.is_expired(now) {
                continue;
            }
            let facts = self.challenge_facts(store, user)?;
            if !self.challenges.check_completion(&challenge, &facts) {
                continue;
            }

            store.mark_challenge_completed(&challenge_id, &user.user_id, now)?;
            let credit = self.ledger.credit(
                &user.user_id,
                &mut user.stats,
                challenge.point_reward,
                &format!("challenge '{}'", challenge.title),
            )?;
            store.update_user_stats(&user.user_id, &user.stats)?;
            self.log_event(
                store,
                Some(&challenge.household_id),
                ActivityEvent::ChallengeCompleted {
                    user_id: user.user_id.clone(),
                    challenge_id: challenge_id.clone(),
                    points_awarded: challenge.point_reward,
                },
            )?;
            self.log_event(store, Some(&challenge.household_id), credit.event)?;
            log::info!(
                "challenge: {} completed '{}' (+{} pts)",
                user.user_id,
                challenge.title,
                challenge.point_reward
            );
            completed.push(challenge_id);
        }
        Ok(completed)
    }

    fn challenge_facts(&self, store: &GameStore, user: &UserRecord) -> GameResult<ChallengeFacts> {
        let week_start = self.clock.today() - Duration::days(6);
        Ok(ChallengeFacts {
            stats: user.stats.clone(),
            tasks_completed_this_week: store.tasks_completed_since(&user.user_id, week_start)?,
        })
    }

    fn require_user(&self, store: &GameStore, user_id: &str) -> GameResult<UserRecord> {
        store.get_user(user_id)?.ok_or_else(|| GameError::NotFound {
            entity: "user",
            id: user_id.to_string(),
        })
    }

    fn require_household(
        &self,
        store: &GameStore,
        household_id: &str,
    ) -> GameResult<HouseholdRecord> {
        store
            .get_household(household_id)?
            .ok_or_else(|| GameError::NotFound {
                entity: "household",
                id: household_id.to_string(),
            })
    }

    fn require_membership(
        &self,
        store: &GameStore,
        household_id: &str,
        user_id: &str,
    ) -> GameResult<()> {
        if store.is_member(household_id, user_id)? {
            Ok(())
        } else {
            Err(GameError::NotFound {
                entity: "membership",
                id: format!("{user_id}@{household_id}"),
            })
        }
    }

    fn require_badge(&self, store: &GameStore, badge_id: &str) -> GameResult<Badge> {
        store
            .get_badge(badge_id)?
            .ok_or_else(|| GameError::NotFound {
                entity: "badge",
                id: badge_id.to_string(),
            })
    }

    fn require_reward(&self, store: &GameStore, reward_id: &str) -> GameResult<Reward> {
        store
            .get_reward(reward_id)?
            .ok_or_else(|| GameError::NotFound {
                entity: "reward",
                id: reward_id.to_string(),
            })
    }

    fn require_challenge(&self, store: &GameStore, challenge_id: &str) -> GameResult<Challenge> {
        store
            .get_challenge(challenge_id)?
            .ok_or_else(|| GameError::NotFound {
                entity: "challenge",
                id: challenge_id.to_string(),
            })
    }
}
