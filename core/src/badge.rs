//! Badge definitions and the unlock evaluator.
//!
//! Definitions are immutable seed data; deactivation is a soft disable.
//! Earned-by edges are created only by the engine's award path, and a
//! badge is earned by a user at most once.

use crate::error::{GameError, GameResult};
use crate::types::{BadgeId, Progress};
use crate::user::UserStats;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    TaskCompletion,
    PointsEarned,
    HouseholdJoin,
    Streak,
    ChallengeCompletion,
    RewardRedemption,
    Social,
    Special,
}

impl BadgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCompletion => "task_completion",
            Self::PointsEarned => "points_earned",
            Self::HouseholdJoin => "household_join",
            Self::Streak => "streak",
            Self::ChallengeCompletion => "challenge_completion",
            Self::RewardRedemption => "reward_redemption",
            Self::Social => "social",
            Self::Special => "special",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task_completion" => Some(Self::TaskCompletion),
            "points_earned" => Some(Self::PointsEarned),
            "household_join" => Some(Self::HouseholdJoin),
            "streak" => Some(Self::Streak),
            "challenge_completion" => Some(Self::ChallengeCompletion),
            "reward_redemption" => Some(Self::RewardRedemption),
            "social" => Some(Self::Social),
            "special" => Some(Self::Special),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "common" => Some(Self::Common),
            "uncommon" => Some(Self::Uncommon),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub badge_id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub kind: BadgeKind,
    pub requirement: i64,
    pub rarity: Rarity,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Badge {
    /// Admin-time validation. Thresholds below 1 are configuration
    /// errors, not runtime conditions.
    pub fn validate(&self) -> GameResult<()> {
        if self.requirement < 1 {
            return Err(GameError::InvalidRequirement {
                entity: format!("badge '{}'", self.badge_id),
                value: self.requirement,
            });
        }
        Ok(())
    }
}

/// Everything the evaluator may read about one user.
/// Assembled by the store; the evaluator never touches the database.
#[derive(Debug, Clone, Default)]
pub struct BadgeFacts {
    pub stats: UserStats,
    pub active_memberships: u32,
    pub redemption_count: u32,
    pub earned: HashSet<BadgeId>,
}

pub struct BadgeEvaluator;

impl BadgeEvaluator {
    /// Does `facts` satisfy the badge's unlock predicate?
    /// Inactive badges and badges already earned never re-award.
    pub fn evaluate(&self, facts: &BadgeFacts, badge: &Badge) -> bool {
        if !badge.is_active || facts.earned.contains(&badge.badge_id) {
            return false;
        }
        match self.current(facts, badge) {
            Some(current) => current >= badge.requirement,
            None => false,
        }
    }

    /// Progress toward the unlock threshold. Kinds without a predicate
    /// report zero progress.
    pub fn progress(&self, facts: &BadgeFacts, badge: &Badge) -> Progress {
        let current = self.current(facts, badge).unwrap_or(0);
        Progress::toward(current, badge.requirement)
    }

    /// The statistic a badge kind tracks. `None` for kinds whose
    /// predicate is not yet implemented — those never unlock.
    fn current(&self, facts: &BadgeFacts, badge: &Badge) -> Option<i64> {
        match badge.kind {
            BadgeKind::TaskCompletion => Some(facts.stats.total_tasks_completed as i64),
            BadgeKind::PointsEarned => Some(facts.stats.points),
            BadgeKind::HouseholdJoin => Some(facts.active_memberships as i64),
            BadgeKind::Streak => Some(facts.stats.streak_days as i64),
            BadgeKind::RewardRedemption => Some(facts.redemption_count as i64),
            BadgeKind::ChallengeCompletion | BadgeKind::Social | BadgeKind::Special => None,
        }
    }
}
