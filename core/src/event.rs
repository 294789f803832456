//! The activity log — the append-only audit trail.
//!
//! RULE: every state-changing operation records its activity entries in
//! the same transaction as the mutation itself. Entries are never updated
//! or deleted after insert.
//!
//! Only ledger events (`points_credited` / `points_debited`) carry a
//! non-zero points delta, so summing `points_delta` over a user's entries
//! reproduces their balance.

use crate::badge::Rarity;
use crate::types::{BadgeId, ChallengeId, HouseholdId, Points, RedemptionId, RewardId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every event the engine can record.
/// Variants are added over time — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    TaskCompleted {
        user_id: UserId,
        task_title: String,
        points_awarded: Points,
    },
    PointsCredited {
        user_id: UserId,
        amount: Points,
        balance_after: Points,
        reason: String,
    },
    PointsDebited {
        user_id: UserId,
        amount: Points,
        balance_after: Points,
        reason: String,
    },
    StreakUpdated {
        user_id: UserId,
        previous_days: u32,
        streak_days: u32,
    },
    MemberJoined {
        user_id: UserId,
        household_id: HouseholdId,
    },
    BadgeAwarded {
        user_id: UserId,
        badge_id: BadgeId,
        rarity: Rarity,
    },
    RewardRedeemed {
        user_id: UserId,
        reward_id: RewardId,
        redemption_id: RedemptionId,
        points_spent: Points,
    },
    RewardStockExhausted {
        reward_id: RewardId,
    },
    RewardUpdated {
        reward_id: RewardId,
    },
    ChallengeJoined {
        user_id: UserId,
        challenge_id: ChallengeId,
    },
    ChallengeLeft {
        user_id: UserId,
        challenge_id: ChallengeId,
    },
    ChallengeCompleted {
        user_id: UserId,
        challenge_id: ChallengeId,
        points_awarded: Points,
    },
}

impl ActivityEvent {
    /// Stable string name, used for the event_type column.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TaskCompleted { .. } => "task_completed",
            Self::PointsCredited { .. } => "points_credited",
            Self::PointsDebited { .. } => "points_debited",
            Self::StreakUpdated { .. } => "streak_updated",
            Self::MemberJoined { .. } => "member_joined",
            Self::BadgeAwarded { .. } => "badge_awarded",
            Self::RewardRedeemed { .. } => "reward_redeemed",
            Self::RewardStockExhausted { .. } => "reward_stock_exhausted",
            Self::RewardUpdated { .. } => "reward_updated",
            Self::ChallengeJoined { .. } => "challenge_joined",
            Self::ChallengeLeft { .. } => "challenge_left",
            Self::ChallengeCompleted { .. } => "challenge_completed",
        }
    }

    /// The balance change this entry represents. Non-zero only for
    /// ledger events; companion entries (task_completed, reward_redeemed,
    /// challenge_completed) describe the cause, not the delta.
    pub fn points_delta(&self) -> Points {
        match self {
            Self::PointsCredited { amount, .. } => *amount,
            Self::PointsDebited { amount, .. } => -*amount,
            _ => 0,
        }
    }

    /// The user the entry is attributed to, if any.
    pub fn actor(&self) -> Option<&UserId> {
        match self {
            Self::TaskCompleted { user_id, .. }
            | Self::PointsCredited { user_id, .. }
            | Self::PointsDebited { user_id, .. }
            | Self::StreakUpdated { user_id, .. }
            | Self::MemberJoined { user_id, .. }
            | Self::BadgeAwarded { user_id, .. }
            | Self::RewardRedeemed { user_id, .. }
            | Self::ChallengeJoined { user_id, .. }
            | Self::ChallengeLeft { user_id, .. }
            | Self::ChallengeCompleted { user_id, .. } => Some(user_id),
            Self::RewardStockExhausted { .. } | Self::RewardUpdated { .. } => None,
        }
    }

    /// The primary entity the entry refers to, as (kind, id).
    pub fn entity_ref(&self) -> (&'static str, &str) {
        match self {
            Self::TaskCompleted { user_id, .. }
            | Self::PointsCredited { user_id, .. }
            | Self::PointsDebited { user_id, .. }
            | Self::StreakUpdated { user_id, .. } => ("user", user_id),
            Self::MemberJoined { household_id, .. } => ("household", household_id),
            Self::BadgeAwarded { badge_id, .. } => ("badge", badge_id),
            Self::RewardRedeemed { reward_id, .. }
            | Self::RewardStockExhausted { reward_id }
            | Self::RewardUpdated { reward_id } => ("reward", reward_id),
            Self::ChallengeJoined { challenge_id, .. }
            | Self::ChallengeLeft { challenge_id, .. }
            | Self::ChallengeCompleted { challenge_id, .. } => ("challenge", challenge_id),
        }
    }

    /// Human-readable feed line.
    pub fn describe(&self) -> String {
        match self {
            Self::TaskCompleted {
                task_title,
                points_awarded,
                ..
            } => format!("completed '{task_title}' (+{points_awarded} pts)"),
            Self::PointsCredited { amount, reason, .. } => {
                format!("earned {amount} pts ({reason})")
            }
            Self::PointsDebited { amount, reason, .. } => {
                format!("spent {amount} pts ({reason})")
            }
            Self::StreakUpdated { streak_days, .. } => {
                format!("streak is now {streak_days} day(s)")
            }
            Self::MemberJoined { household_id, .. } => {
                format!("joined household {household_id}")
            }
            Self::BadgeAwarded {
                badge_id, rarity, ..
            } => format!("earned the {} badge '{badge_id}'", rarity.as_str()),
            Self::RewardRedeemed {
                reward_id,
                points_spent,
                ..
            } => format!("redeemed '{reward_id}' for {points_spent} pts"),
            Self::RewardStockExhausted { reward_id } => {
                format!("reward '{reward_id}' is out of stock")
            }
            Self::RewardUpdated { reward_id } => format!("reward '{reward_id}' was updated"),
            Self::ChallengeJoined { challenge_id, .. } => {
                format!("joined challenge '{challenge_id}'")
            }
            Self::ChallengeLeft { challenge_id, .. } => {
                format!("left challenge '{challenge_id}'")
            }
            Self::ChallengeCompleted {
                challenge_id,
                points_awarded,
                ..
            } => format!("completed challenge '{challenge_id}' (+{points_awarded} pts)"),
        }
    }
}

/// The activity entry as persisted.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub id: Option<i64>,
    pub household_id: Option<HouseholdId>,
    pub actor: Option<UserId>,
    pub entity_kind: String,
    pub entity_id: String,
    pub points_delta: Points,
    pub event_type: String,
    pub action: String,
    pub payload: String, // JSON-serialized ActivityEvent
    pub recorded_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Build the persistable entry for an event.
    pub fn from_event(
        event: &ActivityEvent,
        household_id: Option<&str>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let (entity_kind, entity_id) = event.entity_ref();
        Ok(Self {
            id: None,
            household_id: household_id.map(str::to_string),
            actor: event.actor().cloned(),
            entity_kind: entity_kind.to_string(),
            entity_id: entity_id.to_string(),
            points_delta: event.points_delta(),
            event_type: event.event_type().to_string(),
            action: event.describe(),
            payload: serde_json::to_string(event)?,
            recorded_at,
        })
    }
}
