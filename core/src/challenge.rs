//! Time-boxed household challenges and their completion criteria.
//!
//! Expiry is evaluated lazily against the clock on every read; there is
//! no background sweep. Criteria are decoded once at the boundary into a
//! tagged union — never re-parsed inside domain methods.

use crate::error::{GameError, GameResult};
use crate::types::{ChallengeId, HouseholdId, Points, Progress};
use crate::user::UserStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionCriteria {
    /// Complete `count` tasks within the challenge week.
    Tasks {
        #[serde(default = "default_task_count")]
        count: u32,
    },
    /// Reach a point balance of `amount`.
    Points {
        #[serde(default = "default_point_amount")]
        amount: Points,
    },
    /// Hold a completion streak of `days`.
    Streak {
        #[serde(default = "default_streak_days")]
        days: u32,
    },
    /// A criteria type this engine does not recognize. Never completes.
    #[serde(other)]
    Unknown,
}

fn default_task_count() -> u32 {
    1
}

fn default_point_amount() -> Points {
    100
}

fn default_streak_days() -> u32 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_id: ChallengeId,
    pub household_id: HouseholdId,
    pub title: String,
    pub description: String,
    pub point_reward: Points,
    /// None = no deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// None = no participant cap.
    pub max_participants: Option<u32>,
    pub criteria: CompletionCriteria,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for a household admin adding a challenge.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeSpec {
    pub title: String,
    pub description: String,
    pub point_reward: Points,
    pub due_date: Option<DateTime<Utc>>,
    pub max_participants: Option<u32>,
    pub criteria: CompletionCriteria,
}

/// Implicit challenge states, recomputed on each access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Active,
    Expired,
    Full,
    Inactive,
}

impl Challenge {
    pub fn validate(&self) -> GameResult<()> {
        if self.point_reward < 1 {
            return Err(GameError::InvalidRequirement {
                entity: format!("challenge '{}'", self.challenge_id),
                value: self.point_reward,
            });
        }
        let threshold = match self.criteria {
            CompletionCriteria::Tasks { count } => count as i64,
            CompletionCriteria::Points { amount } => amount,
            CompletionCriteria::Streak { days } => days as i64,
            CompletionCriteria::Unknown => 1,
        };
        if threshold < 1 {
            return Err(GameError::InvalidRequirement {
                entity: format!("challenge '{}' criteria", self.challenge_id),
                value: threshold,
            });
        }
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => now > due,
            None => false,
        }
    }

    pub fn is_full(&self, participant_count: u32) -> bool {
        match self.max_participants {
            Some(cap) => participant_count >= cap,
            None => false,
        }
    }

    pub fn can_join(&self, participant_count: u32, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now) && !self.is_full(participant_count)
    }

    pub fn status(&self, participant_count: u32, now: DateTime<Utc>) -> ChallengeStatus {
        if !self.is_active {
            ChallengeStatus::Inactive
        } else if self.is_expired(now) {
            ChallengeStatus::Expired
        } else if self.is_full(participant_count) {
            ChallengeStatus::Full
        } else {
            ChallengeStatus::Active
        }
    }
}

/// What the evaluator may read about one participant.
#[derive(Debug, Clone, Default)]
pub struct ChallengeFacts {
    pub stats: UserStats,
    /// Completions in the rolling 7-day window ending today.
    pub tasks_completed_this_week: u32,
}

/// Why a join was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinBlock {
    Inactive,
    Expired,
    Full,
    AlreadyJoined,
}

impl fmt::Display for JoinBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Inactive => "challenge is not active",
            Self::Expired => "challenge has expired",
            Self::Full => "challenge is full",
            Self::AlreadyJoined => "already a participant",
        };
        f.write_str(msg)
    }
}

pub struct ChallengeEvaluator;

impl ChallengeEvaluator {
    pub fn can_user_join(
        &self,
        challenge: &Challenge,
        participant_count: u32,
        already_joined: bool,
        now: DateTime<Utc>,
    ) -> Result<(), JoinBlock> {
        if already_joined {
            return Err(JoinBlock::AlreadyJoined);
        }
        match challenge.status(participant_count, now) {
            ChallengeStatus::Inactive => Err(JoinBlock::Inactive),
            ChallengeStatus::Expired => Err(JoinBlock::Expired),
            ChallengeStatus::Full => Err(JoinBlock::Full),
            ChallengeStatus::Active => Ok(()),
        }
    }

    /// Does the participant satisfy the completion criteria right now?
    /// Evaluated against live statistics, never a snapshot.
    pub fn check_completion(&self, challenge: &Challenge, facts: &ChallengeFacts) -> bool {
        match challenge.criteria {
            CompletionCriteria::Tasks { count } => facts.tasks_completed_this_week >= count,
            CompletionCriteria::Points { amount } => facts.stats.points >= amount,
            CompletionCriteria::Streak { days } => facts.stats.streak_days >= days,
            CompletionCriteria::Unknown => false,
        }
    }

    pub fn progress(&self, challenge: &Challenge, facts: &ChallengeFacts) -> Progress {
        let pair = match challenge.criteria {
            CompletionCriteria::Tasks { count } => {
                Some((facts.tasks_completed_this_week as i64, count as i64))
            }
            CompletionCriteria::Points { amount } => Some((facts.stats.points, amount)),
            CompletionCriteria::Streak { days } => {
                Some((facts.stats.streak_days as i64, days as i64))
            }
            CompletionCriteria::Unknown => None,
        };
        match pair {
            Some((current, target)) => Progress::toward(current, target),
            None => Progress {
                current: 0,
                target: 0,
                percentage: 0,
            },
        }
    }
}
