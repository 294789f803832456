use crate::challenge::JoinBlock;
use crate::reward::RedeemBlock;
use crate::types::{BadgeId, ChallengeId, Points, RewardId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("not enough points: needed {needed}, available {available}")]
    InsufficientPoints { needed: Points, available: Points },

    #[error("reward '{reward_id}' cannot be redeemed: {reason}")]
    CannotRedeem {
        reward_id: RewardId,
        reason: RedeemBlock,
    },

    #[error("badge '{badge_id}' already earned")]
    AlreadyEarned { badge_id: BadgeId },

    #[error("challenge '{challenge_id}' cannot be joined: {reason}")]
    CannotJoin {
        challenge_id: ChallengeId,
        reason: JoinBlock,
    },

    #[error("invalid requirement for {entity}: {value} (must be >= 1)")]
    InvalidRequirement { entity: String, value: i64 },

    #[error("invalid amount: {amount} (must be >= 0)")]
    InvalidAmount { amount: Points },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GameResult<T> = Result<T, GameError>;
