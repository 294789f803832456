//! Reward catalog — stock, expiry, per-user caps, and redemption
//! bookkeeping.
//!
//! Reward status is always derived from fields plus the evaluation
//! instant; there is no stored status column to go stale. The only
//! stored flag is `is_available`, the admin/auto soft-disable switch.

use crate::error::{GameError, GameResult};
use crate::types::{HouseholdId, Points, RedemptionId, RewardId, UserId};
use crate::user::UserStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub reward_id: RewardId,
    pub household_id: HouseholdId,
    pub name: String,
    pub description: String,
    pub cost: Points,
    /// None = unlimited stock.
    pub quantity_available: Option<u32>,
    /// Monotonically non-decreasing.
    pub times_redeemed: u32,
    /// None = no per-user cap.
    pub max_per_user: Option<u32>,
    /// None = never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Implicit reward states, recomputed on each access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    Available,
    OutOfStock,
    Expired,
    Disabled,
}

impl Reward {
    pub fn validate(&self) -> GameResult<()> {
        if self.cost < 1 {
            return Err(GameError::InvalidRequirement {
                entity: format!("reward '{}'", self.reward_id),
                value: self.cost,
            });
        }
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now > at,
            None => false,
        }
    }

    pub fn is_in_stock(&self) -> bool {
        match self.quantity_available {
            Some(cap) => self.times_redeemed < cap,
            None => true,
        }
    }

    pub fn can_be_redeemed(&self, now: DateTime<Utc>) -> bool {
        self.is_available && !self.is_expired(now) && self.is_in_stock()
    }

    pub fn status(&self, now: DateTime<Utc>) -> RewardStatus {
        if !self.is_available {
            RewardStatus::Disabled
        } else if self.is_expired(now) {
            RewardStatus::Expired
        } else if !self.is_in_stock() {
            RewardStatus::OutOfStock
        } else {
            RewardStatus::Available
        }
    }
}

/// Creation payload for a household admin adding a reward.
#[derive(Debug, Clone, Deserialize)]
pub struct RewardSpec {
    pub name: String,
    pub description: String,
    pub cost: Points,
    pub quantity_available: Option<u32>,
    pub max_per_user: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Immutable record of one reward exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRedemption {
    pub redemption_id: RedemptionId,
    pub reward_id: RewardId,
    pub redeemed_by: UserId,
    pub points_spent: Points,
    pub redeemed_at: DateTime<Utc>,
}

/// Why a redemption was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemBlock {
    Disabled,
    Expired,
    OutOfStock,
    PerUserCapReached,
}

impl fmt::Display for RedeemBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Disabled => "reward is no longer available",
            Self::Expired => "reward has expired",
            Self::OutOfStock => "reward is out of stock",
            Self::PerUserCapReached => "per-user redemption limit reached",
        };
        f.write_str(msg)
    }
}

pub struct RewardCatalog;

impl RewardCatalog {
    /// Availability and per-user cap validation, without the balance
    /// check (the ledger owns that).
    pub fn availability(
        &self,
        reward: &Reward,
        user_redemptions: u32,
        now: DateTime<Utc>,
    ) -> Result<(), RedeemBlock> {
        match reward.status(now) {
            RewardStatus::Disabled => return Err(RedeemBlock::Disabled),
            RewardStatus::Expired => return Err(RedeemBlock::Expired),
            RewardStatus::OutOfStock => return Err(RedeemBlock::OutOfStock),
            RewardStatus::Available => {}
        }
        if let Some(cap) = reward.max_per_user {
            if user_redemptions >= cap {
                return Err(RedeemBlock::PerUserCapReached);
            }
        }
        Ok(())
    }

    /// Full redeemability check: availability, caps, and balance.
    pub fn can_user_redeem(
        &self,
        reward: &Reward,
        stats: &UserStats,
        user_redemptions: u32,
        now: DateTime<Utc>,
    ) -> bool {
        self.availability(reward, user_redemptions, now).is_ok() && stats.points >= reward.cost
    }

    /// Bookkeeping for a validated redemption: increments the counter
    /// and auto-disables the reward once a bounded stock is exhausted.
    /// Returns true when this redemption exhausted the stock.
    pub fn apply_redemption(&self, reward: &mut Reward) -> bool {
        reward.times_redeemed += 1;
        if let Some(cap) = reward.quantity_available {
            if reward.times_redeemed >= cap && reward.is_available {
                reward.is_available = false;
                return true;
            }
        }
        false
    }

    /// Admin update of the stock cap. A cap above the redemption count
    /// re-enables the reward unless it has expired; a cap at or below it
    /// disables it.
    pub fn update_quantity(
        &self,
        reward: &mut Reward,
        new_quantity: Option<u32>,
        now: DateTime<Utc>,
    ) {
        reward.quantity_available = new_quantity;
        if !reward.is_in_stock() {
            reward.is_available = false;
        } else if !reward.is_expired(now) {
            reward.is_available = true;
        }
    }

    /// Admin update of the expiry. Re-enables the reward when it is in
    /// stock and not expired under the new deadline.
    pub fn update_expiration(
        &self,
        reward: &mut Reward,
        new_expiry: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        reward.expires_at = new_expiry;
        if !reward.is_expired(now) && reward.is_in_stock() {
            reward.is_available = true;
        }
    }
}
