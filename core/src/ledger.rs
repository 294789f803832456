//! Points ledger — the only mutator of a user's point balance.
//!
//! RULE: a debit that would take the balance below zero is rejected and
//! changes nothing. There is no partial application.

use crate::error::{GameError, GameResult};
use crate::event::ActivityEvent;
use crate::types::Points;
use crate::user::UserStats;

pub struct PointsLedger;

/// Result of a ledger mutation: the new balance plus the activity entry
/// the caller must persist in the same transaction.
#[derive(Debug, Clone)]
pub struct LedgerOutcome {
    pub balance: Points,
    pub event: ActivityEvent,
}

impl PointsLedger {
    pub fn credit(
        &self,
        user_id: &str,
        stats: &mut UserStats,
        amount: Points,
        reason: &str,
    ) -> GameResult<LedgerOutcome> {
        if amount < 0 {
            return Err(GameError::InvalidAmount { amount });
        }
        stats.points += amount;
        log::debug!("ledger: {user_id} +{amount} pts ({reason}), balance {}", stats.points);
        Ok(LedgerOutcome {
            balance: stats.points,
            event: ActivityEvent::PointsCredited {
                user_id: user_id.to_string(),
                amount,
                balance_after: stats.points,
                reason: reason.to_string(),
            },
        })
    }

    pub fn debit(
        &self,
        user_id: &str,
        stats: &mut UserStats,
        amount: Points,
        reason: &str,
    ) -> GameResult<LedgerOutcome> {
        if amount < 0 {
            return Err(GameError::InvalidAmount { amount });
        }
        if stats.points < amount {
            return Err(GameError::InsufficientPoints {
                needed: amount,
                available: stats.points,
            });
        }
        stats.points -= amount;
        log::debug!("ledger: {user_id} -{amount} pts ({reason}), balance {}", stats.points);
        Ok(LedgerOutcome {
            balance: stats.points,
            event: ActivityEvent::PointsDebited {
                user_id: user_id.to_string(),
                amount,
                balance_after: stats.points,
                reason: reason.to_string(),
            },
        })
    }

    /// Manual adjustment: a positive delta credits, a negative delta
    /// debits (subject to the non-negative balance rule).
    pub fn adjust(
        &self,
        user_id: &str,
        stats: &mut UserStats,
        delta: Points,
        reason: &str,
    ) -> GameResult<LedgerOutcome> {
        if delta >= 0 {
            self.credit(user_id, stats, delta, reason)
        } else {
            self.debit(user_id, stats, -delta, reason)
        }
    }
}
