//! User and household records as the domain sees them.
//!
//! Persistence mapping lives in the store; these are plain values.

use crate::types::{HouseholdId, Points, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The mutable statistics the ledger and streak tracker maintain.
/// `points` is the single balance of record — it is not recomputed
/// from history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub points: Points,
    pub streak_days: u32,
    pub total_tasks_completed: u32,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub display_name: String,
    pub stats: UserStats,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HouseholdRecord {
    pub household_id: HouseholdId,
    pub name: String,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}
