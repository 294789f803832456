//! Reward catalog and redemption record queries.

use super::{ts_from_sql, ts_to_sql, GameStore};
use crate::error::GameResult;
use crate::reward::{Reward, RewardRedemption};
use rusqlite::{params, OptionalExtension};

impl GameStore {
    pub fn insert_reward(&self, r: &Reward) -> GameResult<()> {
        self.conn().execute(
            "INSERT INTO reward (reward_id, household_id, name, description, cost,
                                 quantity_available, times_redeemed, max_per_user,
                                 expires_at, is_available, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                r.reward_id,
                r.household_id,
                r.name,
                r.description,
                r.cost,
                r.quantity_available,
                r.times_redeemed,
                r.max_per_user,
                r.expires_at.map(ts_to_sql),
                r.is_available,
                ts_to_sql(r.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_reward(&self, reward_id: &str) -> GameResult<Option<Reward>> {
        let reward = self
            .conn()
            .query_row(
                "SELECT reward_id, household_id, name, description, cost,
                        quantity_available, times_redeemed, max_per_user,
                        expires_at, is_available, created_at
                 FROM reward WHERE reward_id = ?1",
                params![reward_id],
                reward_row_mapper,
            )
            .optional()?;
        Ok(reward)
    }

    /// Persist mutated counters, caps, expiry, and availability.
    /// Identity and cost never change after creation.
    pub fn update_reward(&self, r: &Reward) -> GameResult<()> {
        self.conn().execute(
            "UPDATE reward
             SET quantity_available = ?1, times_redeemed = ?2, max_per_user = ?3,
                 expires_at = ?4, is_available = ?5
             WHERE reward_id = ?6",
            params![
                r.quantity_available,
                r.times_redeemed,
                r.max_per_user,
                r.expires_at.map(ts_to_sql),
                r.is_available,
                r.reward_id,
            ],
        )?;
        Ok(())
    }

    pub fn list_rewards(&self, household_id: &str) -> GameResult<Vec<Reward>> {
        let mut stmt = self.conn().prepare(
            "SELECT reward_id, household_id, name, description, cost,
                    quantity_available, times_redeemed, max_per_user,
                    expires_at, is_available, created_at
             FROM reward WHERE household_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![household_id], reward_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_redemption(&self, r: &RewardRedemption) -> GameResult<()> {
        self.conn().execute(
            "INSERT INTO reward_redemption
                (redemption_id, reward_id, redeemed_by, points_spent, redeemed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                r.redemption_id,
                r.reward_id,
                r.redeemed_by,
                r.points_spent,
                ts_to_sql(r.redeemed_at),
            ],
        )?;
        Ok(())
    }

    /// How many times this user has redeemed this reward.
    pub fn redemption_count_for_user(&self, reward_id: &str, user_id: &str) -> GameResult<u32> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM reward_redemption
             WHERE reward_id = ?1 AND redeemed_by = ?2",
            params![reward_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    pub fn redemption_count_for_reward(&self, reward_id: &str) -> GameResult<i64> {
        self.conn()
            .query_row(
                "SELECT COUNT(*) FROM reward_redemption WHERE reward_id = ?1",
                params![reward_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn redemptions_for_user(&self, user_id: &str) -> GameResult<Vec<RewardRedemption>> {
        let mut stmt = self.conn().prepare(
            "SELECT redemption_id, reward_id, redeemed_by, points_spent, redeemed_at
             FROM reward_redemption WHERE redeemed_by = ?1
             ORDER BY redeemed_at ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(RewardRedemption {
                redemption_id: row.get(0)?,
                reward_id: row.get(1)?,
                redeemed_by: row.get(2)?,
                points_spent: row.get(3)?,
                redeemed_at: ts_from_sql(4, row.get(4)?)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn reward_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reward> {
    let expires_raw: Option<String> = row.get(8)?;
    Ok(Reward {
        reward_id: row.get(0)?,
        household_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        cost: row.get(4)?,
        quantity_available: row.get::<_, Option<i64>>(5)?.map(|v| v as u32),
        times_redeemed: row.get::<_, i64>(6)? as u32,
        max_per_user: row.get::<_, Option<i64>>(7)?.map(|v| v as u32),
        expires_at: expires_raw.map(|raw| ts_from_sql(8, raw)).transpose()?,
        is_available: row.get(9)?,
        created_at: ts_from_sql(10, row.get(10)?)?,
    })
}
