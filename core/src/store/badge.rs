//! Badge catalog and earned-by edge queries.

use super::{ts_to_sql, GameStore};
use crate::badge::{Badge, BadgeFacts, BadgeKind, Rarity};
use crate::error::GameResult;
use crate::types::BadgeId;
use crate::user::UserStats;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;

impl GameStore {
    /// Insert a badge definition; existing definitions are left alone so
    /// catalog seeding is repeatable.
    pub fn insert_badge(&self, badge: &Badge) -> GameResult<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO badge
                (badge_id, name, description, icon, kind, requirement, rarity, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                badge.badge_id,
                badge.name,
                badge.description,
                badge.icon,
                badge.kind.as_str(),
                badge.requirement,
                badge.rarity.as_str(),
                badge.is_active,
            ],
        )?;
        Ok(())
    }

    pub fn get_badge(&self, badge_id: &str) -> GameResult<Option<Badge>> {
        let badge = self
            .conn()
            .query_row(
                "SELECT badge_id, name, description, icon, kind, requirement, rarity, is_active
                 FROM badge WHERE badge_id = ?1",
                params![badge_id],
                badge_row_mapper,
            )
            .optional()?;
        Ok(badge)
    }

    pub fn list_active_badges(&self) -> GameResult<Vec<Badge>> {
        let mut stmt = self.conn().prepare(
            "SELECT badge_id, name, description, icon, kind, requirement, rarity, is_active
             FROM badge WHERE is_active = 1 ORDER BY badge_id",
        )?;
        let rows = stmt.query_map([], badge_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Soft-disable or re-enable a badge. Definitions are never deleted.
    pub fn set_badge_active(&self, badge_id: &str, active: bool) -> GameResult<()> {
        self.conn().execute(
            "UPDATE badge SET is_active = ?1 WHERE badge_id = ?2",
            params![active, badge_id],
        )?;
        Ok(())
    }

    pub fn insert_badge_earned(
        &self,
        user_id: &str,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> GameResult<()> {
        self.conn().execute(
            "INSERT INTO badge_earned (user_id, badge_id, earned_at) VALUES (?1, ?2, ?3)",
            params![user_id, badge_id, ts_to_sql(earned_at)],
        )?;
        Ok(())
    }

    pub fn badge_earned(&self, user_id: &str, badge_id: &str) -> GameResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM badge_earned WHERE user_id = ?1 AND badge_id = ?2",
            params![user_id, badge_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn earned_badge_ids(&self, user_id: &str) -> GameResult<HashSet<BadgeId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT badge_id FROM badge_earned WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn earned_badge_count(&self, user_id: &str) -> GameResult<i64> {
        self.conn()
            .query_row(
                "SELECT COUNT(*) FROM badge_earned WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Assemble everything the badge evaluator reads about a user.
    pub fn badge_facts(&self, user_id: &str) -> GameResult<BadgeFacts> {
        let stats: UserStats = self.conn().query_row(
            "SELECT points, streak_days, total_tasks_completed
             FROM app_user WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserStats {
                    points: row.get(0)?,
                    streak_days: row.get::<_, i64>(1)? as u32,
                    total_tasks_completed: row.get::<_, i64>(2)? as u32,
                })
            },
        )?;
        let redemptions: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM reward_redemption WHERE redeemed_by = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(BadgeFacts {
            stats,
            active_memberships: self.active_membership_count(user_id)?,
            redemption_count: redemptions as u32,
            earned: self.earned_badge_ids(user_id)?,
        })
    }
}

fn badge_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Badge> {
    let kind_raw: String = row.get(4)?;
    let rarity_raw: String = row.get(6)?;
    Ok(Badge {
        badge_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        kind: BadgeKind::parse(&kind_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown badge kind '{kind_raw}'").into(),
            )
        })?,
        requirement: row.get(5)?,
        rarity: Rarity::parse(&rarity_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("unknown rarity '{rarity_raw}'").into(),
            )
        })?,
        is_active: row.get(7)?,
    })
}
