//! SQLite persistence layer.
//!
//! RULE: only the store talks to the database. Domain components compute
//! over values; the engine calls store methods and owns the transaction
//! boundary around each compound operation.

use crate::error::GameResult;
use crate::event::ActivityRecord;
use crate::types::Points;
use crate::user::{HouseholdRecord, UserRecord, UserStats};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;

mod badge;
mod challenge;
mod reward;

pub struct GameStore {
    conn: Connection,
}

/// Timestamps are stored as RFC 3339 TEXT, calendar days as `YYYY-MM-DD`.
pub(crate) fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn ts_from_sql(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn day_to_sql(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub(crate) fn day_from_sql(idx: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl GameStore {
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only applies to real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests and the demo runner).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_badges.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_rewards.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_challenges.sql"))?;
        Ok(())
    }

    /// Run `f` inside one transaction. Commits on Ok, rolls back on Err —
    /// a failed compound operation leaves no partial state behind.
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&GameStore) -> GameResult<T>,
    ) -> GameResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        match f(self) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => Err(e), // tx dropped, rolls back
        }
    }

    // ── Household ──────────────────────────────────────────────

    pub fn insert_household(&self, h: &HouseholdRecord) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO household (household_id, name, invite_code, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![h.household_id, h.name, h.invite_code, ts_to_sql(h.created_at)],
        )?;
        Ok(())
    }

    pub fn get_household(&self, household_id: &str) -> GameResult<Option<HouseholdRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT household_id, name, invite_code, created_at
                 FROM household WHERE household_id = ?1",
                params![household_id],
                |row| {
                    Ok(HouseholdRecord {
                        household_id: row.get(0)?,
                        name: row.get(1)?,
                        invite_code: row.get(2)?,
                        created_at: ts_from_sql(3, row.get(3)?)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn find_household_by_invite(&self, code: &str) -> GameResult<Option<HouseholdRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT household_id, name, invite_code, created_at
                 FROM household WHERE invite_code = ?1",
                params![code],
                |row| {
                    Ok(HouseholdRecord {
                        household_id: row.get(0)?,
                        name: row.get(1)?,
                        invite_code: row.get(2)?,
                        created_at: ts_from_sql(3, row.get(3)?)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // ── User ───────────────────────────────────────────────────

    pub fn insert_user(&self, u: &UserRecord) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO app_user (user_id, display_name, points, streak_days,
                                   total_tasks_completed, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                u.user_id,
                u.display_name,
                u.stats.points,
                u.stats.streak_days,
                u.stats.total_tasks_completed,
                ts_to_sql(u.joined_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> GameResult<Option<UserRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT user_id, display_name, points, streak_days,
                        total_tasks_completed, joined_at
                 FROM app_user WHERE user_id = ?1",
                params![user_id],
                user_row_mapper,
            )
            .optional()?;
        Ok(record)
    }

    pub fn update_user_stats(&self, user_id: &str, stats: &UserStats) -> GameResult<()> {
        self.conn.execute(
            "UPDATE app_user
             SET points = ?1, streak_days = ?2, total_tasks_completed = ?3
             WHERE user_id = ?4",
            params![
                stats.points,
                stats.streak_days,
                stats.total_tasks_completed,
                user_id
            ],
        )?;
        Ok(())
    }

    // ── Membership ─────────────────────────────────────────────

    pub fn add_membership(
        &self,
        household_id: &str,
        user_id: &str,
        role: &str,
        joined_at: DateTime<Utc>,
    ) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO membership (household_id, user_id, role, active, joined_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![household_id, user_id, role, ts_to_sql(joined_at)],
        )?;
        Ok(())
    }

    pub fn is_member(&self, household_id: &str, user_id: &str) -> GameResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM membership
             WHERE household_id = ?1 AND user_id = ?2 AND active = 1",
            params![household_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn active_membership_count(&self, user_id: &str) -> GameResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM membership WHERE user_id = ?1 AND active = 1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// Household members ordered by points, highest first.
    pub fn leaderboard(&self, household_id: &str) -> GameResult<Vec<UserRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.user_id, u.display_name, u.points, u.streak_days,
                    u.total_tasks_completed, u.joined_at
             FROM app_user u
             JOIN membership m ON m.user_id = u.user_id
             WHERE m.household_id = ?1 AND m.active = 1
             ORDER BY u.points DESC, u.user_id ASC",
        )?;
        let rows = stmt.query_map(params![household_id], user_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Task completions ───────────────────────────────────────

    pub fn record_task_completion(
        &self,
        household_id: &str,
        user_id: &str,
        day: NaiveDate,
        title: &str,
        points: Points,
        completed_at: DateTime<Utc>,
    ) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO task_completion (household_id, user_id, day, title, points, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                household_id,
                user_id,
                day_to_sql(day),
                title,
                points,
                ts_to_sql(completed_at),
            ],
        )?;
        Ok(())
    }

    /// Distinct calendar days on which the user completed at least one task.
    pub fn completed_days(&self, user_id: &str) -> GameResult<BTreeSet<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT day FROM task_completion WHERE user_id = ?1")?;
        let days = stmt
            .query_map(params![user_id], |row| day_from_sql(0, row.get(0)?))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(days)
    }

    /// Completions on or after `since` (inclusive).
    pub fn tasks_completed_since(&self, user_id: &str, since: NaiveDate) -> GameResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM task_completion WHERE user_id = ?1 AND day >= ?2",
            params![user_id, day_to_sql(since)],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    // ── Activity log ───────────────────────────────────────────

    pub fn append_activity(&self, entry: &ActivityRecord) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO activity_log (household_id, actor, entity_kind, entity_id,
                                       points_delta, event_type, action, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.household_id,
                entry.actor,
                entry.entity_kind,
                entry.entity_id,
                entry.points_delta,
                entry.event_type,
                entry.action,
                entry.payload,
                ts_to_sql(entry.recorded_at),
            ],
        )?;
        Ok(())
    }

    /// Most recent entries for a household, newest first.
    pub fn activity_feed(&self, household_id: &str, limit: usize) -> GameResult<Vec<ActivityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, household_id, actor, entity_kind, entity_id,
                    points_delta, event_type, action, payload, recorded_at
             FROM activity_log WHERE household_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![household_id, limit as i64], activity_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Entries attributed to a user, newest first.
    pub fn user_activity(&self, user_id: &str, limit: usize) -> GameResult<Vec<ActivityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, household_id, actor, entity_kind, entity_id,
                    points_delta, event_type, action, payload, recorded_at
             FROM activity_log WHERE actor = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], activity_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn activity_count(&self, household_id: &str) -> GameResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM activity_log WHERE household_id = ?1",
                params![household_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn user_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        display_name: row.get(1)?,
        stats: UserStats {
            points: row.get(2)?,
            streak_days: row.get::<_, i64>(3)? as u32,
            total_tasks_completed: row.get::<_, i64>(4)? as u32,
        },
        joined_at: ts_from_sql(5, row.get(5)?)?,
    })
}

fn activity_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActivityRecord> {
    Ok(ActivityRecord {
        id: Some(row.get(0)?),
        household_id: row.get(1)?,
        actor: row.get(2)?,
        entity_kind: row.get(3)?,
        entity_id: row.get(4)?,
        points_delta: row.get(5)?,
        event_type: row.get(6)?,
        action: row.get(7)?,
        payload: row.get(8)?,
        recorded_at: ts_from_sql(9, row.get(9)?)?,
    })
}
