//! Challenge and participation queries.

use super::{ts_from_sql, ts_to_sql, GameStore};
use crate::challenge::{Challenge, CompletionCriteria};
use crate::error::GameResult;
use crate::types::ChallengeId;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

impl GameStore {
    pub fn insert_challenge(&self, c: &Challenge) -> GameResult<()> {
        let criteria = serde_json::to_string(&c.criteria)?;
        self.conn().execute(
            "INSERT INTO challenge (challenge_id, household_id, title, description,
                                    point_reward, due_date, max_participants, criteria,
                                    is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                c.challenge_id,
                c.household_id,
                c.title,
                c.description,
                c.point_reward,
                c.due_date.map(ts_to_sql),
                c.max_participants,
                criteria,
                c.is_active,
                ts_to_sql(c.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_challenge(&self, challenge_id: &str) -> GameResult<Option<Challenge>> {
        let challenge = self
            .conn()
            .query_row(
                "SELECT challenge_id, household_id, title, description, point_reward,
                        due_date, max_participants, criteria, is_active, created_at
                 FROM challenge WHERE challenge_id = ?1",
                params![challenge_id],
                challenge_row_mapper,
            )
            .optional()?;
        Ok(challenge)
    }

    pub fn set_challenge_active(&self, challenge_id: &str, active: bool) -> GameResult<()> {
        self.conn().execute(
            "UPDATE challenge SET is_active = ?1 WHERE challenge_id = ?2",
            params![active, challenge_id],
        )?;
        Ok(())
    }

    pub fn list_challenges(&self, household_id: &str) -> GameResult<Vec<Challenge>> {
        let mut stmt = self.conn().prepare(
            "SELECT challenge_id, household_id, title, description, point_reward,
                    due_date, max_participants, criteria, is_active, created_at
             FROM challenge WHERE household_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![household_id], challenge_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Participation ──────────────────────────────────────────

    pub fn add_participant(
        &self,
        challenge_id: &str,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> GameResult<()> {
        self.conn().execute(
            "INSERT INTO challenge_participant (challenge_id, user_id, joined_at)
             VALUES (?1, ?2, ?3)",
            params![challenge_id, user_id, ts_to_sql(joined_at)],
        )?;
        Ok(())
    }

    /// Remove a participant who has not completed the challenge.
    /// Completed rows are history and stay. Returns true if a row was
    /// removed.
    pub fn remove_participant(&self, challenge_id: &str, user_id: &str) -> GameResult<bool> {
        let removed = self.conn().execute(
            "DELETE FROM challenge_participant
             WHERE challenge_id = ?1 AND user_id = ?2 AND completed_at IS NULL",
            params![challenge_id, user_id],
        )?;
        Ok(removed > 0)
    }

    pub fn is_participant(&self, challenge_id: &str, user_id: &str) -> GameResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM challenge_participant
             WHERE challenge_id = ?1 AND user_id = ?2",
            params![challenge_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn participant_count(&self, challenge_id: &str) -> GameResult<u32> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM challenge_participant WHERE challenge_id = ?1",
            params![challenge_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    pub fn challenge_completed_by(&self, challenge_id: &str, user_id: &str) -> GameResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM challenge_participant
             WHERE challenge_id = ?1 AND user_id = ?2 AND completed_at IS NOT NULL",
            params![challenge_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn mark_challenge_completed(
        &self,
        challenge_id: &str,
        user_id: &str,
        completed_at: DateTime<Utc>,
    ) -> GameResult<()> {
        self.conn().execute(
            "UPDATE challenge_participant SET completed_at = ?1
             WHERE challenge_id = ?2 AND user_id = ?3 AND completed_at IS NULL",
            params![ts_to_sql(completed_at), challenge_id, user_id],
        )?;
        Ok(())
    }

    /// Challenges the user participates in but has not completed.
    pub fn open_participations(&self, user_id: &str) -> GameResult<Vec<ChallengeId>> {
        let mut stmt = self.conn().prepare(
            "SELECT challenge_id FROM challenge_participant
             WHERE user_id = ?1 AND completed_at IS NULL
             ORDER BY joined_at ASC",
        )?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn completed_challenge_count(&self, user_id: &str) -> GameResult<i64> {
        self.conn()
            .query_row(
                "SELECT COUNT(*) FROM challenge_participant
                 WHERE user_id = ?1 AND completed_at IS NOT NULL",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}

fn challenge_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Challenge> {
    let due_raw: Option<String> = row.get(5)?;
    let criteria_raw: String = row.get(7)?;
    let criteria: CompletionCriteria = serde_json::from_str(&criteria_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Challenge {
        challenge_id: row.get(0)?,
        household_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        point_reward: row.get(4)?,
        due_date: due_raw.map(|raw| ts_from_sql(5, raw)).transpose()?,
        max_participants: row.get::<_, Option<i64>>(6)?.map(|v| v as u32),
        criteria,
        is_active: row.get(8)?,
        created_at: ts_from_sql(9, row.get(9)?)?,
    })
}
