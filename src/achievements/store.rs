//! Achievement and leaderboard persistence.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::types::{Achievement, LeaderboardEntry, STATUS_PENDING};
use crate::storage::database::{parse_date, parse_timestamp, parse_uuid, DatabaseError};
use crate::storage::PageRequest;

const ACHIEVEMENT_COLUMNS: &str = "id, user_id, name, description, achievement_date, achievement_type,
    score, proof, status, approver_id, approved_at, created_at, updated_at";

/// Store for achievements and the externally maintained leaderboards.
pub struct AchievementStore<'a> {
    conn: &'a Connection,
}

impl<'a> AchievementStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Achievements ==========

    pub fn insert(&self, achievement: &Achievement) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO achievements (id, user_id, name, description, achievement_date,
                                       achievement_type, score, proof, status, approver_id,
                                       approved_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                achievement.id.to_string(),
                achievement.user_id.to_string(),
                achievement.name,
                achievement.description,
                achievement.achievement_date.to_string(),
                achievement.achievement_type,
                achievement.score,
                achievement.proof,
                achievement.status,
                achievement.approver_id,
                achievement.approved_at.map(|d| d.to_string()),
                achievement.created_at.to_rfc3339(),
                achievement.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find(&self, id: &Uuid) -> Result<Option<Achievement>, DatabaseError> {
        let sql = format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id.to_string()])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_achievement(row)?)),
            None => Ok(None),
        }
    }

    /// Persist submitter-editable fields of an owned, still pending achievement.
    /// Score, status, and approval are left alone. Returns false when no
    /// pending row owned by the submitter matched.
    pub fn update_submission(&self, achievement: &Achievement) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE achievements SET name = ?2, description = ?3, achievement_date = ?4,
                                     achievement_type = ?5, proof = ?6, updated_at = ?7
             WHERE id = ?1 AND user_id = ?8 AND status = ?9",
            params![
                achievement.id.to_string(),
                achievement.name,
                achievement.description,
                achievement.achievement_date.to_string(),
                achievement.achievement_type,
                achievement.proof,
                achievement.updated_at.to_rfc3339(),
                achievement.user_id.to_string(),
                STATUS_PENDING,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Record an admin decision.
    pub fn set_review(&self, id: &Uuid, status: i32, score: i32) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE achievements SET status = ?2, score = ?3 WHERE id = ?1",
            params![id.to_string(), status, score],
        )?;
        Ok(changed > 0)
    }

    /// A user's achievements, latest achievement date first.
    pub fn list_for_user(
        &self,
        user_id: &Uuid,
        page: PageRequest,
    ) -> Result<(Vec<Achievement>, u64), DatabaseError> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM achievements WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE user_id = ?1
             ORDER BY achievement_date DESC, created_at DESC LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            page.limit(),
            page.offset() as i64
        ])?;

        let mut achievements = Vec::new();
        while let Some(row) = rows.next()? {
            achievements.push(row_to_achievement(row)?);
        }

        Ok((achievements, total.max(0) as u64))
    }

    // ========== Leaderboards ==========

    /// Entries for the month starting on `month`, highest score first.
    pub fn monthly(
        &self,
        month: NaiveDate,
        page: PageRequest,
    ) -> Result<(Vec<LeaderboardEntry>, u64), DatabaseError> {
        let month = month.to_string();
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM monthly_leaderboards WHERE month = ?1",
            params![month],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT l.user_id, l.month, l.score, p.name, p.picture
             FROM monthly_leaderboards l
             LEFT JOIN profiles p ON p.user_id = l.user_id
             WHERE l.month = ?1
             ORDER BY l.score DESC, l.id ASC
             LIMIT ?2 OFFSET ?3",
        )?;
        let mut rows = stmt.query(params![month, page.limit(), page.offset() as i64])?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row, true)?);
        }

        Ok((entries, total.max(0) as u64))
    }

    /// All-time entries, highest score first.
    pub fn lifetime(&self, page: PageRequest) -> Result<(Vec<LeaderboardEntry>, u64), DatabaseError> {
        let total: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM lifetime_leaderboards", [], |row| row.get(0))?;

        let mut stmt = self.conn.prepare(
            "SELECT l.user_id, NULL, l.score, p.name, p.picture
             FROM lifetime_leaderboards l
             LEFT JOIN profiles p ON p.user_id = l.user_id
             ORDER BY l.score DESC, l.id ASC
             LIMIT ?1 OFFSET ?2",
        )?;
        let mut rows = stmt.query(params![page.limit(), page.offset() as i64])?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row, false)?);
        }

        Ok((entries, total.max(0) as u64))
    }
}

fn row_to_achievement(row: &Row<'_>) -> Result<Achievement, DatabaseError> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(Achievement {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        name: row.get(2)?,
        description: row.get(3)?,
        achievement_date: parse_date(Some(row.get(4)?))?.unwrap_or_default(),
        achievement_type: row.get(5)?,
        score: row.get(6)?,
        proof: row.get(7)?,
        status: row.get(8)?,
        approver_id: row.get(9)?,
        approved_at: parse_date(row.get(10)?)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_entry(row: &Row<'_>, monthly: bool) -> Result<LeaderboardEntry, DatabaseError> {
    let user_id: String = row.get(0)?;
    let month = if monthly { parse_date(row.get(1)?)? } else { None };

    Ok(LeaderboardEntry {
        user_id: parse_uuid(&user_id)?,
        month,
        score: row.get(2)?,
        name: row.get(3)?,
        picture: row.get(4)?,
    })
}
