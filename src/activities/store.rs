//! Activity and activity registration persistence.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::types::{Activity, ActivityRegistration};
use crate::registration::Document;
use crate::storage::database::{
    parse_date, parse_json, parse_timestamp, parse_uuid, to_json, DatabaseError,
};
use crate::storage::PageRequest;

const ACTIVITY_COLUMNS: &str = "a.id, a.name, a.slug, a.description, a.activity_start, a.activity_end,
    a.registration_start, a.registration_end, a.selection_start, a.selection_end,
    a.minimum_level, a.activity_type, a.activity_category, a.additional_config_json,
    a.is_published, a.created_at, a.updated_at";

const REGISTRATION_COLUMNS: &str =
    "r.id, r.user_id, r.activity_id, r.status, r.questionnaire_answer_json, r.created_at, r.updated_at";

/// Filter for the public activity listing.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub category: Option<i32>,
}

/// Store for activities and their registrations.
pub struct ActivityStore<'a> {
    conn: &'a Connection,
}

impl<'a> ActivityStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Activities ==========

    /// Insert an activity and return its id.
    pub fn insert_activity(&self, activity: &Activity) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO activities (name, slug, description, activity_start, activity_end,
                                     registration_start, registration_end, selection_start,
                                     selection_end, minimum_level, activity_type, activity_category,
                                     additional_config_json, is_published, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                activity.name,
                activity.slug,
                activity.description,
                activity.activity_start.map(|d| d.to_string()),
                activity.activity_end.map(|d| d.to_string()),
                activity.registration_start.map(|d| d.to_string()),
                activity.registration_end.map(|d| d.to_string()),
                activity.selection_start.map(|d| d.to_string()),
                activity.selection_end.map(|d| d.to_string()),
                activity.minimum_level,
                activity.activity_type,
                activity.activity_category,
                to_json(&activity.additional_config)?,
                activity.is_published,
                activity.created_at.to_rfc3339(),
                activity.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get an activity by slug, published or not.
    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Activity>, DatabaseError> {
        let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities a WHERE a.slug = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![slug])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_activity(row, 0)?)),
            None => Ok(None),
        }
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Activity>, DatabaseError> {
        let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities a WHERE a.id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_activity(row, 0)?)),
            None => Ok(None),
        }
    }

    /// Published activities, newest first, with the unpaged total.
    pub fn list_published(
        &self,
        filter: &ActivityFilter,
        page: PageRequest,
    ) -> Result<(Vec<Activity>, u64), DatabaseError> {
        let pattern = format!("%{}%", filter.search.as_deref().unwrap_or(""));
        let where_clause = "a.is_published = 1
             AND a.name LIKE ?1
             AND (?2 IS NULL OR a.activity_category = ?2)";

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM activities a WHERE {where_clause}"),
            params![pattern, filter.category],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities a WHERE {where_clause}
             ORDER BY a.id DESC LIMIT ?3 OFFSET ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![
            pattern,
            filter.category,
            page.limit(),
            page.offset() as i64
        ])?;

        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(row_to_activity(row, 0)?);
        }

        Ok((activities, total.max(0) as u64))
    }

    /// Distinct categories among published activities.
    pub fn categories(&self) -> Result<Vec<i32>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT activity_category FROM activities
             WHERE is_published = 1 ORDER BY activity_category",
        )?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i32>, _>>()?;
        Ok(categories)
    }

    // ========== Registrations ==========

    pub fn find_registration(
        &self,
        user_id: &Uuid,
        activity_id: i64,
    ) -> Result<Option<ActivityRegistration>, DatabaseError> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM activity_registrations r
             WHERE r.user_id = ?1 AND r.activity_id = ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user_id.to_string(), activity_id])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_registration(row, 0)?)),
            None => Ok(None),
        }
    }

    pub fn find_registration_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<ActivityRegistration>, DatabaseError> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM activity_registrations r WHERE r.id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id.to_string()])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_registration(row, 0)?)),
            None => Ok(None),
        }
    }

    /// Insert a registration. A duplicate (user, activity) pair is a constraint violation.
    pub fn insert_registration(&self, registration: &ActivityRegistration) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO activity_registrations (id, user_id, activity_id, status,
                                                 questionnaire_answer_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                registration.id.to_string(),
                registration.user_id.to_string(),
                registration.activity_id,
                registration.status,
                to_json(&registration.questionnaire_answer)?,
                registration.created_at.to_rfc3339(),
                registration.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update_answers(&self, id: &Uuid, answers: &Document) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE activity_registrations SET questionnaire_answer_json = ?2, updated_at = ?3
             WHERE id = ?1",
            params![id.to_string(), to_json(answers)?, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Overwrite a registration's status.
    pub fn set_status(&self, id: &Uuid, status: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE activity_registrations SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), status, Utc::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// A user's registrations joined with their activities, newest first.
    pub fn list_for_user(
        &self,
        user_id: &Uuid,
        page: PageRequest,
    ) -> Result<(Vec<(ActivityRegistration, Activity)>, u64), DatabaseError> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM activity_registrations WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS}, {ACTIVITY_COLUMNS}
             FROM activity_registrations r
             JOIN activities a ON a.id = r.activity_id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            page.limit(),
            page.offset() as i64
        ])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push((row_to_registration(row, 0)?, row_to_activity(row, 7)?));
        }

        Ok((items, total.max(0) as u64))
    }
}

/// Convert `ACTIVITY_COLUMNS` starting at column `base`.
fn row_to_activity(row: &Row<'_>, base: usize) -> Result<Activity, DatabaseError> {
    let config: String = row.get(base + 13)?;
    let created_at: String = row.get(base + 15)?;
    let updated_at: String = row.get(base + 16)?;

    Ok(Activity {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        slug: row.get(base + 2)?,
        description: row.get(base + 3)?,
        activity_start: parse_date(row.get(base + 4)?)?,
        activity_end: parse_date(row.get(base + 5)?)?,
        registration_start: parse_date(row.get(base + 6)?)?,
        registration_end: parse_date(row.get(base + 7)?)?,
        selection_start: parse_date(row.get(base + 8)?)?,
        selection_end: parse_date(row.get(base + 9)?)?,
        minimum_level: row.get(base + 10)?,
        activity_type: row.get(base + 11)?,
        activity_category: row.get(base + 12)?,
        additional_config: parse_json(&config)?,
        is_published: row.get(base + 14)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Convert `REGISTRATION_COLUMNS` starting at column `base`.
fn row_to_registration(row: &Row<'_>, base: usize) -> Result<ActivityRegistration, DatabaseError> {
    let id: String = row.get(base)?;
    let user_id: String = row.get(base + 1)?;
    let answers: String = row.get(base + 4)?;
    let created_at: String = row.get(base + 5)?;
    let updated_at: String = row.get(base + 6)?;

    Ok(ActivityRegistration {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        activity_id: row.get(base + 2)?,
        status: row.get(base + 3)?,
        questionnaire_answer: parse_json(&answers)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
