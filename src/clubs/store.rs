//! Club and club registration persistence.

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::types::{Club, ClubRegistration};
use crate::storage::database::{
    parse_date, parse_json, parse_timestamp, parse_uuid, to_json, DatabaseError,
};
use crate::storage::PageRequest;

const CLUB_COLUMNS: &str = "c.id, c.name, c.description, c.short_description, c.logo, c.media_json,
    c.start_period, c.end_period, c.is_show, c.registration_info_json, c.created_at, c.updated_at";

const REGISTRATION_COLUMNS: &str =
    "r.id, r.club_id, r.member_id, r.status, r.additional_data_json, r.created_at, r.updated_at";

/// Store for clubs and their registrations.
pub struct ClubStore<'a> {
    conn: &'a Connection,
}

impl<'a> ClubStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Clubs ==========

    pub fn insert_club(&self, club: &Club) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO clubs (name, description, short_description, logo, media_json,
                                start_period, end_period, is_show, registration_info_json,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                club.name,
                club.description,
                club.short_description,
                club.logo,
                to_json(&club.media)?,
                club.start_period.map(|d| d.to_string()),
                club.end_period.map(|d| d.to_string()),
                club.is_show,
                to_json(&club.registration_info)?,
                club.created_at.to_rfc3339(),
                club.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_club(&self, id: i64) -> Result<Option<Club>, DatabaseError> {
        let sql = format!("SELECT {CLUB_COLUMNS} FROM clubs c WHERE c.id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_club(row, 0)?)),
            None => Ok(None),
        }
    }

    /// Shown clubs, newest first, with the unpaged total.
    pub fn list_shown(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Club>, u64), DatabaseError> {
        let pattern = format!("%{}%", search.unwrap_or(""));

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM clubs c WHERE c.is_show = 1 AND c.name LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {CLUB_COLUMNS} FROM clubs c
             WHERE c.is_show = 1 AND c.name LIKE ?1
             ORDER BY c.id DESC LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![pattern, page.limit(), page.offset() as i64])?;

        let mut clubs = Vec::new();
        while let Some(row) = rows.next()? {
            clubs.push(row_to_club(row, 0)?);
        }

        Ok((clubs, total.max(0) as u64))
    }

    // ========== Registrations ==========

    pub fn find_registration(
        &self,
        member_id: &Uuid,
        club_id: i64,
    ) -> Result<Option<ClubRegistration>, DatabaseError> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM club_registrations r
             WHERE r.member_id = ?1 AND r.club_id = ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![member_id.to_string(), club_id])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_registration(row, 0)?)),
            None => Ok(None),
        }
    }

    /// Insert a registration. A duplicate (member, club) pair is a constraint violation.
    pub fn insert_registration(&self, registration: &ClubRegistration) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO club_registrations (id, club_id, member_id, status,
                                             additional_data_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                registration.id.to_string(),
                registration.club_id,
                registration.member_id.to_string(),
                registration.status,
                to_json(&registration.additional_data)?,
                registration.created_at.to_rfc3339(),
                registration.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update_additional_data(&self, registration: &ClubRegistration) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE club_registrations SET additional_data_json = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                registration.id.to_string(),
                to_json(&registration.additional_data)?,
                registration.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Overwrite a registration's status.
    pub fn set_status(&self, id: &Uuid, status: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE club_registrations SET status = ?2 WHERE id = ?1",
            params![id.to_string(), status],
        )?;
        Ok(changed > 0)
    }

    /// Hard delete.
    pub fn delete_registration(&self, id: &Uuid) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM club_registrations WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// A member's registrations with their clubs, newest first.
    pub fn list_for_member(
        &self,
        member_id: &Uuid,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<(ClubRegistration, Club)>, u64), DatabaseError> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM club_registrations
             WHERE member_id = ?1 AND (?2 IS NULL OR status = ?2)",
            params![member_id.to_string(), status],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS}, {CLUB_COLUMNS}
             FROM club_registrations r
             JOIN clubs c ON c.id = r.club_id
             WHERE r.member_id = ?1 AND (?2 IS NULL OR r.status = ?2)
             ORDER BY r.created_at DESC
             LIMIT ?3 OFFSET ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![
            member_id.to_string(),
            status,
            page.limit(),
            page.offset() as i64
        ])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push((row_to_registration(row, 0)?, row_to_club(row, 7)?));
        }

        Ok((items, total.max(0) as u64))
    }
}

/// Convert `CLUB_COLUMNS` starting at column `base`.
fn row_to_club(row: &Row<'_>, base: usize) -> Result<Club, DatabaseError> {
    let media: String = row.get(base + 5)?;
    let info: String = row.get(base + 9)?;
    let created_at: String = row.get(base + 10)?;
    let updated_at: String = row.get(base + 11)?;

    Ok(Club {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        description: row.get(base + 2)?,
        short_description: row.get(base + 3)?,
        logo: row.get(base + 4)?,
        media: parse_json(&media)?,
        start_period: parse_date(row.get(base + 6)?)?,
        end_period: parse_date(row.get(base + 7)?)?,
        is_show: row.get(base + 8)?,
        registration_info: parse_json(&info)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Convert `REGISTRATION_COLUMNS` starting at column `base`.
fn row_to_registration(row: &Row<'_>, base: usize) -> Result<ClubRegistration, DatabaseError> {
    let id: String = row.get(base)?;
    let member_id: String = row.get(base + 2)?;
    let data: String = row.get(base + 4)?;
    let created_at: String = row.get(base + 5)?;
    let updated_at: String = row.get(base + 6)?;

    Ok(ClubRegistration {
        id: parse_uuid(&id)?,
        club_id: row.get(base + 1)?,
        member_id: parse_uuid(&member_id)?,
        status: row.get(base + 3)?,
        additional_data: parse_json(&data)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_list_shown_clubs() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let store = ClubStore::new(&conn);

        store.insert_club(&Club::new("Robotika")).unwrap();
        store.insert_club(&Club::new("Fotografi")).unwrap();
        let mut hidden = Club::new("Robot Rahasia");
        hidden.is_show = false;
        store.insert_club(&hidden).unwrap();

        let (clubs, total) = store.list_shown(None, PageRequest::default()).unwrap();
        assert_eq!(total, 2);
        assert_eq!(clubs[0].name, "Fotografi");

        let (clubs, total) = store.list_shown(Some("robot"), PageRequest::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(clubs[0].name, "Robotika");
    }

    #[test]
    fn test_migrated_registration_info_decodes() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        conn.execute(
            "INSERT INTO clubs (name, created_at, updated_at)
             VALUES ('Lama', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();

        let club = ClubStore::new(&conn).find_club(1).unwrap().unwrap();
        assert_eq!(club.registration_info.after_registration_info, "");
        assert!(club.media.items.is_empty());
    }
}
