//! Account, legacy member, and profile persistence.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::levels::ProgramMarkers;
use super::types::{Account, LegacyAccount, MigrationState, Profile, ProfileDetails};
use crate::storage::database::{parse_json, parse_timestamp, parse_uuid, to_json, DatabaseError};

const PROFILE_COLUMNS: &str = "user_id, name, personal_id, gender, whatsapp, tiktok, linkedin,
    line, instagram, province_id, city_id, university_id, university_temp, major,
    intake_year, level, badges_json, picture, created_at, updated_at";

/// Store over the two account pools and the profile table.
pub struct AccountStore<'a> {
    conn: &'a Connection,
}

impl<'a> AccountStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Accounts ==========

    /// Get a current account by email.
    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, password_hash, created_at, updated_at
             FROM accounts WHERE email = ?1",
        )?;
        let mut rows = stmt.query(params![email])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_account(row)?)),
            None => Ok(None),
        }
    }

    /// Get a current account by id.
    pub fn find_by_id(&self, id: &Uuid) -> Result<Option<Account>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, password_hash, created_at, updated_at
             FROM accounts WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id.to_string()])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_account(row)?)),
            None => Ok(None),
        }
    }

    pub fn insert_account(&self, account: &Account) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO accounts (id, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id.to_string(),
                account.email,
                account.password_hash,
                account.created_at.to_rfc3339(),
                account.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Replace the stored credential hash. Returns false if no such account.
    pub fn update_password(&self, id: &Uuid, password_hash: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE accounts SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), password_hash, Utc::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    // ========== Legacy Members ==========

    pub fn find_legacy_by_email(&self, email: &str) -> Result<Option<LegacyAccount>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, gender, email, phone, line_id, intake_year, password,
                    ssc, lmd, spectra
             FROM legacy_members WHERE email = ?1",
        )?;
        let mut rows = stmt.query(params![email])?;

        match rows.next()? {
            Some(row) => Ok(Some(LegacyAccount {
                id: row.get(0)?,
                name: row.get(1)?,
                gender: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                line_id: row.get(5)?,
                intake_year: row.get(6)?,
                password_digest: row.get(7)?,
                markers: ProgramMarkers::new(row.get(8)?, row.get(9)?, row.get(10)?),
            })),
            None => Ok(None),
        }
    }

    /// Resolve an email against both pools. A current account always wins.
    pub fn migration_state(&self, email: &str) -> Result<Option<MigrationState>, DatabaseError> {
        if let Some(account) = self.find_by_email(email)? {
            return Ok(Some(MigrationState::Migrated(account)));
        }
        Ok(self
            .find_legacy_by_email(email)?
            .map(MigrationState::LegacyOnly))
    }

    // ========== Profiles ==========

    pub fn get_profile(&self, user_id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user_id.to_string()])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_profile(row)?)),
            None => Ok(None),
        }
    }

    pub fn insert_profile(&self, profile: &Profile) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
        );
        self.conn.execute(
            &sql,
            params![
                profile.user_id.to_string(),
                profile.name,
                profile.personal_id,
                profile.gender,
                profile.whatsapp,
                profile.tiktok,
                profile.linkedin,
                profile.line,
                profile.instagram,
                profile.province_id,
                profile.city_id,
                profile.university_id,
                profile.university_temp,
                profile.major,
                profile.intake_year,
                profile.level,
                to_json(&profile.badges)?,
                profile.picture,
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Persist the user-editable demographic fields and picture.
    ///
    /// Level and badges are written only by `insert_profile`.
    pub fn update_profile(&self, profile: &Profile) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE profiles SET name = ?2, personal_id = ?3, gender = ?4, whatsapp = ?5,
                    tiktok = ?6, linkedin = ?7, line = ?8, instagram = ?9,
                    province_id = ?10, city_id = ?11, university_id = ?12,
                    university_temp = ?13, major = ?14, intake_year = ?15,
                    picture = ?16, updated_at = ?17
             WHERE user_id = ?1",
            params![
                profile.user_id.to_string(),
                profile.name,
                profile.personal_id,
                profile.gender,
                profile.whatsapp,
                profile.tiktok,
                profile.linkedin,
                profile.line,
                profile.instagram,
                profile.province_id,
                profile.city_id,
                profile.university_id,
                profile.university_temp,
                profile.major,
                profile.intake_year,
                profile.picture,
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Account, profile, and reference-data names for one user.
    pub fn profile_details(&self, user_id: &Uuid) -> Result<Option<ProfileDetails>, DatabaseError> {
        let Some(account) = self.find_by_id(user_id)? else {
            return Ok(None);
        };
        let Some(profile) = self.get_profile(user_id)? else {
            return Ok(None);
        };

        Ok(Some(ProfileDetails {
            province: self.reference_name("provinces", profile.province_id)?,
            city: self.reference_name("cities", profile.city_id)?,
            university: self.reference_name("universities", profile.university_id)?,
            account,
            profile,
        }))
    }

    /// Name of a university by id.
    pub fn university_name(&self, id: Option<i64>) -> Result<Option<String>, DatabaseError> {
        self.reference_name("universities", id)
    }

    fn reference_name(&self, table: &str, id: Option<i64>) -> Result<Option<String>, DatabaseError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let sql = format!("SELECT name FROM {table} WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id])?;

        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

fn row_to_account(row: &Row<'_>) -> Result<Account, DatabaseError> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(Account {
        id: parse_uuid(&id)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Convert a row selected with `PROFILE_COLUMNS`.
pub(crate) fn row_to_profile(row: &Row<'_>) -> Result<Profile, DatabaseError> {
    let user_id: String = row.get(0)?;
    let badges: String = row.get(16)?;
    let created_at: String = row.get(18)?;
    let updated_at: String = row.get(19)?;

    Ok(Profile {
        user_id: parse_uuid(&user_id)?,
        name: row.get(1)?,
        personal_id: row.get(2)?,
        gender: row.get(3)?,
        whatsapp: row.get(4)?,
        tiktok: row.get(5)?,
        linkedin: row.get(6)?,
        line: row.get(7)?,
        instagram: row.get(8)?,
        province_id: row.get(9)?,
        city_id: row.get(10)?,
        university_id: row.get(11)?,
        university_temp: row.get(12)?,
        major: row.get(13)?,
        intake_year: row.get(14)?,
        level: row.get(15)?,
        badges: parse_json(&badges)?,
        picture: row.get(17)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn seed_legacy(conn: &Connection, email: &str) {
        conn.execute(
            "INSERT INTO legacy_members (name, gender, email, password, ssc, lmd)
             VALUES ('Fulan', 'M', ?1, '5f4dcc3b5aa765d61d8327deb882cf99', 10, 3)",
            params![email],
        )
        .unwrap();
    }

    #[test]
    fn test_account_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let store = AccountStore::new(&conn);

        let account = Account::new("a@b.co".to_string(), "hash".to_string());
        store.insert_account(&account).unwrap();

        let found = store.find_by_email("a@b.co").unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert_eq!(found.password_hash, "hash");
        assert!(store.find_by_email("x@b.co").unwrap().is_none());

        assert!(store.update_password(&account.id, "new").unwrap());
        let found = store.find_by_id(&account.id).unwrap().unwrap();
        assert_eq!(found.password_hash, "new");
    }

    #[test]
    fn test_duplicate_email_is_constraint() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let store = AccountStore::new(&conn);

        store
            .insert_account(&Account::new("a@b.co".to_string(), "h".to_string()))
            .unwrap();
        let err = store
            .insert_account(&Account::new("a@b.co".to_string(), "h".to_string()))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }

    #[test]
    fn test_migration_state_prefers_current_account() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        seed_legacy(&conn, "old@b.co");
        let store = AccountStore::new(&conn);

        match store.migration_state("old@b.co").unwrap() {
            Some(MigrationState::LegacyOnly(legacy)) => {
                assert_eq!(legacy.markers, ProgramMarkers::new(Some(10), Some(3), None));
            }
            other => panic!("unexpected state: {other:?}"),
        }

        store
            .insert_account(&Account::new("old@b.co".to_string(), "h".to_string()))
            .unwrap();
        assert!(matches!(
            store.migration_state("old@b.co").unwrap(),
            Some(MigrationState::Migrated(_))
        ));
        assert!(store.migration_state("none@b.co").unwrap().is_none());
    }

    #[test]
    fn test_profile_roundtrip_and_details() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        conn.execute("INSERT INTO universities (id, name) VALUES (7, 'ITB')", [])
            .unwrap();
        let store = AccountStore::new(&conn);

        let account = Account::new("a@b.co".to_string(), "h".to_string());
        store.insert_account(&account).unwrap();

        let mut profile = Profile::new(account.id, "Fulan".to_string());
        profile.level = 6;
        profile.badges = vec!["SSC-1".to_string(), "LMD-2".to_string()];
        profile.university_id = Some(7);
        store.insert_profile(&profile).unwrap();

        profile.level = 0;
        profile.name = "Fulanah".to_string();
        store.update_profile(&profile).unwrap();

        let details = store.profile_details(&account.id).unwrap().unwrap();
        assert_eq!(details.profile.name, "Fulanah");
        assert_eq!(details.profile.level, 6);
        assert_eq!(details.profile.badges, vec!["SSC-1", "LMD-2"]);
        assert_eq!(details.university.as_deref(), Some("ITB"));
        assert!(details.province.is_none());
    }
}
