//! Database operations using rusqlite.
//!
//! The connection sits behind a mutex so a single `Arc<Database>` can be shared
//! by every request handler. Feature stores borrow the locked connection (or a
//! transaction) for the duration of one operation.

use crate::storage::schema::{CURRENT_VERSION, MIGRATION_V1_TO_V2, SCHEMA, SCHEMA_VERSION_TABLE};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{ffi, Connection, Result as SqliteResult, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        let conn = self.connection();

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        conn.execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = get_schema_version(&conn)?;

        if current_version < CURRENT_VERSION {
            migrate(&conn, current_version)?;
        }

        Ok(())
    }

    /// Lock and return the underlying connection.
    ///
    /// The guard must not be held across a call that locks again.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub fn with_transaction<T, E>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DatabaseError>,
    {
        let mut conn = self.connection();
        let tx = conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let value = f(&tx)?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(value)
    }

    /// Current schema version.
    pub fn schema_version(&self) -> Result<i32, DatabaseError> {
        get_schema_version(&self.connection())
    }
}

fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    let result: SqliteResult<i32> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );

    match result {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
    }
}

fn migrate(conn: &Connection, from_version: i32) -> Result<(), DatabaseError> {
    if from_version < 1 {
        conn.execute_batch(SCHEMA)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        record_version(conn, 1)?;
    }

    if from_version < 2 {
        conn.execute_batch(MIGRATION_V1_TO_V2)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        record_version(conn, 2)?;
    }

    tracing::info!("Database migrated to version {}", CURRENT_VERSION);

    Ok(())
}

fn record_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
        [version],
    )
    .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

    Ok(())
}

// ========== Row Conversion Helpers ==========

/// Parse an RFC 3339 timestamp column.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(e.to_string()))
}

/// Parse an optional `YYYY-MM-DD` date column.
pub fn parse_date(value: Option<String>) -> Result<Option<NaiveDate>, DatabaseError> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| DatabaseError::DeserializationError(e.to_string()))
        })
        .transpose()
}

/// Parse a UUID column.
pub fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::DeserializationError(e.to_string()))
}

/// Decode a JSON TEXT column.
pub fn parse_json<T: serde::de::DeserializeOwned>(value: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(value).map_err(|e| DatabaseError::DeserializationError(e.to_string()))
}

/// Encode a value for a JSON TEXT column.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::SerializationError(e.to_string()))
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A UNIQUE index rejected the write. Other constraint failures are `QueryFailed`.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref inner, _)
                if inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                DatabaseError::UniqueViolation(e.to_string())
            }
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory_database() {
        let db = Database::open_in_memory().expect("Failed to create database");
        let version = db.schema_version().expect("Failed to get version");
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let db = Database::open_in_memory().expect("Failed to create database");
        let conn = db.connection();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "accounts",
            "legacy_members",
            "profiles",
            "activities",
            "activity_registrations",
            "clubs",
            "club_registrations",
            "achievements",
            "monthly_leaderboards",
            "lifetime_leaderboards",
            "certificate_templates",
            "custom_forms",
            "ruang_curhats",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_reopen_file_database_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.db");

        {
            let db = Database::open(&path).unwrap();
            assert_eq!(db.schema_version().unwrap(), CURRENT_VERSION);
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_v2_migration_backfills_after_registration_info() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_VERSION_TABLE).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        record_version(&conn, 1).unwrap();
        conn.execute(
            "INSERT INTO clubs (name, created_at, updated_at) VALUES ('Robotics', 'x', 'x')",
            [],
        )
        .unwrap();

        migrate(&conn, 1).unwrap();

        let info: String = conn
            .query_row("SELECT registration_info_json FROM clubs", [], |row| row.get(0))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(value["after_registration_info"], "");
        assert_eq!(get_schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<(), DatabaseError> = db.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO admin_users (email, full_name) VALUES ('a@b.c', 'Admin')",
                [],
            )?;
            Err(DatabaseError::QueryFailed("boom".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM admin_users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unique_violation_maps_to_unique() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        conn.execute(
            "INSERT INTO admin_users (email, full_name) VALUES ('a@b.c', 'Admin')",
            [],
        )
        .unwrap();

        let err: DatabaseError = conn
            .execute(
                "INSERT INTO admin_users (email, full_name) VALUES ('a@b.c', 'Other')",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }

    #[test]
    fn test_foreign_key_violation_is_query_failure() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();

        let err: DatabaseError = conn
            .execute(
                "INSERT INTO achievements (id, user_id, name, description, achievement_date,
                                           achievement_type, score, proof, status,
                                           created_at, updated_at)
                 VALUES ('a', 'missing-user', 'n', 'd', '2024-01-01', 0, 0, 'p', 0, 'x', 'x')",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
