//! Custom form persistence.

use rusqlite::{params, Connection, Row};

use super::types::{CustomForm, FeatureType};
use crate::storage::database::{parse_json, parse_timestamp, to_json, DatabaseError};

pub struct FormStore<'a> {
    conn: &'a Connection,
}

impl<'a> FormStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, form: &CustomForm) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO custom_forms (form_name, form_description, feature_type, feature_id,
                                       form_schema_json, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                form.form_name,
                form.form_description,
                form.feature_type.as_str(),
                form.feature_id,
                to_json(&form.form_schema)?,
                form.is_active,
                form.created_at.to_rfc3339(),
                form.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The active form attached to a feature, oldest first if several exist.
    pub fn find_active(
        &self,
        feature_type: FeatureType,
        feature_id: i64,
    ) -> Result<Option<CustomForm>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, form_name, form_description, feature_type, feature_id, form_schema_json,
                    is_active, created_at, updated_at
             FROM custom_forms
             WHERE feature_type = ?1 AND feature_id = ?2 AND is_active = 1
             ORDER BY id ASC LIMIT 1",
        )?;
        let mut rows = stmt.query(params![feature_type.as_str(), feature_id])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_form(row)?)),
            None => Ok(None),
        }
    }
}

fn row_to_form(row: &Row<'_>) -> Result<CustomForm, DatabaseError> {
    let feature_type: String = row.get(3)?;
    let schema: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(CustomForm {
        id: row.get(0)?,
        form_name: row.get(1)?,
        form_description: row.get(2)?,
        feature_type: feature_type
            .parse()
            .map_err(|_| DatabaseError::DeserializationError(format!("feature_type {feature_type}")))?,
        feature_id: row.get(4)?,
        form_schema: parse_json(&schema)?,
        is_active: row.get(6)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
