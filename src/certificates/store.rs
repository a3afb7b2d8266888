//! Certificate template persistence.

use rusqlite::{params, Connection, Row};

use super::types::CertificateTemplate;
use crate::storage::database::{parse_json, parse_timestamp, to_json, DatabaseError};

pub struct TemplateStore<'a> {
    conn: &'a Connection,
}

impl<'a> TemplateStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a template, returning its id. Template editing lives in the admin
    /// tool; this exists for seeding.
    pub fn insert(&self, template: &CertificateTemplate) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO certificate_templates (name, description, background_image,
                                                template_data_json, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                template.name,
                template.description,
                template.background_image,
                to_json(&template.template_data)?,
                template.is_active,
                template.created_at.to_rfc3339(),
                template.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find(&self, id: i64) -> Result<Option<CertificateTemplate>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, background_image, template_data_json, is_active,
                    created_at, updated_at
             FROM certificate_templates WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_template(row)?)),
            None => Ok(None),
        }
    }
}

fn row_to_template(row: &Row<'_>) -> Result<CertificateTemplate, DatabaseError> {
    let template_data: String = row.get(4)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(CertificateTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        background_image: row.get(3)?,
        template_data: parse_json(&template_data)?,
        is_active: row.get(5)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
