//! Counseling request persistence.

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::types::{CounselingHistoryEntry, CounselingRequest, Counselor};
use crate::storage::database::{parse_timestamp, parse_uuid, DatabaseError};

pub struct CounselingStore<'a> {
    conn: &'a Connection,
}

impl<'a> CounselingStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, request: &CounselingRequest) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO ruang_curhats (id, user_id, problem_ownership, owner_name, problem_category,
                                        problem_description, handling_technic, counselor_gender,
                                        counselor_id, status, additional_notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                request.id.to_string(),
                request.user_id.to_string(),
                request.problem_ownership,
                request.owner_name,
                request.problem_category,
                request.problem_description,
                request.handling_technic,
                request.counselor_gender,
                request.counselor_id,
                request.status,
                request.additional_notes,
                request.created_at.to_rfc3339(),
                request.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// A user's requests with the assigned counselor, newest first.
    pub fn history(&self, user_id: &Uuid) -> Result<Vec<CounselingHistoryEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.user_id, r.problem_ownership, r.owner_name, r.problem_category,
                    r.problem_description, r.handling_technic, r.counselor_gender, r.counselor_id,
                    r.status, r.additional_notes, r.created_at, r.updated_at, a.full_name
             FROM ruang_curhats r
             LEFT JOIN admin_users a ON a.id = r.counselor_id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC",
        )?;
        let mut rows = stmt.query(params![user_id.to_string()])?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row)?);
        }

        Ok(entries)
    }
}

fn row_to_entry(row: &Row<'_>) -> Result<CounselingHistoryEntry, DatabaseError> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;
    let counselor_id: Option<i64> = row.get(8)?;
    let counselor_name: Option<String> = row.get(13)?;

    let counselor = match (counselor_id, counselor_name) {
        (Some(id), Some(full_name)) => Some(Counselor { id, full_name }),
        _ => None,
    };

    Ok(CounselingHistoryEntry {
        request: CounselingRequest {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            problem_ownership: row.get(2)?,
            owner_name: row.get(3)?,
            problem_category: row.get(4)?,
            problem_description: row.get(5)?,
            handling_technic: row.get(6)?,
            counselor_gender: row.get(7)?,
            counselor_id,
            status: row.get(9)?,
            additional_notes: row.get(10)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        },
        counselor,
    })
}
