//! Counseling module
//!
//! Intake and history for peer-counseling ("ruang curhat") requests.
//! Counselor assignment happens in the admin tool.

pub mod store;
pub mod types;

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::storage::{Database, DatabaseError};
use crate::validation::ValidationErrors;

pub use store::CounselingStore;
pub use types::*;

pub struct CounselingService {
    db: Arc<Database>,
}

impl CounselingService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn submit(&self, actor: &Uuid, input: CounselingInput) -> Result<CounselingRequest, CounselingError> {
        input.validate()?;
        let request = input.into_request(*actor);

        let conn = self.db.connection();
        CounselingStore::new(&conn).insert(&request)?;

        info!("Account {} submitted counseling request {}", actor, request.id);
        Ok(request)
    }

    pub fn history(&self, actor: &Uuid) -> Result<Vec<CounselingHistoryEntry>, CounselingError> {
        let conn = self.db.connection();
        Ok(CounselingStore::new(&conn).history(actor)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CounselingError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Account, AccountStore};
    use rusqlite::params;

    fn setup() -> (CounselingService, Arc<Database>, Uuid) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let account = Account::new("a@b.co".to_string(), "h".to_string());
        {
            let conn = db.connection();
            AccountStore::new(&conn).insert_account(&account).unwrap();
        }
        (CounselingService::new(db.clone()), db, account.id)
    }

    fn input() -> CounselingInput {
        CounselingInput {
            problem_ownership: 1,
            owner_name: Some("  ".to_string()),
            problem_category: "akademik".to_string(),
            problem_description: "Sulit membagi waktu".to_string(),
            handling_technic: "online".to_string(),
            counselor_gender: "F".to_string(),
        }
    }

    #[test]
    fn test_submit_starts_waiting() {
        let (service, _db, actor) = setup();
        let request = service.submit(&actor, input()).unwrap();

        assert_eq!(request.status, STATUS_WAITING);
        assert_eq!(request.owner_name, None);
        assert!(request.counselor_id.is_none());
    }

    #[test]
    fn test_submit_validates() {
        let (service, _db, actor) = setup();
        let blank = CounselingInput {
            problem_description: String::new(),
            ..input()
        };

        match service.submit(&actor, blank) {
            Err(CounselingError::Validation(errors)) => {
                assert_eq!(errors.fields()[0].field, "problem_description");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_history_includes_counselor() {
        let (service, db, actor) = setup();
        let assigned = service.submit(&actor, input()).unwrap();
        {
            let conn = db.connection();
            conn.execute(
                "INSERT INTO admin_users (id, email, full_name) VALUES (7, 'c@b.co', 'Bu Rina')",
                [],
            )
            .unwrap();
            conn.execute(
                "UPDATE ruang_curhats SET counselor_id = 7 WHERE id = ?1",
                params![assigned.id.to_string()],
            )
            .unwrap();
        }
        service.submit(&actor, input()).unwrap();

        let history = service.history(&actor).unwrap();
        assert_eq!(history.len(), 2);
        let with_counselor = history
            .iter()
            .find(|e| e.request.id == assigned.id)
            .unwrap();
        assert_eq!(
            with_counselor.counselor,
            Some(Counselor {
                id: 7,
                full_name: "Bu Rina".to_string()
            })
        );
    }
}
