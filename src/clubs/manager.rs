//! Club browsing and membership applications.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::store::ClubStore;
use super::types::{Club, ClubRegistration, ClubRegistrationDetails, RegistrationCheck};
use crate::identity::AccountStore;
use crate::registration::{Document, RegistrationError};
use crate::storage::{Database, Page, PageRequest};

/// Club manager.
pub struct ClubManager {
    db: Arc<Database>,
}

impl ClubManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // ========== Catalog ==========

    pub fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<Club>, RegistrationError> {
        let conn = self.db.connection();
        let (clubs, total) = ClubStore::new(&conn).list_shown(search, page)?;
        Ok(Page::new(clubs, total, page))
    }

    /// A shown club. Hidden clubs are reported as missing.
    pub fn show(&self, club_id: i64) -> Result<Club, RegistrationError> {
        let conn = self.db.connection();
        ClubStore::new(&conn)
            .find_club(club_id)?
            .filter(|club| club.is_show)
            .ok_or(RegistrationError::ClubNotFound)
    }

    // ========== Registration ==========

    /// Apply to a club. New applications start as pending.
    pub fn register(
        &self,
        actor: &Uuid,
        club_id: i64,
        additional_data: Document,
    ) -> Result<ClubRegistrationDetails, RegistrationError> {
        let conn = self.db.connection();
        let store = ClubStore::new(&conn);

        let club = store
            .find_club(club_id)?
            .ok_or(RegistrationError::ClubNotFound)?;
        AccountStore::new(&conn)
            .get_profile(actor)?
            .ok_or(RegistrationError::ProfileMissing)?;

        if store.find_registration(actor, club.id)?.is_some() {
            return Err(RegistrationError::AlreadyRegistered);
        }

        let registration = ClubRegistration::new(*actor, club.id, additional_data);
        store
            .insert_registration(&registration)
            .map_err(RegistrationError::from_insert)?;

        info!("Account {} applied to club {}", actor, club.id);
        Ok(ClubRegistrationDetails { registration, club })
    }

    pub fn check(&self, actor: &Uuid, club_id: i64) -> Result<RegistrationCheck, RegistrationError> {
        let conn = self.db.connection();
        let store = ClubStore::new(&conn);

        let club = store
            .find_club(club_id)?
            .ok_or(RegistrationError::ClubNotFound)?;
        let registration = store
            .find_registration(actor, club.id)?
            .map(|registration| ClubRegistrationDetails { registration, club });

        Ok(RegistrationCheck {
            is_registered: registration.is_some(),
            registration,
        })
    }

    /// The actor's applications, optionally filtered by exact status.
    pub fn mine(
        &self,
        actor: &Uuid,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<ClubRegistrationDetails>, RegistrationError> {
        let conn = self.db.connection();
        let (items, total) = ClubStore::new(&conn).list_for_member(actor, status, page)?;

        Ok(Page::new(items, total, page)
            .map(|(registration, club)| ClubRegistrationDetails { registration, club }))
    }

    /// Shallow-merge new keys into the application's additional data.
    pub fn update(
        &self,
        actor: &Uuid,
        club_id: i64,
        patch: Option<Document>,
    ) -> Result<ClubRegistrationDetails, RegistrationError> {
        let conn = self.db.connection();
        let store = ClubStore::new(&conn);

        let mut registration = store
            .find_registration(actor, club_id)?
            .ok_or(RegistrationError::RegistrationNotFound)?;

        if let Some(patch) = patch {
            registration.merge_additional_data(patch);
            store.update_additional_data(&registration)?;
        }

        let club = store
            .find_club(club_id)?
            .ok_or(RegistrationError::ClubNotFound)?;
        Ok(ClubRegistrationDetails { registration, club })
    }

    /// Withdraw an application. The row is deleted outright.
    pub fn cancel(&self, actor: &Uuid, club_id: i64) -> Result<(), RegistrationError> {
        let conn = self.db.connection();
        let store = ClubStore::new(&conn);

        let registration = store
            .find_registration(actor, club_id)?
            .ok_or(RegistrationError::RegistrationNotFound)?;

        if !registration.is_cancellable() {
            return Err(RegistrationError::CannotCancel(registration.status));
        }

        store.delete_registration(&registration.id)?;
        info!("Account {} withdrew from club {}", actor, club_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clubs::types::status;
    use crate::identity::{Account, Profile};
    use serde_json::json;

    fn setup() -> (ClubManager, Arc<Database>, Uuid, i64) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let account = Account::new("a@b.co".to_string(), "h".to_string());
        let club_id = {
            let conn = db.connection();
            let accounts = AccountStore::new(&conn);
            accounts.insert_account(&account).unwrap();
            accounts
                .insert_profile(&Profile::new(account.id, "Fulan".to_string()))
                .unwrap();
            ClubStore::new(&conn).insert_club(&Club::new("Robotika")).unwrap()
        };
        (ClubManager::new(db.clone()), db, account.id, club_id)
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn set_status(db: &Database, actor: &Uuid, club_id: i64, value: &str) {
        let conn = db.connection();
        let store = ClubStore::new(&conn);
        let id = store.find_registration(actor, club_id).unwrap().unwrap().id;
        store.set_status(&id, value).unwrap();
    }

    #[test]
    fn test_register_and_check() {
        let (manager, _db, actor, club_id) = setup();

        let check = manager.check(&actor, club_id).unwrap();
        assert!(!check.is_registered);

        let details = manager.register(&actor, club_id, doc(json!({"why": "suka"}))).unwrap();
        assert_eq!(details.registration.status, status::PENDING);
        assert_eq!(details.club.name, "Robotika");

        let check = manager.check(&actor, club_id).unwrap();
        assert!(check.is_registered);

        assert!(matches!(
            manager.register(&actor, club_id, Document::new()),
            Err(RegistrationError::AlreadyRegistered)
        ));
        assert!(matches!(
            manager.register(&actor, 999, Document::new()),
            Err(RegistrationError::ClubNotFound)
        ));
    }

    #[test]
    fn test_update_merges() {
        let (manager, _db, actor, club_id) = setup();
        manager
            .register(&actor, club_id, doc(json!({"a": 1, "b": 1})))
            .unwrap();

        let details = manager
            .update(&actor, club_id, Some(doc(json!({"b": 2, "c": 3}))))
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(details.registration.additional_data),
            json!({"a": 1, "b": 2, "c": 3})
        );

        let unchanged = manager.update(&actor, club_id, None).unwrap();
        assert_eq!(unchanged.registration.additional_data.len(), 3);
    }

    #[test]
    fn test_cancel_from_pending_and_approved() {
        let (manager, db, actor, club_id) = setup();

        manager.register(&actor, club_id, Document::new()).unwrap();
        manager.cancel(&actor, club_id).unwrap();
        assert!(!manager.check(&actor, club_id).unwrap().is_registered);

        manager.register(&actor, club_id, Document::new()).unwrap();
        set_status(&db, &actor, club_id, status::APPROVED);
        manager.cancel(&actor, club_id).unwrap();

        assert!(matches!(
            manager.cancel(&actor, club_id),
            Err(RegistrationError::RegistrationNotFound)
        ));
    }

    #[test]
    fn test_cancel_rejected_fails() {
        let (manager, db, actor, club_id) = setup();
        manager.register(&actor, club_id, Document::new()).unwrap();
        set_status(&db, &actor, club_id, status::REJECTED);

        assert!(matches!(
            manager.cancel(&actor, club_id),
            Err(RegistrationError::CannotCancel(s)) if s == status::REJECTED
        ));
        assert!(manager.check(&actor, club_id).unwrap().is_registered);
    }

    #[test]
    fn test_mine_with_status_filter() {
        let (manager, db, actor, club_id) = setup();
        let second = {
            let conn = db.connection();
            ClubStore::new(&conn).insert_club(&Club::new("Fotografi")).unwrap()
        };
        manager.register(&actor, club_id, Document::new()).unwrap();
        manager.register(&actor, second, Document::new()).unwrap();
        set_status(&db, &actor, second, status::APPROVED);

        let all = manager.mine(&actor, None, PageRequest::default()).unwrap();
        assert_eq!(all.meta.total, 2);

        let approved = manager
            .mine(&actor, Some(status::APPROVED), PageRequest::default())
            .unwrap();
        assert_eq!(approved.meta.total, 1);
        assert_eq!(approved.data[0].club.name, "Fotografi");
    }

    #[test]
    fn test_show_hidden_club() {
        let (manager, db, _actor, club_id) = setup();
        let hidden = {
            let conn = db.connection();
            let mut club = Club::new("Rahasia");
            club.is_show = false;
            ClubStore::new(&conn).insert_club(&club).unwrap()
        };

        assert_eq!(manager.show(club_id).unwrap().name, "Robotika");
        assert!(matches!(
            manager.show(hidden),
            Err(RegistrationError::ClubNotFound)
        ));
    }
}
