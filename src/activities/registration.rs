//! Activity registration workflow.
//!
//! One registration per (user, activity). The in-code duplicate check gives a
//! clean error on the common path; the unique index on the pair is what
//! actually holds under concurrent requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use super::store::ActivityStore;
use super::types::{Activity, ActivityRegistration, StatusView, UserActivity};
use super::visibility;
use crate::identity::AccountStore;
use crate::registration::{Document, RegistrationError};
use crate::storage::{Database, Page, PageRequest};

/// Activity registration manager.
pub struct ActivityRegistrar {
    db: Arc<Database>,
}

impl ActivityRegistrar {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register the actor for a published activity.
    pub fn register(
        &self,
        actor: &Uuid,
        slug: &str,
        answers: Document,
    ) -> Result<ActivityRegistration, RegistrationError> {
        let conn = self.db.connection();
        let store = ActivityStore::new(&conn);
        let activity = published(store.find_by_slug(slug)?)?;
        insert_checked(&conn, actor, activity, answers)
    }

    /// Same as [`register`](Self::register), addressing the activity by id.
    pub fn register_by_id(
        &self,
        actor: &Uuid,
        activity_id: i64,
        answers: Document,
    ) -> Result<ActivityRegistration, RegistrationError> {
        let conn = self.db.connection();
        let store = ActivityStore::new(&conn);
        let activity = published(store.find_by_id(activity_id)?)?;
        insert_checked(&conn, actor, activity, answers)
    }

    /// Replace the questionnaire answers of the actor's registration.
    pub fn edit_answers(
        &self,
        actor: &Uuid,
        slug: &str,
        answers: Document,
    ) -> Result<ActivityRegistration, RegistrationError> {
        let conn = self.db.connection();
        let store = ActivityStore::new(&conn);

        let activity = store
            .find_by_slug(slug)?
            .ok_or(RegistrationError::ActivityNotFound)?;
        let mut registration = store
            .find_registration(actor, activity.id)?
            .ok_or(RegistrationError::RegistrationNotFound)?;

        store.update_answers(&registration.id, &answers)?;
        registration.questionnaire_answer = answers;
        registration.updated_at = Utc::now();

        Ok(registration)
    }

    /// The actor's own registration row for an activity.
    pub fn registration_data(
        &self,
        actor: &Uuid,
        slug: &str,
    ) -> Result<ActivityRegistration, RegistrationError> {
        let conn = self.db.connection();
        let store = ActivityStore::new(&conn);

        let activity = store
            .find_by_slug(slug)?
            .ok_or(RegistrationError::ActivityNotFound)?;
        store
            .find_registration(actor, activity.id)?
            .ok_or(RegistrationError::RegistrationNotFound)
    }

    /// Registration status as the actor may see it now.
    pub fn check_status(&self, actor: &Uuid, slug: &str) -> Result<StatusView, RegistrationError> {
        self.check_status_at(actor, slug, Utc::now())
    }

    pub fn check_status_at(
        &self,
        actor: &Uuid,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Result<StatusView, RegistrationError> {
        let conn = self.db.connection();
        let store = ActivityStore::new(&conn);

        let activity = store
            .find_by_slug(slug)?
            .ok_or(RegistrationError::ActivityNotFound)?;
        let registration = store.find_registration(actor, activity.id)?;

        Ok(visibility::check_status(
            registration.as_ref(),
            &activity.additional_config,
            now,
        ))
    }

    /// The actor's registrations with their activities.
    pub fn list_for_user(
        &self,
        actor: &Uuid,
        page: PageRequest,
    ) -> Result<Page<UserActivity>, RegistrationError> {
        let conn = self.db.connection();
        let (items, total) = ActivityStore::new(&conn).list_for_user(actor, page)?;

        Ok(Page::new(items, total, page).map(|(registration, activity)| UserActivity {
            registration,
            activity,
        }))
    }
}

fn published(activity: Option<Activity>) -> Result<Activity, RegistrationError> {
    activity
        .filter(|activity| activity.is_published)
        .ok_or(RegistrationError::ActivityNotFound)
}

/// Profile, duplicate, and level checks, then the insert.
fn insert_checked(
    conn: &Connection,
    actor: &Uuid,
    activity: Activity,
    answers: Document,
) -> Result<ActivityRegistration, RegistrationError> {
    let store = ActivityStore::new(conn);
    let profile = AccountStore::new(conn)
        .get_profile(actor)?
        .ok_or(RegistrationError::ProfileMissing)?;

    if store.find_registration(actor, activity.id)?.is_some() {
        return Err(RegistrationError::AlreadyRegistered);
    }
    if profile.level < activity.minimum_level {
        return Err(RegistrationError::LevelTooLow {
            required: activity.minimum_level,
            actual: profile.level,
        });
    }

    let registration = ActivityRegistration::new(*actor, activity.id, answers);
    store
        .insert_registration(&registration)
        .map_err(RegistrationError::from_insert)?;

    info!("Account {} registered for activity {}", actor, activity.slug);
    Ok(registration)
}
