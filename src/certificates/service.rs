//! Certificate bundle assembly.
//!
//! Joins a passed registration with its activity, the activity's configured
//! template, and the participant's profile.

use std::sync::Arc;

use rusqlite::Connection;
use uuid::Uuid;

use super::store::TemplateStore;
use super::types::{ActivitySummary, CertificateBundle, Participant, TemplateSummary};
use crate::activities::{status, ActivityStore};
use crate::identity::AccountStore;
use crate::storage::{Database, DatabaseError};

pub struct CertificateService {
    db: Arc<Database>,
}

impl CertificateService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Public lookup by registration id.
    pub fn build(&self, registration_id: &str) -> Result<CertificateBundle, CertificateError> {
        let id = parse_registration_id(registration_id)?;
        let conn = self.db.connection();
        assemble(&conn, &id)
    }

    /// Lookup that first checks the actor owns the registration.
    pub fn build_owned(
        &self,
        actor: &Uuid,
        registration_id: &str,
    ) -> Result<CertificateBundle, CertificateError> {
        let id = parse_registration_id(registration_id)?;
        let conn = self.db.connection();

        let owned = ActivityStore::new(&conn)
            .find_registration_by_id(&id)?
            .is_some_and(|r| r.user_id == *actor);
        if !owned {
            return Err(CertificateError::Forbidden);
        }

        assemble(&conn, &id)
    }
}

fn parse_registration_id(raw: &str) -> Result<Uuid, CertificateError> {
    Uuid::parse_str(raw.trim()).map_err(|_| CertificateError::InvalidRegistrationId)
}

fn assemble(conn: &Connection, id: &Uuid) -> Result<CertificateBundle, CertificateError> {
    let activities = ActivityStore::new(conn);

    // Any status other than passed reads as absent
    let registration = activities
        .find_registration_by_id(id)?
        .filter(|r| r.status == status::PASSED)
        .ok_or(CertificateError::RegistrationNotFound)?;

    let activity = activities
        .find_by_id(registration.activity_id)?
        .ok_or(CertificateError::ActivityNotFound)?;

    let template_id = activity
        .additional_config
        .certificate_template_id
        .ok_or(CertificateError::NoCertificateTemplate)?;
    let template = TemplateStore::new(conn)
        .find(template_id)?
        .ok_or(CertificateError::TemplateNotFound)?;

    let accounts = AccountStore::new(conn);
    let email = accounts
        .find_by_id(&registration.user_id)?
        .map(|a| a.email)
        .unwrap_or_default();
    let profile = accounts.get_profile(&registration.user_id)?;
    let university = match &profile {
        Some(p) => accounts.university_name(p.university_id)?.unwrap_or_default(),
        None => String::new(),
    };

    let name = profile
        .map(|p| p.name)
        .filter(|n| !n.is_empty())
        .or_else(|| Some(email.clone()).filter(|e| !e.is_empty()))
        .unwrap_or_else(|| "Unknown".to_string());

    let activity_date = activity
        .activity_start
        .map(|d| d.format("%d %B %Y").to_string())
        .unwrap_or_default();

    Ok(CertificateBundle {
        activity: ActivitySummary {
            id: activity.id,
            name: activity.name.clone(),
            activity_start: activity.activity_start,
        },
        template: TemplateSummary {
            id: template.id,
            name: template.name,
            background_image: template.background_image,
            template_data: template.template_data,
        },
        participant: Participant {
            registration_id: registration.id,
            user_id: registration.user_id,
            name,
            email,
            university,
            activity_name: activity.name,
            activity_date,
        },
    })
}

/// Certificate errors.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("Invalid registration id")]
    InvalidRegistrationId,

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("Activity not found")]
    ActivityNotFound,

    #[error("Activity has no certificate template")]
    NoCertificateTemplate,

    #[error("Certificate template not found")]
    TemplateNotFound,

    #[error("Registration belongs to another account")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
