//! Custom form lookup and submission routing.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::store::FormStore;
use super::types::{CustomForm, FeatureSubmission, FeatureType};
use super::FormError;
use crate::activities::{ActivityRegistrar, ActivityRegistration};
use crate::clubs::{ClubManager, ClubRegistrationDetails};
use crate::registration::Document;
use crate::storage::Database;

/// Result of a dispatched submission.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FormOutcome {
    Activity(ActivityRegistration),
    Club(ClubRegistrationDetails),
    Independent { form_id: i64 },
}

impl FormOutcome {
    /// Response message code for the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            FormOutcome::Activity(_) => "ACTIVITY_REGISTER_SUCCESS",
            FormOutcome::Club(_) => "CLUB_REGISTER_SUCCESS",
            FormOutcome::Independent { .. } => "FORM_SUBMITTED",
        }
    }
}

pub struct FormService {
    db: Arc<Database>,
    activities: ActivityRegistrar,
    clubs: ClubManager,
}

impl FormService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            activities: ActivityRegistrar::new(db.clone()),
            clubs: ClubManager::new(db.clone()),
            db,
        }
    }

    /// The active form for a feature. Both parameters are required.
    pub fn get_by_feature(
        &self,
        feature_type: Option<&str>,
        feature_id: Option<i64>,
    ) -> Result<CustomForm, FormError> {
        let (Some(feature_type), Some(feature_id)) = (feature_type, feature_id) else {
            return Err(FormError::FeatureTypeAndIdRequired);
        };
        let feature_type: FeatureType = feature_type.parse()?;

        let conn = self.db.connection();
        FormStore::new(&conn)
            .find_active(feature_type, feature_id)?
            .ok_or(FormError::NotFound)
    }

    /// Route a submission to the registration path for its feature type.
    pub fn submit(&self, actor: &Uuid, submission: FeatureSubmission) -> Result<FormOutcome, FormError> {
        let outcome = match submission {
            FeatureSubmission::ActivityRegistration {
                activity_id,
                profile_data,
                custom_form_data,
            } => {
                let mut answers = Document::new();
                answers.insert("profile_data".to_string(), profile_data.into());
                answers.insert("custom_form_data".to_string(), custom_form_data.into());
                FormOutcome::Activity(self.activities.register_by_id(actor, activity_id, answers)?)
            }
            FeatureSubmission::ClubRegistration {
                club_id,
                custom_form_data,
            } => FormOutcome::Club(self.clubs.register(actor, club_id, custom_form_data)?),
            FeatureSubmission::IndependentForm { form_id, .. } => {
                info!("Account {} submitted independent form {}", actor, form_id);
                FormOutcome::Independent { form_id }
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::Activity;
    use crate::activities::ActivityStore;
    use crate::clubs::{status, Club, ClubStore};
    use crate::identity::{Account, AccountStore, Profile};
    use crate::registration::RegistrationError;
    use chrono::Utc;
    use serde_json::json;

    struct Fixture {
        db: Arc<Database>,
        service: FormService,
        actor: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            let db = Arc::new(Database::open_in_memory().unwrap());
            let account = Account::new("a@b.co".to_string(), "h".to_string());
            {
                let conn = db.connection();
                let store = AccountStore::new(&conn);
                store.insert_account(&account).unwrap();
                store
                    .insert_profile(&Profile::new(account.id, "Ali".to_string()))
                    .unwrap();
            }
            Self {
                service: FormService::new(db.clone()),
                db,
                actor: account.id,
            }
        }
    }

    fn data(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_activity_submission_wraps_answers() {
        let fx = Fixture::new();
        let activity_id = {
            let conn = fx.db.connection();
            ActivityStore::new(&conn)
                .insert_activity(&Activity::new("Spectra", "spectra"))
                .unwrap()
        };

        let outcome = fx
            .service
            .submit(
                &fx.actor,
                FeatureSubmission::ActivityRegistration {
                    activity_id,
                    profile_data: data(json!({"major": "Informatika"})),
                    custom_form_data: data(json!({"motivation": "belajar"})),
                },
            )
            .unwrap();

        assert_eq!(outcome.message(), "ACTIVITY_REGISTER_SUCCESS");
        let FormOutcome::Activity(registration) = outcome else {
            panic!("expected activity outcome");
        };
        assert_eq!(
            serde_json::Value::Object(registration.questionnaire_answer),
            json!({
                "profile_data": {"major": "Informatika"},
                "custom_form_data": {"motivation": "belajar"}
            })
        );

        let again = fx.service.submit(
            &fx.actor,
            FeatureSubmission::ActivityRegistration {
                activity_id,
                profile_data: Document::new(),
                custom_form_data: Document::new(),
            },
        );
        assert!(matches!(
            again,
            Err(FormError::Registration(RegistrationError::AlreadyRegistered))
        ));
    }

    #[test]
    fn test_club_submission_stores_form_data() {
        let fx = Fixture::new();
        let club_id = {
            let conn = fx.db.connection();
            ClubStore::new(&conn).insert_club(&Club::new("Paduan Suara")).unwrap()
        };

        let outcome = fx
            .service
            .submit(
                &fx.actor,
                FeatureSubmission::ClubRegistration {
                    club_id,
                    custom_form_data: data(json!({"voice": "tenor"})),
                },
            )
            .unwrap();

        let FormOutcome::Club(details) = outcome else {
            panic!("expected club outcome");
        };
        assert_eq!(details.registration.status, status::PENDING);
        assert_eq!(details.registration.additional_data["voice"], "tenor");
    }

    #[test]
    fn test_get_by_feature() {
        let fx = Fixture::new();
        let now = Utc::now();
        {
            let conn = fx.db.connection();
            FormStore::new(&conn)
                .insert(&CustomForm {
                    id: 0,
                    form_name: "Pendaftaran".to_string(),
                    form_description: None,
                    feature_type: FeatureType::ClubRegistration,
                    feature_id: 3,
                    form_schema: json!({"fields": []}),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                })
                .unwrap();
        }

        let form = fx
            .service
            .get_by_feature(Some("club_registration"), Some(3))
            .unwrap();
        assert_eq!(form.form_name, "Pendaftaran");

        assert!(matches!(
            fx.service.get_by_feature(Some("activity_registration"), Some(3)),
            Err(FormError::NotFound)
        ));
        assert!(matches!(
            fx.service.get_by_feature(Some("poll"), Some(3)),
            Err(FormError::InvalidFeatureType(_))
        ));
        assert!(matches!(
            fx.service.get_by_feature(None, Some(3)),
            Err(FormError::FeatureTypeAndIdRequired)
        ));
    }
}
