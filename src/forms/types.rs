//! Custom form types and the tagged submission union.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FormError;
use crate::registration::Document;

/// Which entity a form is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    ActivityRegistration,
    ClubRegistration,
    IndependentForm,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::ActivityRegistration => "activity_registration",
            FeatureType::ClubRegistration => "club_registration",
            FeatureType::IndependentForm => "independent_form",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activity_registration" => Ok(FeatureType::ActivityRegistration),
            "club_registration" => Ok(FeatureType::ClubRegistration),
            "independent_form" => Ok(FeatureType::IndependentForm),
            other => Err(FormError::InvalidFeatureType(other.to_string())),
        }
    }
}

/// An admin-defined form attached to an activity or club.
#[derive(Debug, Clone, Serialize)]
pub struct CustomForm {
    pub id: i64,
    pub form_name: String,
    pub form_description: Option<String>,
    pub feature_type: FeatureType,
    pub feature_id: i64,
    /// Rendered by the client; submissions are not checked against it
    pub form_schema: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission body as received. Converted into [`FeatureSubmission`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    pub feature_type: Option<String>,
    pub feature_id: Option<i64>,
    #[serde(default)]
    pub profile_data: Option<Document>,
    #[serde(default)]
    pub custom_form_data: Option<Document>,
}

/// A form submission, one variant per feature type.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSubmission {
    ActivityRegistration {
        activity_id: i64,
        profile_data: Document,
        custom_form_data: Document,
    },
    ClubRegistration {
        club_id: i64,
        /// Profile data is not kept for clubs
        custom_form_data: Document,
    },
    IndependentForm {
        form_id: i64,
        custom_form_data: Document,
    },
}

impl FeatureSubmission {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            FeatureSubmission::ActivityRegistration { .. } => FeatureType::ActivityRegistration,
            FeatureSubmission::ClubRegistration { .. } => FeatureType::ClubRegistration,
            FeatureSubmission::IndependentForm { .. } => FeatureType::IndependentForm,
        }
    }
}

impl TryFrom<RawSubmission> for FeatureSubmission {
    type Error = FormError;

    fn try_from(raw: RawSubmission) -> Result<Self, Self::Error> {
        let (Some(feature_type), Some(feature_id)) = (raw.feature_type, raw.feature_id) else {
            return Err(FormError::FeatureTypeAndIdRequired);
        };
        if feature_type.is_empty() {
            return Err(FormError::FeatureTypeAndIdRequired);
        }

        let custom_form_data = raw.custom_form_data.unwrap_or_default();
        Ok(match feature_type.parse::<FeatureType>()? {
            FeatureType::ActivityRegistration => FeatureSubmission::ActivityRegistration {
                activity_id: feature_id,
                profile_data: raw.profile_data.unwrap_or_default(),
                custom_form_data,
            },
            FeatureType::ClubRegistration => FeatureSubmission::ClubRegistration {
                club_id: feature_id,
                custom_form_data,
            },
            FeatureType::IndependentForm => FeatureSubmission::IndependentForm {
                form_id: feature_id,
                custom_form_data,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawSubmission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_activity_submission_keeps_profile_data() {
        let submission = FeatureSubmission::try_from(raw(json!({
            "feature_type": "activity_registration",
            "feature_id": 4,
            "profile_data": {"name": "Siti"},
            "custom_form_data": {"q1": "yes"}
        })))
        .unwrap();

        match submission {
            FeatureSubmission::ActivityRegistration {
                activity_id,
                profile_data,
                custom_form_data,
            } => {
                assert_eq!(activity_id, 4);
                assert_eq!(profile_data["name"], "Siti");
                assert_eq!(custom_form_data["q1"], "yes");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_club_submission_drops_profile_data() {
        let submission = FeatureSubmission::try_from(raw(json!({
            "feature_type": "club_registration",
            "feature_id": 2,
            "profile_data": {"name": "Siti"}
        })))
        .unwrap();

        assert_eq!(
            submission,
            FeatureSubmission::ClubRegistration {
                club_id: 2,
                custom_form_data: Document::new(),
            }
        );
    }

    #[test]
    fn test_missing_and_unknown_types() {
        assert!(matches!(
            FeatureSubmission::try_from(raw(json!({"feature_id": 1}))),
            Err(FormError::FeatureTypeAndIdRequired)
        ));
        assert!(matches!(
            FeatureSubmission::try_from(raw(json!({"feature_type": "club_registration"}))),
            Err(FormError::FeatureTypeAndIdRequired)
        ));
        assert!(matches!(
            FeatureSubmission::try_from(raw(json!({"feature_type": "survey", "feature_id": 1}))),
            Err(FormError::InvalidFeatureType(t)) if t == "survey"
        ));
    }
}
