//! Activity and activity registration types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registration::Document;

/// Registration status literals. Compared by exact match.
pub mod status {
    pub const NOT_REGISTERED: &str = "BELUM TERDAFTAR";
    pub const REGISTERED: &str = "TERDAFTAR";
    pub const NOT_ANNOUNCED: &str = "BELUM DIUMUMKAN";
    pub const PASSED: &str = "LULUS KEGIATAN";
}

/// Published activity.
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub activity_start: Option<NaiveDate>,
    pub activity_end: Option<NaiveDate>,
    pub registration_start: Option<NaiveDate>,
    pub registration_end: Option<NaiveDate>,
    pub selection_start: Option<NaiveDate>,
    pub selection_end: Option<NaiveDate>,
    pub minimum_level: i32,
    pub activity_type: i32,
    pub activity_category: i32,
    pub additional_config: AdditionalConfig,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// A published activity with no dates, open to every level.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            slug: slug.into(),
            description: None,
            activity_start: None,
            activity_end: None,
            registration_start: None,
            registration_end: None,
            selection_start: None,
            selection_end: None,
            minimum_level: 0,
            activity_type: 0,
            activity_category: 0,
            additional_config: AdditionalConfig::default(),
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Structured per-activity configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_visibility: Option<StatusVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_template_id: Option<i64>,
    #[serde(default)]
    pub custom_selection_status: Vec<String>,
    #[serde(default)]
    pub mandatory_profile_data: Vec<ProfileField>,
    /// Advisory questionnaire schema; answers are not checked against it
    #[serde(default)]
    pub additional_questionnaire: Vec<serde_json::Value>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: Document,
}

/// Profile field an activity asks registrants to fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileField {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

/// Rule hiding a registration's status until a reveal time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusVisibility {
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default, deserialize_with = "deserialize_reveal_time")]
    pub visible_at: Option<DateTime<Utc>>,
}

fn default_visible() -> bool {
    true
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` / `YYYY-MM-DD HH:MM:SS` read as UTC.
fn deserialize_reveal_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid visible_at: {raw}")))
}

/// A user's registration for one activity.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRegistration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: i64,
    pub status: String,
    pub questionnaire_answer: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityRegistration {
    pub fn new(user_id: Uuid, activity_id: i64, questionnaire_answer: Document) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            activity_id,
            status: status::REGISTERED.to_string(),
            questionnaire_answer,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status as shown to the registrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_at: Option<DateTime<Utc>>,
}

/// A registration with its activity, for "my activities".
#[derive(Debug, Clone, Serialize)]
pub struct UserActivity {
    #[serde(flatten)]
    pub registration: ActivityRegistration,
    pub activity: Activity,
}
